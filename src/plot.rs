//! Scene artifact writer: a single self-contained HTML page embedding the
//! scene description and rendering it as an interactive 3-D scatter.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::scene::SceneDescription;

/// Write the interactive scene page. The scene JSON is inlined, so the file
/// needs nothing but the plotting library at view time.
pub fn write_scene(path: &Path, scene: &SceneDescription) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
    }

    // Guard against "</script>" sequences inside embedded strings.
    let scene_json = serde_json::to_string(scene)?.replace("</", "<\\/");
    let html = render_page(&scene_json, scene);

    std::fs::write(path, html).with_context(|| format!("writing scene {}", path.display()))?;
    info!(
        "Scene artifact written - points={}, clusters={}, path={}",
        scene.total_points,
        scene.clusters.len(),
        path.display()
    );
    Ok(())
}

fn render_page(scene_json: &str, scene: &SceneDescription) -> String {
    let subtitle = format!(
        "{} Clusters | {} Publications | Years: {}\u{2013}{} | Silhouette: {:.3}",
        scene.clusters.len(),
        scene.total_points,
        scene.year_min,
        scene.year_max,
        scene.silhouette
    );

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Research Atlas</title>
<script src="https://cdn.plot.ly/plotly-2.32.0.min.js"></script>
<style>
  body {{ margin: 0; background: rgb(10,10,20); }}
  #atlas {{ width: 100vw; height: 100vh; }}
</style>
</head>
<body>
<div id="atlas"></div>
<script>
const scene = {scene_json};

const axis = {{
  backgroundcolor: "rgba(0,0,0,0)",
  gridcolor: "rgba(255,255,255,0.15)",
  showbackground: true,
  zerolinecolor: "rgba(255,255,255,0.3)",
  tickfont: {{ size: 8 }}
}};

const traces = [];
let shownScale = false;
for (const cluster of scene.clusters) {{
  const pts = scene.points.filter(p => p.cluster === cluster.cluster_id);
  if (pts.length === 0) continue;
  const showScale = !shownScale;
  shownScale = true;
  traces.push({{
    type: "scatter3d",
    mode: "markers",
    name: cluster.label + " (" + cluster.member_count + ")",
    x: pts.map(p => p.x),
    y: pts.map(p => p.y),
    z: pts.map(p => p.z),
    text: pts.map(p => p.hover),
    hovertemplate: "<b>Cluster:</b> %{{fullData.name}}<br>%{{text}}<br>" +
                   "<b>Coord:</b> (%{{x:.2f}}, %{{y:.2f}}, %{{z:.2f}})<extra></extra>",
    marker: {{
      size: 5,
      opacity: 0.8,
      line: {{ width: 0.3, color: "rgba(50,50,50,0.7)" }},
      color: pts.map(p => p.year),
      colorscale: "Turbo",
      cmin: scene.year_min,
      cmax: scene.year_max,
      showscale: showScale,
      colorbar: showScale ? {{ title: "Year", len: 0.8, x: 1.05 }} : undefined
    }}
  }});
}}

for (const cluster of scene.clusters) {{
  traces.push({{
    type: "scatter3d",
    mode: "markers+text",
    name: "Center " + cluster.cluster_id,
    showlegend: false,
    x: [cluster.centroid[0]],
    y: [cluster.centroid[1]],
    z: [cluster.centroid[2]],
    text: ["C" + cluster.cluster_id],
    textposition: "middle center",
    textfont: {{ size: 10, color: "white" }},
    marker: {{ size: 12, color: "red", opacity: 0.95, symbol: "diamond",
               line: {{ width: 1, color: "white" }} }},
    hovertemplate: "<b>Cluster " + cluster.cluster_id + " Center</b><br>" +
                   "<b>Label:</b> " + cluster.label + "<br>" +
                   "<b>Documents:</b> " + cluster.member_count + "<extra></extra>"
  }});
}}

Plotly.newPlot("atlas", traces, {{
  title: {{
    text: "<b>3D Research Atlas</b><br><sub>{subtitle}</sub>",
    x: 0.5, xanchor: "center",
    font: {{ size: 16 }}
  }},
  scene: {{
    xaxis: Object.assign({{ title: "Dim 1" }}, axis),
    yaxis: Object.assign({{ title: "Dim 2" }}, axis),
    zaxis: Object.assign({{ title: "Dim 3" }}, axis),
    bgcolor: "rgba(10,10,20,1)",
    camera: {{ eye: {{ x: 1.2, y: 1.2, z: 1.2 }} }}
  }},
  paper_bgcolor: "rgba(10,10,20,1)",
  font: {{ size: 10, color: "white" }},
  legend: {{
    bgcolor: "rgba(20,20,30,0.9)",
    bordercolor: "rgba(255,255,255,0.1)",
    borderwidth: 1,
    font: {{ color: "white", size: 8 }},
    yanchor: "top", y: 0.99, xanchor: "left", x: 0.01
  }},
  margin: {{ l: 10, r: 10, t: 60, b: 10 }}
}}, {{ displaylogo: false, responsive: true }});
</script>
</body>
</html>
"#
    )
}
