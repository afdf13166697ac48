//! Scene assembler: joins coordinates, cluster ids, years, and hover text
//! into the renderable scene description.
//!
//! Every per-record attribute travels inside one composite `ScenePoint`, so
//! the four logical sequences cannot drift apart after assembly. The inputs
//! are still length-checked up front; a mismatch is a hard error, not a
//! truncation.

use anyhow::{ensure, Result};
use serde::Serialize;

use crate::cluster::KMeansResult;
use crate::label::ClusterProfile;
use crate::models::PublicationRecord;

const TITLE_SNIPPET: usize = 80;
const ABSTRACT_SNIPPET: usize = 120;
const DOI_SNIPPET: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct ScenePoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub cluster: usize,
    pub year: i32,
    pub hover: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub cluster_id: usize,
    pub label: String,
    pub keywords: Vec<String>,
    pub member_count: usize,
    /// Mean 3-D coordinate of the member points, for overlay markers.
    pub centroid: [f32; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneDescription {
    pub points: Vec<ScenePoint>,
    pub clusters: Vec<ClusterSummary>,
    pub year_min: i32,
    pub year_max: i32,
    pub silhouette: f32,
    pub total_points: usize,
    pub model: String,
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

fn hover_for(record: &PublicationRecord, year: i32) -> String {
    let title = truncate_chars(&record.title, TITLE_SNIPPET);
    let abstract_snippet = truncate_chars(&record.abstract_text, ABSTRACT_SNIPPET);
    let mut hover = format!(
        "<b>Title:</b> {title}<br><b>Abstract:</b> {abstract_snippet}<br><b>Year:</b> {year}"
    );
    if let Some(doi) = record.doi_key() {
        hover.push_str(&format!(
            "<br><b>DOI:</b> <a href='https://doi.org/{doi}'>{}</a>",
            truncate_chars(doi, DOI_SNIPPET)
        ));
    }
    hover
}

/// Assemble the scene from the clustering stage outputs. All inputs index
/// the same working set; unequal lengths are rejected before any point is
/// built.
pub fn build_scene(
    records: &[&PublicationRecord],
    coords: &[[f32; 3]],
    clustering: &KMeansResult,
    profiles: &[ClusterProfile],
    silhouette: f32,
    model: &str,
) -> Result<SceneDescription> {
    ensure!(
        records.len() == coords.len() && coords.len() == clustering.assignments.len(),
        "scene inputs misaligned: records={}, coords={}, assignments={}",
        records.len(),
        coords.len(),
        clustering.assignments.len()
    );

    let mut points = Vec::with_capacity(records.len());
    for ((record, &coord), &cluster) in records
        .iter()
        .zip(coords)
        .zip(&clustering.assignments)
    {
        let year = match record.year {
            Some(y) => y,
            None => anyhow::bail!("record without year reached scene assembly: {}", record.title),
        };
        points.push(ScenePoint {
            x: coord[0],
            y: coord[1],
            z: coord[2],
            cluster,
            year,
            hover: hover_for(record, year),
        });
    }

    let clusters = profiles
        .iter()
        .map(|p| {
            let members: Vec<&ScenePoint> =
                points.iter().filter(|pt| pt.cluster == p.cluster_id).collect();
            let mut centroid = [0.0f32; 3];
            for pt in &members {
                centroid[0] += pt.x;
                centroid[1] += pt.y;
                centroid[2] += pt.z;
            }
            if !members.is_empty() {
                for c in &mut centroid {
                    *c /= members.len() as f32;
                }
            }
            ClusterSummary {
                cluster_id: p.cluster_id,
                label: p.label.clone(),
                keywords: p.keywords.clone(),
                member_count: p.member_count,
                centroid,
            }
        })
        .collect();

    let year_min = points.iter().map(|p| p.year).min().unwrap_or(0);
    let year_max = points.iter().map(|p| p.year).max().unwrap_or(0);

    Ok(SceneDescription {
        total_points: points.len(),
        points,
        clusters,
        year_min,
        year_max,
        silhouette,
        model: model.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LabelingConfig;
    use crate::label::label_clusters;

    fn record(title: &str, abstract_text: &str, year: i32, doi: Option<&str>) -> PublicationRecord {
        PublicationRecord {
            title: title.into(),
            authors: vec!["Smith J".into()],
            journal: "J".into(),
            journal_lower: "j".into(),
            date: format!("{year}-Jan"),
            year: Some(year),
            abstract_text: abstract_text.into(),
            doi: doi.map(str::to_string),
            pmid: None,
            rank: None,
        }
    }

    fn clustering(assignments: Vec<usize>, k: usize) -> KMeansResult {
        KMeansResult {
            assignments,
            centroids: vec![vec![0.0]; k],
            k,
        }
    }

    fn profiles(texts: &[String], assignments: &[usize], k: usize) -> Vec<ClusterProfile> {
        label_clusters(texts, assignments, k, &LabelingConfig::default())
    }

    #[test]
    fn misaligned_inputs_are_rejected() {
        let r1 = record("a", "", 2020, None);
        let r2 = record("b", "", 2021, None);
        let records = vec![&r1, &r2];
        let coords = vec![[0.0, 0.0, 0.0]];
        let result = build_scene(&records, &coords, &clustering(vec![0, 0], 1), &[], 0.0, "m");
        assert!(result.is_err());
    }

    #[test]
    fn assembled_scene_is_internally_aligned() {
        let r1 = record("a", "x", 2018, None);
        let r2 = record("b", "y", 2022, None);
        let records = vec![&r1, &r2];
        let coords = vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let scene =
            build_scene(&records, &coords, &clustering(vec![0, 0], 1), &[], 0.3, "m").unwrap();
        assert_eq!(scene.points.len(), 2);
        assert_eq!(scene.total_points, 2);
        assert_eq!(scene.year_min, 2018);
        assert_eq!(scene.year_max, 2022);
        assert!((scene.silhouette - 0.3).abs() < 1e-6);
    }

    #[test]
    fn hover_truncates_on_char_boundaries() {
        let long_title = "α".repeat(200);
        let r = record(&long_title, &"β".repeat(300), 2020, None);
        let records = vec![&r];
        let coords = vec![[0.0, 0.0, 0.0]];
        let scene =
            build_scene(&records, &coords, &clustering(vec![0], 1), &[], 0.0, "m").unwrap();
        let hover = &scene.points[0].hover;
        assert!(hover.contains(&format!("{}...", "α".repeat(80))));
        assert!(hover.contains(&format!("{}...", "β".repeat(120))));
        assert!(hover.contains("<b>Year:</b> 2020"));
    }

    #[test]
    fn doi_link_only_when_present_and_non_empty() {
        let with = record("a", "", 2020, Some("10.1/abc"));
        let without = record("b", "", 2020, None);
        let blank = record("c", "", 2020, Some("  "));
        let records = vec![&with, &without, &blank];
        let coords = vec![[0.0; 3]; 3];
        let scene =
            build_scene(&records, &coords, &clustering(vec![0, 0, 0], 1), &[], 0.0, "m").unwrap();
        assert!(scene.points[0].hover.contains("https://doi.org/10.1/abc"));
        assert!(!scene.points[1].hover.contains("doi.org"));
        assert!(!scene.points[2].hover.contains("doi.org"));
    }

    #[test]
    fn centroids_average_member_coordinates() {
        let r1 = record("selenium metabolism aging one", "", 2019, None);
        let r2 = record("selenium metabolism aging two", "", 2020, None);
        let records = vec![&r1, &r2];
        let coords = vec![[0.0, 0.0, 0.0], [2.0, 4.0, 6.0]];
        let texts: Vec<String> = records.iter().map(|r| r.title.clone()).collect();
        let assignments = vec![0usize, 0];
        let profs = profiles(&texts, &assignments, 1);
        let scene = build_scene(
            &records,
            &coords,
            &clustering(assignments.clone(), 1),
            &profs,
            0.0,
            "m",
        )
        .unwrap();
        assert_eq!(scene.clusters.len(), 1);
        assert_eq!(scene.clusters[0].centroid, [1.0, 2.0, 3.0]);
        assert_eq!(scene.clusters[0].member_count, 2);
    }
}
