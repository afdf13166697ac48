mod api_types;
mod cluster;
mod config;
mod embed;
mod fetch;
mod label;
mod models;
mod normalize;
mod orchestrator;
mod output;
mod plot;
mod rank;
mod reduce;
mod scene;
mod store;
mod textclean;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use crate::config::Config;
use crate::embed::HttpEmbeddingProvider;

/// Publication corpus updater and 3-D semantic atlas generator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (overrides PUBATLAS_CONFIG environment variable)
    #[arg(short, long)]
    config: Option<String>,

    /// Directory for the publications JSON and scene artifact
    /// (overrides the configured paths, keeping file names)
    #[arg(short, long)]
    output_dir: Option<String>,
}

fn resolve_config(args: &Args) -> Result<Config> {
    // 1) CLI flag, 2) env var, 3) config.yaml beside the binary, 4) defaults
    let path = if let Some(p) = &args.config {
        debug!("Using config file from --config argument: {}", p);
        Some(PathBuf::from(p))
    } else if let Ok(p) = std::env::var("PUBATLAS_CONFIG") {
        debug!("Using config file from PUBATLAS_CONFIG: {}", p);
        Some(PathBuf::from(p))
    } else {
        let default = PathBuf::from("config.yaml");
        if default.exists() {
            debug!("Using config file at default path: {}", default.display());
            Some(default)
        } else {
            None
        }
    };

    let mut cfg = match path {
        Some(p) => {
            if !p.exists() {
                return Err(anyhow::anyhow!(
                    "config not found at {}\n\
                     Use --config to specify a config file, or set PUBATLAS_CONFIG.\n\
                     Example config.yaml:\n\
                     author_names: [\"Lastname A\", \"Lastname AB\"]\n\
                     start_year: 1993\n\
                     embedding:\n  endpoint: \"http://localhost:8080/v1/embeddings\"\n",
                    p.display()
                ));
            }
            Config::load(&p)?
        }
        None => {
            info!("No config file found - running with built-in defaults");
            Config::default()
        }
    };

    if let Some(dir) = &args.output_dir {
        let dir = PathBuf::from(dir);
        let reroot = |p: &PathBuf| {
            p.file_name()
                .map(|name| dir.join(name))
                .unwrap_or_else(|| p.clone())
        };
        cfg.paths.publications_json = reroot(&cfg.paths.publications_json);
        cfg.paths.scene_html = reroot(&cfg.paths.scene_html);
    }

    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting pubatlas");

    let args = Args::parse();
    let cfg = resolve_config(&args)?;

    let provider = HttpEmbeddingProvider::new(&cfg.embedding);
    let summary = orchestrator::run_update(&cfg, &provider).await?;

    info!(
        "Run summary - records_seen={}, malformed={}, new={}, total={}, scene_points={}, scene_written={}",
        summary.records_seen,
        summary.records_malformed,
        summary.records_added,
        summary.total_records,
        summary.scene_points,
        summary.scene_written
    );
    Ok(())
}
