use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Pipeline configuration.
///
/// Every field has a default matching the constants the pipeline was tuned
/// with, so an empty YAML file (or no file at all) yields a runnable config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Accepted byline spellings for the tracked author. Matching is an
    /// exact comparison against the trimmed last author entry; spellings
    /// outside this list are treated as non-matching.
    pub author_names: Vec<String>,
    /// Journal-name fragments identifying preprint venues, matched
    /// case-insensitively as substrings.
    pub preprint_fragments: Vec<String>,
    /// First ingestion year; the driver walks from here to the current year.
    pub start_year: i32,

    pub source: SourceConfig,
    pub embedding: EmbeddingConfig,
    pub clustering: ClusteringConfig,
    pub projection: ProjectionConfig,
    pub labeling: LabelingConfig,
    pub cleaning: CleaningConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the bibliographic source API.
    pub base_url: String,
    /// Per-query result cap imposed by the source; the driver chunks by year
    /// to stay under it.
    pub retmax: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Endpoint accepting `{"model": ..., "input": [...]}` batches.
    pub endpoint: String,
    pub model: String,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub n_clusters: usize,
    pub seed: u64,
    pub max_iterations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub n_neighbors: usize,
    pub min_dist: f32,
    pub epochs: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelingConfig {
    pub max_vocab: usize,
    pub top_words_for_label: usize,
    pub top_words_for_report: usize,
    pub min_doc_freq: usize,
    pub max_doc_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub min_title_len: usize,
    pub min_abstract_len: usize,
    pub min_combined_len: usize,
    /// Fewer surviving documents than this skips the clustering stage.
    pub min_corpus_docs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Corpus store, one JSON row per record.
    pub corpus: PathBuf,
    /// Optional authority-score table (`;`-separated, Rank/Title columns).
    pub authority_table: PathBuf,
    /// Grouped-by-year publications JSON.
    pub publications_json: PathBuf,
    /// Self-contained 3-D scene artifact.
    pub scene_html: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            author_names: vec![
                "Gladyshev V".to_string(),
                "Gladyshev Vadim".to_string(),
                "Gladyshev VN".to_string(),
            ],
            preprint_fragments: vec!["biorxiv".to_string(), "medrxiv".to_string()],
            start_year: 1993,
            source: SourceConfig::default(),
            embedding: EmbeddingConfig::default(),
            clustering: ClusteringConfig::default(),
            projection: ProjectionConfig::default(),
            labeling: LabelingConfig::default(),
            cleaning: CleaningConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            retmax: 100,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/v1/embeddings".to_string(),
            model: "intfloat/multilingual-e5-large".to_string(),
            batch_size: 32,
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            n_clusters: 6,
            seed: 42,
            max_iterations: 100,
        }
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 15,
            min_dist: 0.05,
            epochs: 200,
            seed: 42,
        }
    }
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            max_vocab: 10_000,
            top_words_for_label: 3,
            top_words_for_report: 10,
            min_doc_freq: 2,
            max_doc_ratio: 0.8,
        }
    }
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            min_title_len: 5,
            min_abstract_len: 20,
            min_combined_len: 15,
            min_corpus_docs: 10,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            corpus: PathBuf::from("all_publications.jsonl"),
            authority_table: PathBuf::from("journal_impact_factors.csv"),
            publications_json: PathBuf::from("out/publications.json"),
            scene_html: PathBuf::from("out/atlas.html"),
        }
    }
}

impl Config {
    /// Load from a YAML file. Unknown keys are ignored; missing keys take
    /// their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }
}
