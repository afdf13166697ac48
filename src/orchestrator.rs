//! The run driver: one ingestion pass over every year, then the clustering
//! and visualization stage over the merged corpus snapshot.
//!
//! Recovery rules: an unreachable source skips that year only; malformed
//! records are counted and dropped; a working set below the corpus floor
//! skips the atlas stage; a missing authority table just leaves ranks
//! empty. The run always completes and writes whatever valid output it has.

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::cluster::{kmeans, silhouette_score};
use crate::config::Config;
use crate::embed::{normalize, EmbeddingProvider};
use crate::fetch::fetch_year_opt;
use crate::label::label_clusters;
use crate::models::{PublicationRecord, RunSummary};
use crate::normalize::normalize_record;
use crate::output::write_publications_json;
use crate::plot::write_scene;
use crate::rank::{apply_ranks, load_authority_table, rank_year_batch};
use crate::reduce::project_3d;
use crate::scene::build_scene;
use crate::store::CorpusStore;
use crate::textclean::{clean_text, combined_is_long_enough, embedding_input, is_substantial};

pub async fn run_update(cfg: &Config, provider: &dyn EmbeddingProvider) -> Result<RunSummary> {
    let pipeline_start = std::time::Instant::now();
    let current_year = Utc::now().year();
    info!(
        "Pipeline started - years={}..={}, corpus={}",
        cfg.start_year,
        current_year,
        cfg.paths.corpus.display()
    );

    let mut summary = RunSummary::default();
    let mut store = CorpusStore::load(&cfg.paths.corpus)?;
    let authority = load_authority_table(&cfg.paths.authority_table)?;

    // 1) per-year fetch/normalize/rank/merge
    let fetch_start = std::time::Instant::now();
    let client = Client::builder().build()?;
    for year in cfg.start_year..=current_year {
        let raw = match fetch_year_opt(&client, &cfg.source, &cfg.author_names, year).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Year {} - no records", year);
                continue;
            }
            Err(e) => {
                warn!("Year {} unavailable - {}", year, e);
                summary.years_unavailable += 1;
                continue;
            }
        };
        summary.years_fetched += 1;
        summary.records_seen += raw.len();

        let mut batch: Vec<PublicationRecord> = Vec::with_capacity(raw.len());
        let mut malformed = 0usize;
        for article in &raw {
            match normalize_record(article, &cfg.preprint_fragments) {
                Some(rec) => batch.push(rec),
                None => malformed += 1,
            }
        }
        summary.records_malformed += malformed;
        if malformed > 0 {
            debug!("Year {} - malformed records dropped: {}", year, malformed);
        }

        // the source's date filter is range-inclusive; keep only records
        // whose raw date actually mentions the requested year
        let year_tag = year.to_string();
        batch.retain(|r| r.date.contains(&year_tag));

        if let Some(table) = &authority {
            apply_ranks(&mut batch, table);
        }
        let batch = rank_year_batch(batch, &cfg.author_names);

        let stats = store.merge_year(batch);
        summary.records_added += stats.added;
        if stats.added > 0 {
            info!(
                "Year {} merged - new={}, already_stored={}",
                year, stats.added, stats.dropped_existing
            );
        }
    }
    summary.total_records = store.len();
    info!(
        "Ingestion completed - duration={:.2}s, years_fetched={}, years_unavailable={}, new={}, total={}",
        fetch_start.elapsed().as_secs_f32(),
        summary.years_fetched,
        summary.years_unavailable,
        summary.records_added,
        summary.total_records
    );

    // 2) persist the corpus and the grouped publications document
    store.save(&cfg.paths.corpus)?;
    write_publications_json(&cfg.paths.publications_json, store.records())?;

    // 3) atlas stage over the immutable snapshot
    match run_atlas_stage(cfg, provider, store.records()).await? {
        Some(points) => {
            summary.scene_points = points;
            summary.scene_written = true;
        }
        None => {
            summary.scene_written = false;
        }
    }

    info!(
        "Pipeline completed - total_duration={:.2}s, records={}, scene_points={}, scene_written={}",
        pipeline_start.elapsed().as_secs_f32(),
        summary.total_records,
        summary.scene_points,
        summary.scene_written
    );
    Ok(summary)
}

/// The clustering/visualization stage. Returns the number of scene points,
/// or `None` when the stage was skipped (not an error).
async fn run_atlas_stage(
    cfg: &Config,
    provider: &dyn EmbeddingProvider,
    records: &[PublicationRecord],
) -> Result<Option<usize>> {
    let stage_start = std::time::Instant::now();

    // Working set: records with a displayable year and enough cleaned text
    // to embed. One filtered index space feeds every later stage, so the
    // coordinate/assignment/hover sequences line up by construction.
    let mut indices: Vec<usize> = Vec::new();
    let mut texts: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        if rec.year.is_none() {
            continue;
        }
        let title_clean = clean_text(&rec.title);
        let abstract_clean = clean_text(&rec.abstract_text);
        if !is_substantial(
            &title_clean,
            &abstract_clean,
            cfg.cleaning.min_title_len,
            cfg.cleaning.min_abstract_len,
        ) {
            continue;
        }
        let combined = embedding_input(&title_clean, &abstract_clean);
        if !combined_is_long_enough(&combined, cfg.cleaning.min_combined_len) {
            continue;
        }
        indices.push(i);
        texts.push(combined);
    }

    if texts.len() < cfg.cleaning.min_corpus_docs {
        info!(
            "Atlas stage skipped - working_set={} below floor {}",
            texts.len(),
            cfg.cleaning.min_corpus_docs
        );
        return Ok(None);
    }
    info!("Atlas stage - working_set={} of {} records", texts.len(), records.len());

    let embeddings = match provider.embed_batch(&texts).await {
        Ok(vectors) => vectors,
        Err(e) => {
            warn!("Embedding provider failed - skipping atlas stage: {}", e);
            return Ok(None);
        }
    };
    let embeddings: Vec<Vec<f32>> = embeddings.into_iter().map(normalize).collect();

    let coords = project_3d(&embeddings, &cfg.projection);

    let clustering = kmeans(
        &embeddings,
        cfg.clustering.n_clusters,
        cfg.clustering.seed,
        cfg.clustering.max_iterations,
    );
    let silhouette = silhouette_score(&embeddings, &clustering.assignments, clustering.k);
    info!("Silhouette score: {:.3}", silhouette);

    let profiles = label_clusters(&texts, &clustering.assignments, clustering.k, &cfg.labeling);
    for p in &profiles {
        let pct = p.member_count as f32 / texts.len() as f32 * 100.0;
        info!(
            "Cluster {}: {} | documents={} ({:.1}%) | keywords={}",
            p.cluster_id,
            p.label,
            p.member_count,
            pct,
            p.keywords.join(", ")
        );
    }

    let working_records: Vec<&PublicationRecord> = indices.iter().map(|&i| &records[i]).collect();
    let scene = build_scene(
        &working_records,
        &coords,
        &clustering,
        &profiles,
        silhouette,
        provider.model_name(),
    )
    .context("assembling scene")?;
    write_scene(&cfg.paths.scene_html, &scene)?;

    info!(
        "Atlas stage completed - duration={:.2}s, points={}, clusters={}",
        stage_start.elapsed().as_secs_f32(),
        scene.total_points,
        scene.clusters.len()
    );
    Ok(Some(scene.total_points))
}
