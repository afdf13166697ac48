//! Bibliographic source client.
//!
//! The source is queried per year: one id search under the author
//! disjunction and a year-bound date filter, then one record fetch for the
//! returned ids. The source caps results per query, which is why the
//! ingestion driver chunks by year instead of issuing one unbounded query.

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

use crate::api_types::{FetchEnvelope, RawArticle, SearchEnvelope};
use crate::config::SourceConfig;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source request failed: {0}")]
    Request(String),
    #[error("source response malformed: {0}")]
    Decode(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// The per-year search term: author disjunction plus a publication-date
/// range covering exactly that year.
fn year_query(author_names: &[String], year: i32) -> String {
    let authors = author_names
        .iter()
        .map(|a| format!("\"{a}\""))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!("({authors}) AND \"{year}/01/01\"[PDAT] : \"{year}/12/31\"[PDAT]")
}

/// Fetch one year's raw records. `Ok(None)` means the source answered but
/// holds nothing for that year; transport and decode failures surface as
/// `SourceError` for the caller to recover from.
pub async fn fetch_year_opt(
    client: &Client,
    cfg: &SourceConfig,
    author_names: &[String],
    year: i32,
) -> SourceResult<Option<Vec<RawArticle>>> {
    let start = std::time::Instant::now();
    let term = year_query(author_names, year);
    debug!("Fetching year {} - term={}", year, term);

    let search_url = format!("{}/esearch.fcgi", cfg.base_url);
    let retmax = cfg.retmax.to_string();
    let search: SearchEnvelope = client
        .get(&search_url)
        .query(&[
            ("db", "pubmed"),
            ("term", term.as_str()),
            ("retmax", retmax.as_str()),
            ("retmode", "json"),
        ])
        .send()
        .await
        .map_err(|e| SourceError::Request(e.to_string()))?
        .error_for_status()
        .map_err(|e| SourceError::Request(e.to_string()))?
        .json()
        .await
        .map_err(|e| SourceError::Decode(e.to_string()))?;

    let ids = search.esearchresult.idlist;
    if ids.is_empty() {
        debug!("No records found for year {}", year);
        return Ok(None);
    }

    let fetch_url = format!("{}/efetch.fcgi", cfg.base_url);
    let envelope: FetchEnvelope = client
        .get(&fetch_url)
        .query(&[
            ("db", "pubmed"),
            ("id", ids.join(",").as_str()),
            ("retmode", "json"),
        ])
        .send()
        .await
        .map_err(|e| SourceError::Request(e.to_string()))?
        .error_for_status()
        .map_err(|e| SourceError::Request(e.to_string()))?
        .json()
        .await
        .map_err(|e| SourceError::Decode(e.to_string()))?;

    info!(
        "Year fetch completed - year={}, ids={}, records={}, duration={:.2}s",
        year,
        ids.len(),
        envelope.articles.len(),
        start.elapsed().as_secs_f32()
    );
    Ok(Some(envelope.articles))
}
