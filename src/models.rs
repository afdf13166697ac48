use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One canonical bibliographic record as held in the corpus store.
///
/// `authors` is ordered; the last entry is the byline position used by the
/// ranking policy. `doi` is the identity key for deduplication when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub title: String,
    pub authors: Vec<String>, // "LastName Initials", byline last
    pub journal: String,
    pub journal_lower: String,
    pub date: String, // raw date string, may be a range or year-month
    pub year: Option<i32>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    /// External authority rank for the journal, lower is better. Joined in
    /// from the optional authority table; not part of record identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<f64>,
}

impl PublicationRecord {
    /// Byline position: the last author entry, if any.
    pub fn byline(&self) -> Option<&str> {
        self.authors.last().map(|s| s.as_str())
    }

    /// Non-empty DOI, if present.
    pub fn doi_key(&self) -> Option<&str> {
        match self.doi.as_deref() {
            Some(d) if !d.trim().is_empty() => Some(d),
            _ => None,
        }
    }
}

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})").unwrap());

/// Extract a four-digit year from a raw date string ("2013 Mar-Apr",
/// "1999-Dec", "2020/01/05"). Returns `None` when no such pattern exists.
pub fn extract_year(date: &str) -> Option<i32> {
    YEAR_RE
        .captures(date)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok())
}

/// Counters accumulated over one ingestion run, reported in the final log.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub years_fetched: usize,
    pub years_unavailable: usize,
    pub records_seen: usize,
    pub records_malformed: usize,
    pub records_added: usize,
    pub total_records: usize,
    pub scene_points: usize,
    pub scene_written: bool,
}
