//! Record Normalizer: one raw source record in, one canonical
//! `PublicationRecord` out, or `None` when the record fails validation.
//! Malformed records are the caller's counter, never an error.

use crate::api_types::RawArticle;
use crate::models::{extract_year, PublicationRecord};

/// Normalize one raw record. Validation order:
/// 1. preprint venues rejected by journal-name fragment,
/// 2. date string extracted (canonical, else coarse "Year-Month"),
/// 3. DOI / external id scanned from the identifier list (absence tolerated),
/// 4. title, journal, and a non-empty author list required.
pub fn normalize_record(raw: &RawArticle, preprint_fragments: &[String]) -> Option<PublicationRecord> {
    let journal_block = raw.journal.as_ref()?;
    let journal = journal_block.title.as_deref()?.trim().to_string();
    if journal.is_empty() {
        return None;
    }

    let journal_lc = journal.to_lowercase();
    if preprint_fragments
        .iter()
        .any(|frag| journal_lc.contains(&frag.to_lowercase()))
    {
        return None;
    }

    let pub_date = journal_block.pub_date.as_ref()?;
    let date = match &pub_date.medline_date {
        Some(md) if !md.trim().is_empty() => md.trim().to_string(),
        _ => format!(
            "{}-{}",
            pub_date.year.as_deref().unwrap_or(""),
            pub_date.month.as_deref().unwrap_or("")
        ),
    };

    let mut doi = None;
    let mut pmid = None;
    for id in &raw.article_ids {
        match id.id_type.as_str() {
            "doi" => doi = Some(id.value.clone()),
            "pubmed" => pmid = Some(id.value.clone()),
            _ => {}
        }
    }

    let mut title = raw.title.as_deref()?.trim().to_string();
    if title.is_empty() {
        return None;
    }
    if title.ends_with('.') {
        title.pop();
    }

    let authors: Vec<String> = raw
        .authors
        .as_ref()?
        .iter()
        .filter_map(|a| {
            let last = a.last_name.as_deref()?.trim();
            if last.is_empty() {
                return None;
            }
            Some(match a.initials.as_deref().map(str::trim) {
                Some(init) if !init.is_empty() => format!("{} {}", last, init),
                _ => last.to_string(),
            })
        })
        .collect();
    if authors.is_empty() {
        return None;
    }

    let abstract_text = raw
        .abstract_sections
        .first()
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    Some(PublicationRecord {
        year: extract_year(&date),
        journal_lower: journal.to_lowercase(),
        title,
        authors,
        journal,
        date,
        abstract_text,
        doi,
        pmid,
        rank: None,
    })
}
