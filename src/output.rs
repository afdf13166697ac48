//! Publications JSON artifact: the corpus grouped by year, newest first,
//! with run metadata. A fully empty corpus still produces an explicit
//! empty-state document rather than no file.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::models::PublicationRecord;

#[derive(Debug, Serialize)]
struct PublicationOut<'a> {
    title: &'a str,
    authors: &'a [String],
    journal: &'a str,
    date: &'a str,
    year: i32,
    #[serde(rename = "abstract")]
    abstract_text: &'a str,
    doi: Option<&'a str>,
    pmid: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PublicationsDoc<'a> {
    generated_at: String,
    total_publications: usize,
    years: Vec<i32>,
    publications_by_year: BTreeMap<String, Vec<PublicationOut<'a>>>,
}

fn build_doc(records: &[PublicationRecord]) -> PublicationsDoc<'_> {
    let mut by_year: BTreeMap<i32, Vec<PublicationOut<'_>>> = BTreeMap::new();
    for rec in records {
        let Some(year) = rec.year else { continue };
        by_year.entry(year).or_default().push(PublicationOut {
            title: &rec.title,
            authors: &rec.authors,
            journal: &rec.journal,
            date: &rec.date,
            year,
            abstract_text: &rec.abstract_text,
            doi: rec.doi.as_deref(),
            pmid: rec.pmid.as_deref(),
        });
    }

    let mut years: Vec<i32> = by_year.keys().copied().collect();
    years.sort_unstable_by(|a, b| b.cmp(a));

    let total: usize = by_year.values().map(Vec::len).sum();

    // string keys, iterated in the descending year order computed above
    let mut publications_by_year = BTreeMap::new();
    for (year, pubs) in by_year {
        publications_by_year.insert(year.to_string(), pubs);
    }

    PublicationsDoc {
        generated_at: Utc::now().to_rfc3339(),
        total_publications: total,
        years,
        publications_by_year,
    }
}

/// Write the grouped publications document. Records without an extractable
/// year are omitted from the groups; an empty corpus writes the empty-state
/// document.
pub fn write_publications_json(path: &Path, records: &[PublicationRecord]) -> Result<()> {
    let doc = build_doc(records);
    if doc.total_publications == 0 {
        info!("Corpus empty - writing empty-state publications document");
    }

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
    }
    std::fs::write(path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing publications JSON {}", path.display()))?;
    info!(
        "Publications JSON written - total={}, years={}, path={}",
        doc.total_publications,
        doc.years.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(title: &str, year: Option<i32>) -> PublicationRecord {
        PublicationRecord {
            title: title.into(),
            authors: vec!["Smith J".into()],
            journal: "J".into(),
            journal_lower: "j".into(),
            date: year.map(|y| format!("{y}-Jan")).unwrap_or_else(|| "n.d.".into()),
            year,
            abstract_text: String::new(),
            doi: Some("10.1/x".into()),
            pmid: None,
            rank: Some(3.0),
        }
    }

    #[test]
    fn groups_by_year_with_descending_year_list() {
        let records = vec![rec("a", Some(2019)), rec("b", Some(2022)), rec("c", Some(2019))];
        let doc = build_doc(&records);
        assert_eq!(doc.total_publications, 3);
        assert_eq!(doc.years, vec![2022, 2019]);
        assert_eq!(doc.publications_by_year["2019"].len(), 2);
        assert_eq!(doc.publications_by_year["2022"].len(), 1);
    }

    #[test]
    fn yearless_records_are_omitted_from_groups() {
        let records = vec![rec("a", Some(2020)), rec("b", None)];
        let doc = build_doc(&records);
        assert_eq!(doc.total_publications, 1);
        assert_eq!(doc.years, vec![2020]);
    }

    #[test]
    fn empty_corpus_writes_empty_state_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("publications.json");
        write_publications_json(&path, &[]).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["total_publications"], 0);
        assert!(parsed["years"].as_array().unwrap().is_empty());
        assert!(parsed["publications_by_year"].as_object().unwrap().is_empty());
        assert!(parsed["generated_at"].is_string());
    }

    #[test]
    fn output_rows_carry_wire_attribute_names_only() {
        let records = [rec("a", Some(2020))];
        let doc = build_doc(&records);
        let js = serde_json::to_value(&doc).unwrap();
        let row = &js["publications_by_year"]["2020"][0];
        assert_eq!(row["abstract"], "");
        assert_eq!(row["doi"], "10.1/x");
        assert!(row.get("journal_lower").is_none());
        assert!(row.get("rank").is_none());
    }
}
