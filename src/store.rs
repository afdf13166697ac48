//! Corpus store: the deduplicated on-disk collection of publication records.
//!
//! Persisted as JSON Lines, one record per row. Read once at the start of a
//! run, merged per ingestion year, written once at the end. Records without
//! a DOI are never deduplicated against each other; that duplication is an
//! accepted limitation.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::models::PublicationRecord;

#[derive(Debug, Default)]
pub struct CorpusStore {
    records: Vec<PublicationRecord>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub dropped_existing: usize,
}

impl CorpusStore {
    pub fn new(records: Vec<PublicationRecord>) -> Self {
        Self { records }
    }

    /// Load the store from disk. A missing file is an empty store, not an
    /// error (first run).
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No existing corpus at {}, starting empty", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading corpus {}", path.display()))?;
        let mut records = Vec::new();
        for (lineno, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let rec: PublicationRecord = serde_json::from_str(line)
                .with_context(|| format!("corpus row {} in {}", lineno + 1, path.display()))?;
            records.push(rec);
        }
        info!("Corpus loaded - records={}, path={}", records.len(), path.display());
        Ok(Self { records })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
            }
        }
        let mut out = String::new();
        for rec in &self.records {
            out.push_str(&serde_json::to_string(rec)?);
            out.push('\n');
        }
        std::fs::write(path, out).with_context(|| format!("writing corpus {}", path.display()))?;
        debug!("Corpus saved - records={}, path={}", self.records.len(), path.display());
        Ok(())
    }

    pub fn records(&self) -> &[PublicationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Merge one year's ranked batch into the store.
    ///
    /// Incoming records whose DOI is already stored are dropped; the rest are
    /// appended in their ranked order. The final sequence is then
    /// deduplicated by DOI keeping the first occurrence, so previously stored
    /// records always win over refetched ones. Idempotent: merging the same
    /// batch twice adds nothing the second time.
    pub fn merge_year(&mut self, incoming: Vec<PublicationRecord>) -> MergeStats {
        let existing_dois: HashSet<String> = self
            .records
            .iter()
            .filter_map(|r| r.doi_key().map(str::to_string))
            .collect();

        let mut stats = MergeStats::default();
        for rec in incoming {
            match rec.doi_key() {
                Some(doi) if existing_dois.contains(doi) => stats.dropped_existing += 1,
                _ => {
                    stats.added += 1;
                    self.records.push(rec);
                }
            }
        }

        // Within-batch duplicates can still slip through the existing-DOI
        // check; a final first-wins pass keeps the invariant.
        let mut seen: HashSet<String> = HashSet::new();
        self.records.retain(|r| match r.doi_key() {
            Some(doi) => seen.insert(doi.to_string()),
            None => true,
        });

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(title: &str, doi: Option<&str>) -> PublicationRecord {
        PublicationRecord {
            title: title.into(),
            authors: vec!["Smith J".into()],
            journal: "J".into(),
            journal_lower: "j".into(),
            date: "2020-Jan".into(),
            year: Some(2020),
            abstract_text: String::new(),
            doi: doi.map(str::to_string),
            pmid: None,
            rank: None,
        }
    }

    #[test]
    fn merge_is_idempotent() {
        let batch = vec![rec("a", Some("10.1/abc")), rec("b", Some("10.1/def"))];
        let mut store = CorpusStore::default();

        let first = store.merge_year(batch.clone());
        assert_eq!(first.added, 2);
        assert_eq!(store.len(), 2);

        let second = store.merge_year(batch);
        assert_eq!(second.added, 0);
        assert_eq!(second.dropped_existing, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn stored_record_wins_over_refetched_doi() {
        let mut store = CorpusStore::new(vec![rec("original title", Some("10.1/abc"))]);
        store.merge_year(vec![rec("refetched title", Some("10.1/abc"))]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].title, "original title");
    }

    #[test]
    fn within_batch_duplicate_keeps_first() {
        let mut store = CorpusStore::default();
        store.merge_year(vec![rec("first", Some("10.1/x")), rec("second", Some("10.1/x"))]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].title, "first");
    }

    #[test]
    fn records_without_doi_are_never_deduplicated() {
        let mut store = CorpusStore::default();
        store.merge_year(vec![rec("same", None), rec("same", None)]);
        store.merge_year(vec![rec("same", None)]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn doi_is_unique_after_any_merge_sequence() {
        let mut store = CorpusStore::default();
        store.merge_year(vec![rec("a", Some("10.1/a")), rec("b", None)]);
        store.merge_year(vec![rec("a2", Some("10.1/a")), rec("c", Some("10.1/c"))]);
        store.merge_year(vec![rec("c2", Some("10.1/c")), rec("d", None)]);

        let mut dois: Vec<&str> = store.records().iter().filter_map(|r| r.doi_key()).collect();
        let total = dois.len();
        dois.sort();
        dois.dedup();
        assert_eq!(dois.len(), total);
    }

    #[test]
    fn roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");

        let mut store = CorpusStore::default();
        store.merge_year(vec![rec("a", Some("10.1/abc")), rec("b", None)]);
        store.save(&path).unwrap();

        let loaded = CorpusStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.records()[0].title, "a");
        assert_eq!(loaded.records()[1].title, "b");
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::load(&dir.path().join("nope.jsonl")).unwrap();
        assert!(store.is_empty());
    }
}
