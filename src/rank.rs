//! Ranking policy: within one year's batch, byline-matching records come
//! first, each group ordered by authority rank when available, else by the
//! raw date string. Display ordering only; deduplication never looks at it.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::models::PublicationRecord;

/// Load the optional authority-score table: a `;`-separated file whose
/// header names `Rank` and `Title` columns. Keys are lowercased journal
/// names. An absent file is not an error; ranks simply stay empty.
pub fn load_authority_table(path: &Path) -> Result<Option<HashMap<String, f64>>> {
    if !path.exists() {
        info!(
            "Authority table not found at {} - proceeding without ranks",
            path.display()
        );
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading authority table {}", path.display()))?;
    let mut lines = raw.lines();
    let header = match lines.next() {
        Some(h) => h,
        None => return Ok(Some(HashMap::new())),
    };

    let columns: Vec<&str> = header.split(';').map(str::trim).collect();
    let rank_col = columns.iter().position(|c| *c == "Rank");
    let title_col = columns.iter().position(|c| *c == "Title");
    let (rank_col, title_col) = match (rank_col, title_col) {
        (Some(r), Some(t)) => (r, t),
        _ => {
            warn!(
                "Authority table {} missing Rank/Title columns - ignoring it",
                path.display()
            );
            return Ok(None);
        }
    };

    let mut table = HashMap::new();
    let mut skipped = 0usize;
    for line in lines {
        let fields: Vec<&str> = line.split(';').map(str::trim).collect();
        let (Some(rank_raw), Some(title)) = (fields.get(rank_col), fields.get(title_col)) else {
            skipped += 1;
            continue;
        };
        match rank_raw.parse::<f64>() {
            Ok(rank) => {
                table.insert(title.to_lowercase(), rank);
            }
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("Authority table - skipped {} malformed rows", skipped);
    }
    info!(
        "Authority table loaded - journals={}, path={}",
        table.len(),
        path.display()
    );
    Ok(Some(table))
}

/// Join authority ranks onto a batch by lowercased journal name. Journals
/// absent from the table keep an empty rank.
pub fn apply_ranks(records: &mut [PublicationRecord], table: &HashMap<String, f64>) {
    for rec in records {
        rec.rank = table.get(&rec.journal_lower).copied();
    }
}

fn is_byline_match(rec: &PublicationRecord, author_names: &[String]) -> bool {
    rec.byline()
        .map(|b| author_names.iter().any(|a| a == b.trim()))
        .unwrap_or(false)
}

fn by_rank_then_nothing(a: &PublicationRecord, b: &PublicationRecord) -> Ordering {
    // Ascending by rank; records without a rank sort after ranked ones.
    match (a.rank, b.rank) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Order one year's batch: byline matches first, then mismatches, each group
/// ascending by authority rank when any record in the batch carries one,
/// else ascending by the raw date string.
pub fn rank_year_batch(
    records: Vec<PublicationRecord>,
    author_names: &[String],
) -> Vec<PublicationRecord> {
    let have_ranks = records.iter().any(|r| r.rank.is_some());

    let (mut matches, mut mismatches): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|r| is_byline_match(r, author_names));

    let sorter = |group: &mut Vec<PublicationRecord>| {
        if have_ranks {
            group.sort_by(by_rank_then_nothing);
        } else {
            group.sort_by(|a, b| a.date.cmp(&b.date));
        }
    };
    sorter(&mut matches);
    sorter(&mut mismatches);

    matches.extend(mismatches);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(byline: &str, journal: &str, date: &str, rank: Option<f64>) -> PublicationRecord {
        PublicationRecord {
            title: format!("{journal} {date}"),
            authors: vec!["First A".into(), byline.into()],
            journal: journal.into(),
            journal_lower: journal.to_lowercase(),
            date: date.into(),
            year: Some(2020),
            abstract_text: String::new(),
            doi: None,
            pmid: None,
            rank,
        }
    }

    fn names() -> Vec<String> {
        vec!["Gladyshev V".into(), "Gladyshev VN".into()]
    }

    #[test]
    fn byline_matches_precede_mismatches() {
        let batch = vec![
            rec("Other X", "A", "2020-Jan", None),
            rec("Gladyshev VN", "B", "2020-Mar", None),
            rec("Other Y", "C", "2020-Feb", None),
            rec("Gladyshev V", "D", "2020-Apr", None),
        ];
        let ranked = rank_year_batch(batch, &names());
        let match_flags: Vec<bool> = ranked
            .iter()
            .map(|r| names().iter().any(|n| n == r.byline().unwrap()))
            .collect();
        assert_eq!(match_flags, vec![true, true, false, false]);
    }

    #[test]
    fn rank_orders_within_groups_with_unranked_last() {
        let batch = vec![
            rec("Gladyshev V", "low", "2020-Jan", Some(300.0)),
            rec("Gladyshev V", "none", "2020-Jan", None),
            rec("Gladyshev V", "top", "2020-Jan", Some(2.0)),
        ];
        let ranked = rank_year_batch(batch, &names());
        let journals: Vec<&str> = ranked.iter().map(|r| r.journal.as_str()).collect();
        assert_eq!(journals, vec!["top", "low", "none"]);
    }

    #[test]
    fn date_fallback_when_no_ranks_present() {
        let batch = vec![
            rec("Gladyshev V", "B", "2020-Mar", None),
            rec("Gladyshev V", "A", "2020-Jan", None),
        ];
        let ranked = rank_year_batch(batch, &names());
        assert_eq!(ranked[0].date, "2020-Jan");
        assert_eq!(ranked[1].date, "2020-Mar");
    }

    #[test]
    fn unlisted_spelling_is_a_mismatch() {
        // Known limitation: alternate name forms outside the literal list
        // rank as non-matching.
        let batch = vec![
            rec("Gladyshev V.N.", "A", "2020-Jan", None),
            rec("Gladyshev VN", "B", "2020-Feb", None),
        ];
        let ranked = rank_year_batch(batch, &names());
        assert_eq!(ranked[0].journal, "B");
    }

    #[test]
    fn authority_table_parses_semicolon_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("impact.csv");
        std::fs::write(&path, "Rank;Title;Extra\n1;Nature;x\n17;Cell Metabolism;y\nbad;Oops;z\n")
            .unwrap();

        let table = load_authority_table(&path).unwrap().unwrap();
        assert_eq!(table.get("nature"), Some(&1.0));
        assert_eq!(table.get("cell metabolism"), Some(&17.0));
        assert!(!table.contains_key("oops"));
    }

    #[test]
    fn absent_authority_table_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_authority_table(&dir.path().join("missing.csv"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn ranks_join_by_lowercased_journal() {
        let mut batch = vec![rec("Gladyshev V", "Nature", "2020-Jan", None)];
        let mut table = HashMap::new();
        table.insert("nature".to_string(), 1.0);
        apply_ranks(&mut batch, &table);
        assert_eq!(batch[0].rank, Some(1.0));
    }
}
