//! Cluster labeler: tf-idf statistics over the retained cleaned documents,
//! restricted per cluster, distilled into a keyword report and a short
//! display label.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::config::LabelingConfig;

/// Per-cluster keyword profile. Clusters with zero members never get one.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterProfile {
    pub cluster_id: usize,
    /// Top terms by averaged tf-idf, most distinctive first.
    pub keywords: Vec<String>,
    /// Top-3 keywords, title-cased, joined with " + ".
    pub label: String,
    pub member_count: usize,
}

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w\w+").unwrap());

/// Tokens of one cleaned document after stopword removal; bigrams are formed
/// over the surviving sequence.
fn terms_of(text: &str, stop: &HashSet<&'static str>) -> Vec<String> {
    let words: Vec<&str> = TOKEN_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|w| !stop.contains(*w))
        .collect();

    let mut terms: Vec<String> = words.iter().map(|w| w.to_string()).collect();
    for (first, second) in words.iter().tuple_windows() {
        terms.push(format!("{first} {second}"));
    }
    terms
}

fn title_case(term: &str) -> String {
    term.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compute keyword profiles for every non-empty cluster.
///
/// Vocabulary: unigrams + bigrams of the cleaned texts, stopwords removed,
/// terms in fewer than `min_doc_freq` documents or more than
/// `max_doc_ratio` of them excluded, capped at `max_vocab` by total term
/// frequency. Scores are smooth-idf tf-idf with l2-normalized document
/// rows; a cluster's keyword ranking averages the rows of its members.
pub fn label_clusters(
    texts: &[String],
    assignments: &[usize],
    k: usize,
    cfg: &LabelingConfig,
) -> Vec<ClusterProfile> {
    assert_eq!(texts.len(), assignments.len());
    let n_docs = texts.len();
    if n_docs == 0 {
        return Vec::new();
    }

    let stop = &*STOPWORDS;
    let doc_terms: Vec<Vec<String>> = texts.iter().map(|t| terms_of(t, stop)).collect();

    // document frequency and corpus-wide term frequency
    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    let mut term_freq: HashMap<&str, usize> = HashMap::new();
    for terms in &doc_terms {
        let mut seen: HashSet<&str> = HashSet::new();
        for t in terms {
            *term_freq.entry(t.as_str()).or_insert(0) += 1;
            if seen.insert(t.as_str()) {
                *doc_freq.entry(t.as_str()).or_insert(0) += 1;
            }
        }
    }

    let max_df = (cfg.max_doc_ratio * n_docs as f64).floor() as usize;
    let mut vocab: Vec<&str> = doc_freq
        .iter()
        .filter(|(_, &df)| df >= cfg.min_doc_freq && df <= max_df.max(1))
        .map(|(&t, _)| t)
        .collect();
    // cap by corpus-wide frequency, ties broken alphabetically for
    // reproducible vocabularies
    vocab.sort_by(|a, b| {
        term_freq[b]
            .cmp(&term_freq[a])
            .then_with(|| a.cmp(b))
    });
    vocab.truncate(cfg.max_vocab);

    let index: HashMap<&str, usize> = vocab.iter().enumerate().map(|(i, &t)| (t, i)).collect();
    let idf: Vec<f64> = vocab
        .iter()
        .map(|t| ((1.0 + n_docs as f64) / (1.0 + doc_freq[t] as f64)).ln() + 1.0)
        .collect();
    debug!("Labeling vocabulary - terms={}, documents={}", vocab.len(), n_docs);

    // l2-normalized tf-idf rows, accumulated straight into cluster sums
    let mut cluster_sums: Vec<HashMap<usize, f64>> = vec![HashMap::new(); k];
    let mut cluster_counts = vec![0usize; k];
    for (doc, terms) in doc_terms.iter().enumerate() {
        let cluster = assignments[doc];
        cluster_counts[cluster] += 1;

        let mut row: HashMap<usize, f64> = HashMap::new();
        for t in terms {
            if let Some(&i) = index.get(t.as_str()) {
                *row.entry(i).or_insert(0.0) += idf[i];
            }
        }
        let norm: f64 = row.values().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (&i, v) in &row {
                *cluster_sums[cluster].entry(i).or_insert(0.0) += v / norm;
            }
        }
    }

    let mut profiles = Vec::new();
    for c in 0..k {
        if cluster_counts[c] == 0 {
            continue;
        }
        let mut scored: Vec<(usize, f64)> = cluster_sums[c]
            .iter()
            .map(|(&i, &sum)| (i, sum / cluster_counts[c] as f64))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| vocab[a.0].cmp(vocab[b.0]))
        });

        let keywords: Vec<String> = scored
            .iter()
            .take(cfg.top_words_for_report)
            .map(|&(i, _)| vocab[i].to_string())
            .collect();

        let label = keywords
            .iter()
            .take(cfg.top_words_for_label)
            .map(|w| title_case(&w.replace('_', " ")))
            .collect::<Vec<_>>()
            .join(" + ");

        profiles.push(ClusterProfile {
            cluster_id: c,
            keywords,
            label,
            member_count: cluster_counts[c],
        });
    }
    profiles
}

/// English, Russian, and academic-jargon stopwords, unioned.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let english = [
        "the", "a", "an", "and", "or", "but", "if", "then", "else", "when", "while", "of", "to",
        "in", "on", "for", "with", "as", "by", "at", "from", "into", "onto", "over", "under",
        "about", "after", "before", "between", "during", "without", "within", "through", "than",
        "is", "are", "was", "were", "be", "been", "being", "am", "do", "does", "did", "doing",
        "have", "has", "had", "having", "will", "would", "shall", "should", "can", "could", "may",
        "might", "must", "that", "this", "these", "those", "it", "its", "itself", "they", "them",
        "their", "theirs", "themselves", "he", "him", "his", "himself", "she", "her", "hers",
        "herself", "we", "us", "our", "ours", "ourselves", "you", "your", "yours", "yourself",
        "i", "me", "my", "mine", "myself", "what", "which", "who", "whom", "whose", "where",
        "why", "how", "all", "each", "every", "both", "few", "more", "most", "other", "others",
        "some", "any", "such", "no", "nor", "not", "only", "own", "same", "so", "too", "very",
        "just", "also", "here", "there", "again", "further", "once", "because", "until", "above",
        "below", "up", "down", "out", "off", "now", "against",
    ];
    let russian = [
        "и", "в", "во", "не", "что", "он", "на", "я", "с", "со", "как", "а", "то", "все", "она",
        "так", "его", "но", "да", "ты", "к", "у", "же", "вы", "за", "бы", "по", "ее", "мне",
        "было", "вот", "от", "меня", "еще", "нет", "о", "из", "ему", "теперь", "когда", "даже",
        "ну", "ли", "если", "уже", "или", "ни", "быть", "был", "него", "до", "вас", "нибудь",
        "опять", "уж", "вам", "ведь", "там", "потом", "себя", "ничего", "ей", "может", "они",
        "тут", "где", "есть", "надо", "ней", "для", "мы", "тебя", "их", "чем", "была", "сам",
        "чтоб", "без", "будто", "чего", "раз", "тоже", "себе", "под", "будет", "при", "этот",
        "того", "потому", "этого", "какой", "ним", "этом", "один", "почти", "мой", "тем",
        "чтобы", "нее", "были", "куда", "зачем", "всех", "можно", "ведь", "хоть", "после",
        "над", "больше", "тот", "через", "эти", "нас", "про", "них", "какая", "много", "разве",
        "эту", "моя", "свою", "этой", "перед", "лучше", "чуть", "том", "такой", "им", "более",
        "всегда", "конечно", "всю", "между",
    ];
    let academic = [
        "abstract", "introduction", "conclusion", "results", "discussion", "method", "methods",
        "methodology", "analysis", "data", "study", "research", "paper", "article", "journal",
        "conference", "proceedings", "university", "department", "institute", "laboratory",
        "lab", "figure", "table", "section", "chapter", "page", "pp", "vol", "volume", "issue",
        "number", "doi", "isbn", "issn", "editor", "eds", "ed", "et", "al", "etc", "ie", "eg",
        "cf", "vs", "via",
    ];

    english
        .into_iter()
        .chain(russian)
        .chain(academic)
        .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LabelingConfig {
        LabelingConfig {
            max_vocab: 10_000,
            top_words_for_label: 3,
            top_words_for_report: 10,
            min_doc_freq: 2,
            max_doc_ratio: 0.8,
        }
    }

    fn corpus() -> (Vec<String>, Vec<usize>) {
        let texts = vec![
            "selenium metabolism in aging tissue".to_string(),
            "selenium metabolism drives aging pathways".to_string(),
            "selenium metabolism aging readout".to_string(),
            "ribosome translation fidelity control".to_string(),
            "ribosome translation fidelity screening".to_string(),
            "ribosome translation fidelity map".to_string(),
        ];
        let assignments = vec![0, 0, 0, 1, 1, 1];
        (texts, assignments)
    }

    #[test]
    fn distinctive_terms_label_their_cluster() {
        let (texts, assignments) = corpus();
        let profiles = label_clusters(&texts, &assignments, 2, &cfg());
        assert_eq!(profiles.len(), 2);

        let p0 = &profiles[0];
        assert!(p0.keywords.iter().any(|w| w == "selenium"));
        assert!(!p0.keywords.iter().any(|w| w == "ribosome"));

        let p1 = &profiles[1];
        assert!(p1.keywords.iter().any(|w| w == "ribosome"));
        assert!(!p1.keywords.iter().any(|w| w == "selenium"));
    }

    #[test]
    fn empty_cluster_slots_are_skipped() {
        let (texts, assignments) = corpus();
        let profiles = label_clusters(&texts, &assignments, 6, &cfg());
        assert_eq!(profiles.len(), 2);
        let ids: Vec<usize> = profiles.iter().map(|p| p.cluster_id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn rare_and_ubiquitous_terms_are_excluded() {
        let texts = vec![
            "shared alpha uniqueterm".to_string(),
            "shared shared alpha beta".to_string(),
            "shared shared alpha beta".to_string(),
            "shared shared alpha beta".to_string(),
            "shared shared alpha beta".to_string(),
        ];
        let assignments = vec![0; 5];
        let profiles = label_clusters(&texts, &assignments, 1, &cfg());
        let kw = &profiles[0].keywords;
        // df("uniqueterm") == 1 < min_doc_freq
        assert!(!kw.iter().any(|w| w == "uniqueterm"));
        // df("shared") == 5 > 0.8 * 5
        assert!(!kw.iter().any(|w| w == "shared"));
        // df("beta") == 4 sits inside the band
        assert!(kw.iter().any(|w| w == "beta"));
    }

    #[test]
    fn stopwords_never_surface() {
        let texts = vec![
            "the analysis of the aging process".to_string(),
            "the analysis of the aging clock".to_string(),
            "the protein folding landscape".to_string(),
        ];
        let profiles = label_clusters(&texts, &vec![0, 0, 0], 1, &cfg());
        let kw = &profiles[0].keywords;
        assert!(kw.iter().any(|w| w == "aging"));
        assert!(!kw.iter().any(|w| w == "the"));
        assert!(!kw.iter().any(|w| w == "analysis")); // academic stopword
    }

    #[test]
    fn bigrams_join_surviving_tokens() {
        let stop = &*STOPWORDS;
        let terms = terms_of("selenium metabolism of aging", stop);
        assert!(terms.contains(&"selenium metabolism".to_string()));
        // "of" is removed before n-gram formation
        assert!(terms.contains(&"metabolism aging".to_string()));
    }

    #[test]
    fn label_is_top_three_title_cased() {
        let (texts, assignments) = corpus();
        let profiles = label_clusters(&texts, &assignments, 2, &cfg());
        let label = &profiles[0].label;
        let parts: Vec<&str> = label.split(" + ").collect();
        assert_eq!(parts.len(), 3);
        for part in parts {
            let first = part.chars().next().unwrap();
            assert!(first.is_uppercase(), "label part {part:?} not title-cased");
        }
    }
}
