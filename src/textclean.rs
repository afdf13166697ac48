//! Text cleaner: deterministic canonicalization of titles and abstracts
//! before embedding and keyword extraction. Pure and idempotent.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+").unwrap());
static CHARSET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s.,;:!?\-]").unwrap());
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Clean one free-text field: lowercase, strip URLs and email-like
/// substrings, blank out characters outside the retained punctuation set,
/// collapse whitespace, and drop tokens shorter than two characters except
/// the standalone "a" and "i".
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = text.to_lowercase();
    let text = URL_RE.replace_all(&text, "");
    let text = EMAIL_RE.replace_all(&text, "");
    let text = CHARSET_RE.replace_all(&text, " ");
    let text = WS_RE.replace_all(&text, " ");

    let kept: Vec<&str> = text
        .split(' ')
        .filter(|w| w.chars().count() >= 2 || *w == "a" || *w == "i")
        .collect();
    kept.join(" ").trim().to_string()
}

/// Embedding input for one record: cleaned title and cleaned abstract joined
/// by a single space.
pub fn embedding_input(title_clean: &str, abstract_clean: &str) -> String {
    format!("{} {}", title_clean, abstract_clean).trim().to_string()
}

/// Working-set admission for the clustering stage. Near-empty documents
/// destabilize both the neighbor graph and the keyword statistics, so a
/// record must carry a substantial title or abstract, and its combined
/// cleaned text must clear a floor length.
pub fn is_substantial(
    title_clean: &str,
    abstract_clean: &str,
    min_title_len: usize,
    min_abstract_len: usize,
) -> bool {
    title_clean.chars().count() >= min_title_len
        || abstract_clean.chars().count() >= min_abstract_len
}

pub fn combined_is_long_enough(combined: &str, min_combined_len: usize) -> bool {
    combined.chars().count() >= min_combined_len
}
