//! Raw wire shapes of the bibliographic source API.
//!
//! The source is queried in two steps: an id search scoped to one year, then
//! a record fetch for those ids. These structs mirror the JSON the source
//! returns; mapping into domain records happens in `normalize`.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchEnvelope {
    pub esearchresult: SearchResult,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub idlist: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct FetchEnvelope {
    #[serde(default)]
    pub articles: Vec<RawArticle>,
}

/// One record as delivered by the source. Every field is optional at the
/// wire level; the normalizer decides what is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub journal: Option<RawJournal>,
    #[serde(default)]
    pub authors: Option<Vec<RawAuthor>>,
    /// Abstract body, delivered as ordered sections.
    #[serde(rename = "abstract", default)]
    pub abstract_sections: Vec<String>,
    #[serde(default)]
    pub article_ids: Vec<RawArticleId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJournal {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub pub_date: Option<RawPubDate>,
}

/// Publication date as nested by the source: either a single canonical
/// `medline_date` string, or separate year/month parts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPubDate {
    #[serde(default)]
    pub medline_date: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub month: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAuthor {
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub initials: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawArticleId {
    pub id_type: String,
    pub value: String,
}
