//! Input models for MCP tool parameters.
//!
//! Field names are camelCase; the snake_case names used by earlier PubMed
//! MCP servers are accepted as aliases.

use serde::{Deserialize, Deserializer, Serialize};

use super::{ResponseFormat, SortOrder};
use crate::config::limits;

/// Input for `search_pubmed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPubmedInput {
    /// Keywords matched against title and abstract (OR-joined).
    #[serde(default, alias = "title_abstract_keywords", deserialize_with = "one_or_many")]
    pub keywords: Vec<String>,

    /// Author names, surname followed by initials (e.g., "Doe JP"), OR-joined.
    #[serde(default, alias = "author", deserialize_with = "one_or_many")]
    pub authors: Vec<String>,

    /// Maximum records to return.
    #[serde(default = "default_max_results", alias = "num_results", alias = "max_results")]
    pub max_results: i64,

    /// Earliest publication year (inclusive).
    #[serde(default, alias = "year_start")]
    pub year_start: Option<i32>,

    /// Latest publication year (inclusive).
    #[serde(default, alias = "year_end")]
    pub year_end: Option<i32>,

    /// Result ordering.
    #[serde(default)]
    pub sort: SortOrder,

    /// Output format.
    #[serde(default, alias = "response_format")]
    pub response_format: ResponseFormat,
}

fn default_max_results() -> i64 {
    i64::from(limits::DEFAULT_MAX_RESULTS)
}

/// Input for `fetch_paper_details`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperDetailsInput {
    /// PubMed identifiers.
    #[serde(alias = "pubmed_ids", alias = "ids", deserialize_with = "one_or_many")]
    pub pubmed_ids: Vec<String>,

    /// Output format.
    #[serde(default, alias = "response_format")]
    pub response_format: ResponseFormat,
}

/// Accept a single string, a list of strings, or null.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
        Null,
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::One(s) => vec![s],
        Raw::Many(v) => v,
        Raw::Null => Vec::new(),
    })
}
