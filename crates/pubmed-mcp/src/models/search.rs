//! E-search (`esearch.fcgi`, `retmode=json`) response types.

use serde::{Deserialize, Deserializer, Serialize};

/// Top-level E-search response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ESearchResponse {
    /// Result block (absent when the request itself was rejected).
    #[serde(default)]
    pub esearchresult: Option<ESearchResult>,

    /// Request-level error message.
    #[serde(default, rename = "ERROR")]
    pub error: Option<String>,
}

/// Result block of an E-search response.
///
/// NCBI encodes the numeric fields as strings ("count": "42").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ESearchResult {
    /// Total number of matching records.
    #[serde(default, deserialize_with = "number_or_string")]
    pub count: u64,

    /// Number of ids returned in this page.
    #[serde(default, deserialize_with = "number_or_string")]
    pub retmax: u64,

    /// Offset of the first returned id.
    #[serde(default, deserialize_with = "number_or_string")]
    pub retstart: u64,

    /// PMIDs in ranking order.
    #[serde(default)]
    pub idlist: Vec<String>,

    /// How PubMed interpreted the term.
    #[serde(default)]
    pub querytranslation: Option<String>,

    /// Search-level error message.
    #[serde(default, rename = "ERROR")]
    pub error: Option<String>,
}

impl ESearchResult {
    /// True when the search matched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.idlist.is_empty()
    }
}

fn number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
        Null,
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) if s.trim().is_empty() => Ok(0),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Raw::Null => Ok(0),
    }
}
