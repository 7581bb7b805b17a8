//! Detail retrieval tool: fetch_paper_details.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use super::{McpTool, ToolContext, order_by_ids};
use crate::config::limits;
use crate::error::{ToolError, ToolResult};
use crate::formatters;
use crate::models::{PaperDetailsInput, ResponseFormat};

/// Bare PMID, optionally written as "PMID:123" / "pmid 123".
static PMID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:pmid:?\s*)?(\d{1,9})$").expect("valid PMID regex"));

/// Normalise a user-supplied identifier to a bare PMID.
///
/// Leading zeros are dropped; zero is not a PMID.
#[must_use]
pub fn normalize_pmid(raw: &str) -> Option<String> {
    let caps = PMID_RE.captures(raw.trim())?;
    let value: u64 = caps.get(1)?.as_str().parse().ok()?;
    (value > 0).then(|| value.to_string())
}

/// Full-record retrieval by PMID.
pub struct FetchPaperDetailsTool;

#[async_trait::async_trait]
impl McpTool for FetchPaperDetailsTool {
    fn name(&self) -> &'static str {
        "fetch_paper_details"
    }

    fn description(&self) -> &'static str {
        "Fetch full details (title, authors, journal, volume/issue/pages, date, \
         DOI, abstract, keywords, MeSH terms) for one or more PubMed IDs. \
         Unknown or invalid IDs are listed separately."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "pubmedIds": {
                    "type": "array",
                    "items": {"type": "string"},
                    "minItems": 1,
                    "maxItems": limits::MAX_FETCH_IDS,
                    "description": "PubMed IDs (e.g., \"31452104\")"
                },
                "responseFormat": {
                    "type": "string",
                    "enum": ["markdown", "json"],
                    "default": "markdown"
                }
            },
            "required": ["pubmedIds"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: PaperDetailsInput = serde_json::from_value(input)?;

        if params.pubmed_ids.len() > limits::MAX_FETCH_IDS {
            return Err(ToolError::validation(
                "pubmedIds",
                format!(
                    "at most {} IDs per call, got {}",
                    limits::MAX_FETCH_IDS,
                    params.pubmed_ids.len()
                ),
            ));
        }

        let mut seen = HashSet::new();
        let mut valid: Vec<String> = Vec::new();
        let mut invalid: Vec<String> = Vec::new();

        for raw in &params.pubmed_ids {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match normalize_pmid(raw) {
                Some(pmid) => {
                    if seen.insert(pmid.clone()) {
                        valid.push(pmid);
                    }
                }
                None => invalid.push(raw.to_string()),
            }
        }

        if valid.is_empty() && invalid.is_empty() {
            return Err(ToolError::validation("pubmedIds", "at least one PubMed ID is required"));
        }

        if !invalid.is_empty() {
            tracing::debug!(?invalid, "Skipping identifiers that are not PMIDs");
        }

        let fetched = ctx.client.fetch_articles(&valid).await?;
        let (records, not_found) = order_by_ids(fetched, &valid);

        match params.response_format {
            ResponseFormat::Markdown => {
                let mut output = String::new();
                if records.is_empty() {
                    output.push_str("No papers found.\n");
                } else {
                    output.push_str(&format!("# Paper Details ({} found)\n\n", records.len()));
                    for (i, record) in records.iter().enumerate() {
                        output.push_str(&formatters::format_record_markdown(record, i + 1, None));
                        output.push_str("\n---\n\n");
                    }
                }
                if !not_found.is_empty() {
                    output.push_str(&format!(
                        "\n**Not found ({}):** {}\n",
                        not_found.len(),
                        not_found.join(", ")
                    ));
                }
                if !invalid.is_empty() {
                    output.push_str(&format!(
                        "\n**Invalid IDs ({}):** {}\n",
                        invalid.len(),
                        invalid.join(", ")
                    ));
                }
                Ok(output)
            }
            ResponseFormat::Json => {
                let found = records.iter().map(formatters::compact_record).collect::<Vec<_>>();
                Ok(serde_json::to_string_pretty(&json!({
                    "found": found,
                    "not_found": not_found,
                    "invalid": invalid
                }))?)
            }
        }
    }
}
