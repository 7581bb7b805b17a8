//! PubMed search tool: search_pubmed.

use serde_json::json;

use super::{McpTool, ToolContext, order_by_ids};
use crate::config::limits;
use crate::error::{ToolError, ToolResult};
use crate::formatters;
use crate::models::{ResponseFormat, SearchPubmedInput};
use crate::query::SearchQuery;

/// Keyword/author search over PubMed.
pub struct SearchPubmedTool;

#[async_trait::async_trait]
impl McpTool for SearchPubmedTool {
    fn name(&self) -> &'static str {
        "search_pubmed"
    }

    fn description(&self) -> &'static str {
        "Search PubMed by title/abstract keywords and/or author names. \
         Keywords are OR-combined, authors are OR-combined, and the two groups \
         are AND-combined. Returns PMID, title, authors, journal, date, DOI and \
         abstract for each hit, in PubMed relevance order."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "keywords": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Keywords to match in title or abstract"
                },
                "authors": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Author names, surname followed by initials (e.g., \"Doe JP\")"
                },
                "maxResults": {
                    "type": "integer",
                    "default": limits::DEFAULT_MAX_RESULTS,
                    "minimum": 1,
                    "maximum": limits::MAX_SEARCH_RESULTS
                },
                "yearStart": {
                    "type": "integer",
                    "description": "Earliest publication year (inclusive)"
                },
                "yearEnd": {
                    "type": "integer",
                    "description": "Latest publication year (inclusive)"
                },
                "sort": {
                    "type": "string",
                    "enum": ["relevance", "pub_date"],
                    "default": "relevance"
                },
                "responseFormat": {
                    "type": "string",
                    "enum": ["markdown", "json"],
                    "default": "markdown"
                }
            }
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: SearchPubmedInput = serde_json::from_value(input)?;

        let max = limits::MAX_SEARCH_RESULTS;
        let retmax = u32::try_from(params.max_results)
            .ok()
            .filter(|n| (1..=max).contains(n))
            .ok_or_else(|| {
                ToolError::validation(
                    "maxResults",
                    format!("must be between 1 and {max}, got {}", params.max_results),
                )
            })?;

        let term = SearchQuery::new()
            .authors(&params.authors)
            .keywords(&params.keywords)
            .years(params.year_start, params.year_end)
            .build()?;

        tracing::info!(query = %term, retmax, "Search query");

        let search = ctx.client.search(&term, retmax, 0, params.sort).await?;

        // Zero matches: empty result, no fetch.
        let records = if search.is_empty() {
            Vec::new()
        } else {
            let fetched = ctx.client.fetch_articles(&search.idlist).await?;
            let (ordered, missing) = order_by_ids(fetched, &search.idlist);
            if !missing.is_empty() {
                tracing::warn!(?missing, "E-search ids absent from efetch response");
            }
            ordered
        };

        match params.response_format {
            ResponseFormat::Markdown => {
                let mut output = format!("**Query**: `{term}`\n\n");
                output.push_str(&format!(
                    "**Matches**: {} (showing {})\n\n",
                    search.count,
                    records.len()
                ));
                output.push_str(&formatters::format_records_markdown(&records));
                Ok(output)
            }
            ResponseFormat::Json => {
                let results = records.iter().map(formatters::compact_record).collect::<Vec<_>>();
                Ok(serde_json::to_string_pretty(&json!({
                    "success": true,
                    "query": term,
                    "total_results": search.idlist.len(),
                    "total_count": search.count,
                    "results": results
                }))?)
            }
        }
    }
}
