//! MCP tool implementations.
//!
//! Each tool:
//! 1. Parses and validates input parameters
//! 2. Calls the E-utilities client
//! 3. Formats results as Markdown or JSON

mod details;
mod search;

pub use details::*;
pub use search::*;

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::PubMedClient;
use crate::error::ToolResult;
use crate::models::PaperRecord;

/// Tool execution context.
pub struct ToolContext {
    /// API client.
    pub client: Arc<PubMedClient>,
}

impl ToolContext {
    /// Create a new tool context.
    #[must_use]
    pub fn new(client: Arc<PubMedClient>) -> Self {
        Self { client }
    }
}

/// Trait for MCP tools.
#[async_trait::async_trait]
pub trait McpTool: Send + Sync {
    /// Tool name (e.g., "search_pubmed").
    fn name(&self) -> &'static str;

    /// Tool description for LLM.
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters.
    fn input_schema(&self) -> serde_json::Value;

    /// Execute the tool with given input.
    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String>;
}

/// Register all tools.
#[must_use]
pub fn register_all_tools() -> Vec<Box<dyn McpTool>> {
    vec![Box::new(search::SearchPubmedTool), Box::new(details::FetchPaperDetailsTool)]
}

/// Arrange fetched records in the order of `ids`.
///
/// Returns the ordered records and the ids with no matching record. Records
/// whose PMID was not requested are dropped.
pub(crate) fn order_by_ids(
    records: Vec<PaperRecord>,
    ids: &[String],
) -> (Vec<PaperRecord>, Vec<String>) {
    let mut by_id: HashMap<String, PaperRecord> = HashMap::with_capacity(records.len());
    for record in records {
        by_id.entry(record.pmid.clone()).or_insert(record);
    }

    let mut ordered = Vec::with_capacity(ids.len());
    let mut missing = Vec::new();

    for id in ids {
        match by_id.remove(id) {
            Some(record) => ordered.push(record),
            None => missing.push(id.clone()),
        }
    }

    (ordered, missing)
}
