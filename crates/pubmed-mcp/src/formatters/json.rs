//! JSON output formatting.

use serde_json::{Value, json};

use crate::models::PaperRecord;

/// Create a compact record representation for JSON output.
///
/// Core bibliographic fields are always present (`null` when the payload
/// lacked them); list-valued extras appear only when non-empty.
#[must_use]
pub fn compact_record(record: &PaperRecord) -> Value {
    let mut obj = json!({
        "pubmed_id": record.pmid,
        "link": record.link(),
        "title": record.title,
        "authors": record.authors.iter().map(|a| a.display_name()).collect::<Vec<_>>(),
        "source": record.journal,
        "volume": record.volume,
        "issue": record.issue,
        "pages": record.pages,
        "doi": record.doi,
        "pubdate": record.publication_date.as_ref().map(ToString::to_string),
        "abstract": record.abstract_text(),
    });

    if let Some(pmc) = &record.pmc_id {
        obj["pmc_id"] = json!(pmc);
    }

    if !record.keywords.is_empty() {
        obj["keywords"] = json!(record.keywords);
    }

    if !record.mesh_terms.is_empty() {
        obj["mesh_terms"] = json!(record.mesh_terms);
    }

    if !record.publication_types.is_empty() {
        obj["publication_types"] = json!(record.publication_types);
    }

    obj
}
