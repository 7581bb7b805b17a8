//! Markdown output formatting.

use crate::models::PaperRecord;

/// Abstracts longer than this are cut in list views.
const ABSTRACT_PREVIEW_CHARS: usize = 500;

/// Format a list of records as Markdown.
#[must_use]
pub fn format_records_markdown(records: &[PaperRecord]) -> String {
    if records.is_empty() {
        return "No papers found.".to_string();
    }

    let mut output = format!("# Papers ({} results)\n\n", records.len());

    for (i, record) in records.iter().enumerate() {
        output.push_str(&format_record_markdown(record, i + 1, Some(ABSTRACT_PREVIEW_CHARS)));
        output.push_str("\n---\n\n");
    }

    output
}

/// Format a single record as Markdown.
///
/// `abstract_limit` truncates the abstract to that many characters; `None`
/// prints it in full.
#[must_use]
pub fn format_record_markdown(
    record: &PaperRecord,
    index: usize,
    abstract_limit: Option<usize>,
) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("## {}. {}\n\n", index, record.title_or_default()));

    // Authors
    if !record.authors.is_empty() {
        output.push_str(&format!("**Authors**: {}\n\n", record.author_names()));
    }

    // Journal line
    let mut meta = Vec::new();
    if let Some(journal) = &record.journal {
        meta.push(format!("**Journal**: {journal}"));
    }
    if let Some(date) = &record.publication_date {
        meta.push(format!("**Published**: {date}"));
    }
    if let Some(citation) = volume_issue_pages(record) {
        meta.push(format!("**Citation**: {citation}"));
    }
    if !meta.is_empty() {
        output.push_str(&format!("{}\n\n", meta.join(" | ")));
    }

    // Identifiers
    let mut ids = vec![format!("[PMID {}]({})", record.pmid, record.link())];
    if let Some(doi) = &record.doi {
        ids.push(format!("[DOI](https://doi.org/{doi})"));
    }
    if let Some(pmc) = &record.pmc_id {
        ids.push(format!("[{pmc}](https://www.ncbi.nlm.nih.gov/pmc/articles/{pmc}/)"));
    }
    output.push_str(&format!("**Links**: {}\n\n", ids.join(" | ")));

    if !record.publication_types.is_empty() {
        output.push_str(&format!("**Type**: {}\n\n", record.publication_types.join(", ")));
    }

    if !record.keywords.is_empty() {
        output.push_str(&format!("**Keywords**: {}\n\n", record.keywords.join(", ")));
    }

    if !record.mesh_terms.is_empty() {
        output.push_str(&format!("**MeSH**: {}\n\n", record.mesh_terms.join(", ")));
    }

    if let Some(text) = record.abstract_text() {
        let text = match abstract_limit {
            Some(limit) => truncate_chars(&text, limit),
            None => text,
        };
        output.push_str(&format!("**Abstract**: {text}\n"));
    }

    output
}

/// "25(9):1337-1340" style locator.
fn volume_issue_pages(record: &PaperRecord) -> Option<String> {
    let mut out = String::new();
    if let Some(volume) = &record.volume {
        out.push_str(volume);
    }
    if let Some(issue) = &record.issue {
        out.push_str(&format!("({issue})"));
    }
    if let Some(pages) = &record.pages {
        if !out.is_empty() {
            out.push(':');
        }
        out.push_str(pages);
    }
    (!out.is_empty()).then_some(out)
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
