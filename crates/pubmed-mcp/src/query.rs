//! E-utilities search term construction.
//!
//! Tool parameters are mapped onto PubMed's field-tagged query syntax:
//! each author becomes `name[Author]`, each keyword `kw[Title/Abstract]`,
//! entries within a group are OR-joined, and groups are AND-joined.

use crate::error::{ToolError, ToolResult};

/// Lower bound used when only `yearEnd` is given.
const OPEN_START_YEAR: i32 = 1800;

/// Upper bound used when only `yearStart` is given.
const OPEN_END_YEAR: i32 = 3000;

/// Builder for a PubMed search term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    keywords: Vec<String>,
    authors: Vec<String>,
    year_start: Option<i32>,
    year_end: Option<i32>,
}

impl SearchQuery {
    /// Create an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add title/abstract keywords. Blank entries are ignored.
    #[must_use]
    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords.extend(clean(keywords));
        self
    }

    /// Add author names. Blank entries are ignored.
    #[must_use]
    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.authors.extend(clean(authors));
        self
    }

    /// Restrict to a publication year range (inclusive, either end open).
    #[must_use]
    pub const fn years(mut self, start: Option<i32>, end: Option<i32>) -> Self {
        self.year_start = start;
        self.year_end = end;
        self
    }

    /// True when neither keywords nor authors were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.authors.is_empty()
    }

    /// Render the `term` parameter.
    ///
    /// # Errors
    ///
    /// Fails when there is nothing to search for, or when the year range is
    /// inverted.
    pub fn build(&self) -> ToolResult<String> {
        if self.is_empty() {
            return Err(ToolError::validation(
                "keywords",
                "No search parameters provided. Please specify authors or keywords.",
            ));
        }

        if let (Some(start), Some(end)) = (self.year_start, self.year_end) {
            if start > end {
                return Err(ToolError::validation(
                    "yearStart",
                    format!("yearStart ({start}) is after yearEnd ({end})"),
                ));
            }
        }

        let mut groups = Vec::with_capacity(3);

        if !self.authors.is_empty() {
            groups.push(or_group(&self.authors, "Author"));
        }

        if !self.keywords.is_empty() {
            groups.push(or_group(&self.keywords, "Title/Abstract"));
        }

        if self.year_start.is_some() || self.year_end.is_some() {
            let start = self.year_start.unwrap_or(OPEN_START_YEAR);
            let end = self.year_end.unwrap_or(OPEN_END_YEAR);
            groups.push(format!("(\"{start}\"[PDAT] : \"{end}\"[PDAT])"));
        }

        Ok(groups.join(" AND "))
    }
}

fn clean<I, S>(items: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| !s.is_empty())
}

fn or_group(terms: &[String], field: &str) -> String {
    let joined = terms.iter().map(|t| format!("{t}[{field}]")).collect::<Vec<_>>().join(" OR ");
    format!("({joined})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_only() {
        let term = SearchQuery::new().keywords(["crispr", "base editing"]).build().unwrap();
        assert_eq!(term, "(crispr[Title/Abstract] OR base editing[Title/Abstract])");
    }

    #[test]
    fn test_authors_then_keywords() {
        let term = SearchQuery::new()
            .keywords(["sepsis"])
            .authors(["Doe JP", "Roe R"])
            .build()
            .unwrap();
        assert_eq!(
            term,
            "(Doe JP[Author] OR Roe R[Author]) AND (sepsis[Title/Abstract])"
        );
    }

    #[test]
    fn test_year_range() {
        let term = SearchQuery::new().keywords(["malaria"]).years(Some(2015), Some(2020)).build();
        assert_eq!(
            term.unwrap(),
            "(malaria[Title/Abstract]) AND (\"2015\"[PDAT] : \"2020\"[PDAT])"
        );

        let open_end = SearchQuery::new().keywords(["malaria"]).years(Some(2015), None).build();
        assert!(open_end.unwrap().ends_with("(\"2015\"[PDAT] : \"3000\"[PDAT])"));
    }

    #[test]
    fn test_blank_entries_ignored() {
        let query = SearchQuery::new().keywords(["", "   "]).authors(Vec::<String>::new());
        assert!(query.is_empty());
        assert!(query.build().is_err());
    }

    #[test]
    fn test_inner_whitespace_collapsed() {
        let term = SearchQuery::new().keywords(["  heart \n failure "]).build().unwrap();
        assert_eq!(term, "(heart failure[Title/Abstract])");
    }

    #[test]
    fn test_inverted_years_rejected() {
        let err = SearchQuery::new().keywords(["x"]).years(Some(2022), Some(2001)).build();
        assert!(matches!(err, Err(ToolError::Validation { .. })));
    }
}
