//! Article record extracted from PubMed `efetch` XML.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::api;

/// A PubMed article.
///
/// Every field other than `pmid` may be absent in the source payload and is
/// then `None` or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperRecord {
    /// PubMed identifier.
    pub pmid: String,

    /// Article title.
    #[serde(default)]
    pub title: Option<String>,

    /// Author list in citation order.
    #[serde(default)]
    pub authors: Vec<Author>,

    /// Full journal title.
    #[serde(default)]
    pub journal: Option<String>,

    /// ISO journal abbreviation (e.g., "Nat Med").
    #[serde(default)]
    pub journal_abbreviation: Option<String>,

    /// Journal volume.
    #[serde(default)]
    pub volume: Option<String>,

    /// Journal issue.
    #[serde(default)]
    pub issue: Option<String>,

    /// Page range (MEDLINE format, e.g., "101-9").
    #[serde(default)]
    pub pages: Option<String>,

    /// Publication date of the journal issue.
    #[serde(default)]
    pub publication_date: Option<PublicationDate>,

    /// Abstract, possibly split into labelled sections.
    #[serde(default)]
    pub abstract_sections: Vec<AbstractSection>,

    /// Digital Object Identifier.
    #[serde(default)]
    pub doi: Option<String>,

    /// PubMed Central identifier (e.g., "PMC1234567").
    #[serde(default)]
    pub pmc_id: Option<String>,

    /// Author keywords.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// MeSH descriptor names.
    #[serde(default)]
    pub mesh_terms: Vec<String>,

    /// Publication types (e.g., "Journal Article", "Review").
    #[serde(default)]
    pub publication_types: Vec<String>,
}

impl PaperRecord {
    /// Get the title, falling back to "Untitled" if not available.
    #[must_use]
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    /// Link to the article page on pubmed.ncbi.nlm.nih.gov.
    #[must_use]
    pub fn link(&self) -> String {
        format!("{}/{}/", api::PUBMED_WEB_URL, self.pmid)
    }

    /// Abstract as a single string.
    ///
    /// Labelled sections are rendered as `LABEL: text` and separated by a
    /// blank line.
    #[must_use]
    pub fn abstract_text(&self) -> Option<String> {
        if self.abstract_sections.is_empty() {
            return None;
        }

        let text = self
            .abstract_sections
            .iter()
            .map(|s| match &s.label {
                Some(label) => format!("{label}: {}", s.text),
                None => s.text.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        Some(text)
    }

    /// Author display names as a comma-separated string.
    #[must_use]
    pub fn author_names(&self) -> String {
        self.authors.iter().map(Author::display_name).collect::<Vec<_>>().join(", ")
    }

    /// First author's display name.
    #[must_use]
    pub fn first_author(&self) -> Option<String> {
        self.authors.first().map(Author::display_name)
    }

    /// Publication year, if one can be determined.
    #[must_use]
    pub fn year(&self) -> Option<i32> {
        self.publication_date.as_ref()?.year()
    }
}

/// One author entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Surname.
    #[serde(default)]
    pub last_name: Option<String>,

    /// Given names.
    #[serde(default)]
    pub fore_name: Option<String>,

    /// Initials of the given names.
    #[serde(default)]
    pub initials: Option<String>,

    /// Group name for collective authors (consortia, study groups).
    #[serde(default)]
    pub collective_name: Option<String>,
}

impl Author {
    /// Name in PubMed citation form ("Doe JP"), or the collective name.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(collective) = &self.collective_name {
            return collective.clone();
        }

        let parts: Vec<&str> = [self.last_name.as_deref(), self.initials.as_deref()]
            .into_iter()
            .flatten()
            .collect();

        if parts.is_empty() {
            self.fore_name.clone().unwrap_or_default()
        } else {
            parts.join(" ")
        }
    }

    /// True when no name component is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_name.is_none()
            && self.fore_name.is_none()
            && self.initials.is_none()
            && self.collective_name.is_none()
    }
}

/// Journal issue publication date.
///
/// PubMed stores either structured `Year`/`Month`/`Day` or a free-form
/// `MedlineDate` such as "1998 Dec-1999 Jan".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationDate {
    /// Four-digit year.
    #[serde(default)]
    pub year: Option<String>,

    /// Month, usually a three-letter abbreviation.
    #[serde(default)]
    pub month: Option<String>,

    /// Day of month.
    #[serde(default)]
    pub day: Option<String>,

    /// Free-form date used when the structured parts are missing.
    #[serde(default)]
    pub medline_date: Option<String>,
}

impl PublicationDate {
    /// Numeric year from `Year`, or the leading year of `MedlineDate`.
    #[must_use]
    pub fn year(&self) -> Option<i32> {
        if let Some(year) = self.year.as_deref().and_then(|y| y.trim().parse().ok()) {
            return Some(year);
        }

        let medline = self.medline_date.as_deref()?;
        medline.get(..4).and_then(|y| y.parse().ok())
    }

    /// True when no component is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none() && self.day.is_none() && self.medline_date.is_none()
    }
}

impl fmt::Display for PublicationDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> =
            [self.year.as_deref(), self.month.as_deref(), self.day.as_deref()]
                .into_iter()
                .flatten()
                .collect();

        if parts.is_empty() {
            f.write_str(self.medline_date.as_deref().unwrap_or_default())
        } else {
            f.write_str(&parts.join(" "))
        }
    }
}

/// One `AbstractText` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractSection {
    /// Section label (e.g., "BACKGROUND", "METHODS").
    #[serde(default)]
    pub label: Option<String>,

    /// Section text.
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(last: &str, initials: &str) -> Author {
        Author {
            last_name: Some(last.to_string()),
            fore_name: None,
            initials: Some(initials.to_string()),
            collective_name: None,
        }
    }

    #[test]
    fn test_link_uses_pmid() {
        let record = PaperRecord { pmid: "31452104".to_string(), ..Default::default() };
        assert_eq!(record.link(), "https://pubmed.ncbi.nlm.nih.gov/31452104/");
    }

    #[test]
    fn test_author_display_name() {
        assert_eq!(author("Doe", "JP").display_name(), "Doe JP");

        let group = Author {
            collective_name: Some("COVID-19 Genomics Consortium".to_string()),
            ..Default::default()
        };
        assert_eq!(group.display_name(), "COVID-19 Genomics Consortium");

        let surname_only = Author { last_name: Some("Plato".to_string()), ..Default::default() };
        assert_eq!(surname_only.display_name(), "Plato");
    }

    #[test]
    fn test_author_names_joined() {
        let record = PaperRecord {
            pmid: "1".to_string(),
            authors: vec![author("Doe", "J"), author("Roe", "RA")],
            ..Default::default()
        };
        assert_eq!(record.author_names(), "Doe J, Roe RA");
        assert_eq!(record.first_author().as_deref(), Some("Doe J"));
    }

    #[test]
    fn test_abstract_text_with_labels() {
        let record = PaperRecord {
            pmid: "1".to_string(),
            abstract_sections: vec![
                AbstractSection { label: Some("BACKGROUND".to_string()), text: "Why.".to_string() },
                AbstractSection { label: Some("RESULTS".to_string()), text: "What.".to_string() },
            ],
            ..Default::default()
        };
        assert_eq!(record.abstract_text().unwrap(), "BACKGROUND: Why.\n\nRESULTS: What.");
    }

    #[test]
    fn test_abstract_text_absent() {
        let record = PaperRecord::default();
        assert!(record.abstract_text().is_none());
    }

    #[test]
    fn test_publication_date_display_and_year() {
        let date = PublicationDate {
            year: Some("2021".to_string()),
            month: Some("Mar".to_string()),
            day: Some("4".to_string()),
            medline_date: None,
        };
        assert_eq!(date.to_string(), "2021 Mar 4");
        assert_eq!(date.year(), Some(2021));

        let medline = PublicationDate {
            medline_date: Some("1998 Dec-1999 Jan".to_string()),
            ..Default::default()
        };
        assert_eq!(medline.to_string(), "1998 Dec-1999 Jan");
        assert_eq!(medline.year(), Some(1998));
    }
}
