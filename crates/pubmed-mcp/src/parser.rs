//! `PubmedArticleSet` XML parsing.
//!
//! A single streaming pass over the `efetch` payload with `quick-xml`.
//! The reader keeps a stack of open element names; field elements are
//! recognised by the tail of that stack, and their text (including the text
//! of inline markup such as `<i>` or `<sup>`) is collected until the element
//! closes. Parsing is a pure function of the input.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{ClientError, ClientResult};
use crate::models::{AbstractSection, Author, PaperRecord, PublicationDate};

/// Parse every `PubmedArticle` in an `efetch` response.
///
/// An empty document yields no records. An `eFetchResult` carrying only an
/// `ERROR` element is reported as [`ClientError::Api`].
///
/// # Errors
///
/// Returns an error for ill-formed XML, text outside the root element, or a
/// document that ends with elements still open.
pub fn parse_articles(xml: &str) -> ClientResult<Vec<PaperRecord>> {
    let mut reader = Reader::from_str(xml);
    let mut state = ParseState::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                state.stack.push(element_name(&e));
                state.on_start(&e)?;
            }
            Event::Empty(e) => {
                state.stack.push(element_name(&e));
                state.on_start(&e)?;
                state.on_end();
                state.stack.pop();
            }
            Event::End(_) => {
                state.on_end();
                state.stack.pop();
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                state.on_text(&text)?;
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c);
                state.on_text(&text)?;
            }
            Event::Eof => break,
            // Declarations, doctype, comments, processing instructions
            _ => {}
        }
    }

    if let Some(open) = state.stack.last() {
        return Err(ClientError::malformed(format!("document ended inside <{open}>")));
    }

    match state.api_error {
        Some(message) if state.records.is_empty() => Err(ClientError::api(message)),
        _ => Ok(state.records),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Pmid,
    Title,
    Journal,
    JournalAbbreviation,
    Volume,
    Issue,
    Pages,
    Year,
    Month,
    Day,
    MedlineDate,
    ElocationDoi,
    AbstractText,
    LastName,
    ForeName,
    Initials,
    CollectiveName,
    Keyword,
    MeshTerm,
    PublicationType,
    ArticleIdDoi,
    ArticleIdPmc,
    Error,
}

#[derive(Debug)]
struct Capture {
    field: Field,
    depth: usize,
    label: Option<String>,
    buf: String,
}

#[derive(Debug, Default)]
struct ArticleBuilder {
    record: PaperRecord,
    date: PublicationDate,
    author: Option<Author>,
    elocation_doi: Option<String>,
    article_id_doi: Option<String>,
}

impl ArticleBuilder {
    fn finish(self) -> PaperRecord {
        let mut record = self.record;
        if !self.date.is_empty() {
            record.publication_date = Some(self.date);
        }
        record.doi = self.elocation_doi.or(self.article_id_doi);
        record
    }

    fn store(&mut self, field: Field, label: Option<String>, text: String) {
        let record = &mut self.record;
        match field {
            Field::Pmid => {
                if record.pmid.is_empty() {
                    record.pmid = text;
                }
            }
            Field::Title => set_once(&mut record.title, text),
            Field::Journal => set_once(&mut record.journal, text),
            Field::JournalAbbreviation => set_once(&mut record.journal_abbreviation, text),
            Field::Volume => set_once(&mut record.volume, text),
            Field::Issue => set_once(&mut record.issue, text),
            Field::Pages => set_once(&mut record.pages, text),
            Field::Year => set_once(&mut self.date.year, text),
            Field::Month => set_once(&mut self.date.month, text),
            Field::Day => set_once(&mut self.date.day, text),
            Field::MedlineDate => set_once(&mut self.date.medline_date, text),
            Field::ElocationDoi => set_once(&mut self.elocation_doi, text),
            Field::ArticleIdDoi => set_once(&mut self.article_id_doi, text),
            Field::ArticleIdPmc => set_once(&mut record.pmc_id, text),
            Field::AbstractText => record.abstract_sections.push(AbstractSection { label, text }),
            Field::Keyword => record.keywords.push(text),
            Field::MeshTerm => record.mesh_terms.push(text),
            Field::PublicationType => record.publication_types.push(text),
            Field::LastName | Field::ForeName | Field::Initials | Field::CollectiveName => {
                if let Some(author) = self.author.as_mut() {
                    let slot = match field {
                        Field::LastName => &mut author.last_name,
                        Field::ForeName => &mut author.fore_name,
                        Field::Initials => &mut author.initials,
                        _ => &mut author.collective_name,
                    };
                    set_once(slot, text);
                }
            }
            Field::Error => {}
        }
    }
}

#[derive(Debug, Default)]
struct ParseState {
    stack: Vec<String>,
    article: Option<ArticleBuilder>,
    capture: Option<Capture>,
    records: Vec<PaperRecord>,
    api_error: Option<String>,
}

impl ParseState {
    fn at(&self, suffix: &[&str]) -> bool {
        self.stack.len() >= suffix.len()
            && self.stack[self.stack.len() - suffix.len()..].iter().zip(suffix).all(|(a, b)| a == b)
    }

    fn inside(&self, name: &str) -> bool {
        self.stack.iter().any(|n| n == name)
    }

    fn on_start(&mut self, e: &BytesStart<'_>) -> ClientResult<()> {
        // Inline markup inside a captured field contributes text only.
        if self.capture.is_some() {
            return Ok(());
        }

        if self.at(&["PubmedArticle"]) {
            self.article = Some(ArticleBuilder::default());
            return Ok(());
        }

        if self.article.is_none() {
            if self.at(&["ERROR"]) {
                self.begin(Field::Error, None);
            }
            return Ok(());
        }

        if self.at(&["AuthorList", "Author"]) && self.inside("Article") {
            if let Some(article) = self.article.as_mut() {
                article.author = Some(Author::default());
            }
            return Ok(());
        }

        let field = if self.at(&["MedlineCitation", "PMID"]) {
            Some(Field::Pmid)
        } else if self.at(&["Article", "ArticleTitle"]) {
            Some(Field::Title)
        } else if self.at(&["Article", "Journal", "Title"]) {
            Some(Field::Journal)
        } else if self.at(&["Journal", "ISOAbbreviation"]) {
            Some(Field::JournalAbbreviation)
        } else if self.at(&["JournalIssue", "Volume"]) {
            Some(Field::Volume)
        } else if self.at(&["JournalIssue", "Issue"]) {
            Some(Field::Issue)
        } else if self.at(&["JournalIssue", "PubDate", "Year"]) {
            Some(Field::Year)
        } else if self.at(&["JournalIssue", "PubDate", "Month"]) {
            Some(Field::Month)
        } else if self.at(&["JournalIssue", "PubDate", "Day"]) {
            Some(Field::Day)
        } else if self.at(&["JournalIssue", "PubDate", "MedlineDate"]) {
            Some(Field::MedlineDate)
        } else if self.at(&["Pagination", "MedlinePgn"]) {
            Some(Field::Pages)
        } else if self.at(&["Article", "ELocationID"]) {
            is_attr(e, b"EIdType", "doi")?.then_some(Field::ElocationDoi)
        } else if self.at(&["Article", "Abstract", "AbstractText"]) {
            Some(Field::AbstractText)
        } else if self.at(&["Author", "LastName"]) {
            Some(Field::LastName)
        } else if self.at(&["Author", "ForeName"]) {
            Some(Field::ForeName)
        } else if self.at(&["Author", "Initials"]) {
            Some(Field::Initials)
        } else if self.at(&["Author", "CollectiveName"]) {
            Some(Field::CollectiveName)
        } else if self.at(&["KeywordList", "Keyword"]) {
            Some(Field::Keyword)
        } else if self.at(&["MeshHeading", "DescriptorName"]) {
            Some(Field::MeshTerm)
        } else if self.at(&["PublicationTypeList", "PublicationType"]) {
            Some(Field::PublicationType)
        } else if self.at(&["PubmedData", "ArticleIdList", "ArticleId"]) {
            match attribute(e, b"IdType")?.as_deref() {
                Some("doi") => Some(Field::ArticleIdDoi),
                Some("pmc") => Some(Field::ArticleIdPmc),
                _ => None,
            }
        } else {
            None
        };

        if let Some(field) = field {
            let label = if field == Field::AbstractText { attribute(e, b"Label")? } else { None };
            self.begin(field, label);
        }

        Ok(())
    }

    fn begin(&mut self, field: Field, label: Option<String>) {
        self.capture = Some(Capture { field, depth: self.stack.len(), label, buf: String::new() });
    }

    fn on_text(&mut self, text: &str) -> ClientResult<()> {
        if let Some(capture) = self.capture.as_mut() {
            capture.buf.push_str(text);
        } else if self.stack.is_empty() && !text.trim().is_empty() {
            return Err(ClientError::malformed("text outside of the root element"));
        }
        Ok(())
    }

    fn on_end(&mut self) {
        let depth = self.stack.len();

        if self.capture.as_ref().is_some_and(|c| c.depth == depth) {
            if let Some(capture) = self.capture.take() {
                let text = normalize(&capture.buf);
                if !text.is_empty() {
                    self.finish_capture(capture.field, capture.label, text);
                }
            }
            return;
        }

        if self.at(&["AuthorList", "Author"]) {
            if let Some(article) = self.article.as_mut() {
                if let Some(author) = article.author.take().filter(|a| !a.is_empty()) {
                    article.record.authors.push(author);
                }
            }
        } else if self.at(&["PubmedArticle"]) {
            if let Some(article) = self.article.take() {
                self.records.push(article.finish());
            }
        }
    }

    fn finish_capture(&mut self, field: Field, label: Option<String>, text: String) {
        if field == Field::Error {
            set_once(&mut self.api_error, text);
        } else if let Some(article) = self.article.as_mut() {
            article.store(field, label, text);
        }
    }
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> ClientResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == key {
            let value = attr.unescape_value()?;
            return Ok(Some(value.trim().to_string()).filter(|v| !v.is_empty()));
        }
    }
    Ok(None)
}

fn is_attr(e: &BytesStart<'_>, key: &[u8], expected: &str) -> ClientResult<bool> {
    Ok(attribute(e, key)?.is_some_and(|v| v.eq_ignore_ascii_case(expected)))
}

fn set_once(slot: &mut Option<String>, value: String) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
