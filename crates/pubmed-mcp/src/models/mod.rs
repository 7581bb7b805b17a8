//! Data models for PubMed records and tool parameters.
//!
//! Records use `Option` for every field the source payload may omit;
//! E-utilities JSON wrappers use `#[serde(default)]` throughout.

mod enums;
mod inputs;
mod paper;
mod search;

pub use enums::{ResponseFormat, SortOrder};
pub use inputs::*;
pub use paper::{AbstractSection, Author, PaperRecord, PublicationDate};
pub use search::{ESearchResponse, ESearchResult};
