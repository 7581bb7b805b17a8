//! PubMed MCP Server
//!
//! A Model Context Protocol (MCP) server for PubMed, backed by the NCBI
//! E-utilities API. Lets LLM agents search the biomedical literature and
//! pull full article metadata (title, authors, journal, abstract, DOI).
//!
//! # Features
//!
//! - **2 MCP Tools**: `search_pubmed`, `fetch_paper_details`
//! - **Async-first**: Built on Tokio
//! - **Rate-limited**: Respects NCBI request limits (3 req/s, 10 with a key)
//! - **Cached**: 5-minute TTL cache reduces API calls
//!
//! # Example
//!
//! ```no_run
//! use pubmed_mcp::{client::PubMedClient, config::Config, query::SearchQuery};
//! use pubmed_mcp::models::SortOrder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = PubMedClient::new(config)?;
//!
//!     let term = SearchQuery::new().keywords(["crispr"]).build()?;
//!     let hits = client.search(&term, 5, 0, SortOrder::Relevance).await?;
//!     let records = client.fetch_articles(&hits.idlist).await?;
//!     println!("{} records", records.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod formatters;
pub mod models;
pub mod parser;
pub mod query;
pub mod server;
pub mod tools;

pub use client::PubMedClient;
pub use config::Config;
pub use error::{ClientError, ToolError};
