//! Boolean full-text and exact-match search over a sorted-set store
//!
//! Documents are flat maps of field to value. One configurable field is free text;
//! every other field is matched by exact value. All index state lives in the store
//! as sorted sets and sets under one namespace:
//!
//! ```text
//! {ns}:{field}:{value}:id      sorted set of doc ids holding an exact value
//! {ns}:{field}:{class}:id      sorted set of doc ids holding a phonetic class
//! {ns}:id:{doc}:{field}        values/classes indexed for one document field
//! {ns}:id:{doc}:indices        fields indexed for one document
//! {ns}:ids                     every doc id ever indexed
//! {ns}:{field}:temp            per-field query aggregate (trimmed after use)
//! {ns}:tempFinal               cross-field query aggregate (trimmed after use)
//! ```
//!
//! Free text is split into words, stripped of English stop words, stemmed and folded
//! to a Metaphone class, so "rubies" finds "ruby". Queries combine fields with AND;
//! list values combine with OR; free-text terms combine with AND or OR depending on
//! the match mode. Every query runs as a single atomic batch.
//!
//! # Example
//!
//! ```no_run
//! use zset_search::search::{Document, Search, SearchQuery};
//! use zset_search::state::create_in_memory_store;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let search = Search::create("posts", create_in_memory_store())?;
//!
//!     let doc = Document::new()
//!         .field("content", "ruby emerald")
//!         .field("uid", 5);
//!     search.index(&doc, 1).await?;
//!
//!     let query = SearchQuery::new().with_text("content", "emerald").with_value("uid", 5);
//!     let ids = search.query(&query, 0, -1).await?;
//!     println!("{:?}", ids);
//!
//!     Ok(())
//! }
//! ```

mod analysis;
mod config;
mod document;
mod error;
mod keys;
pub mod metrics;
mod phonetic;
mod porter;
mod query;
mod remover;
mod service;
mod writer;

pub use analysis::{Normalizer, TermFrequency};
pub use config::{SearchConfig, SearchConfigBuilder};
pub use document::{DocId, Document, FieldValue, Scalar};
pub use error::{SearchError, SearchResult};
pub use keys::KeyScheme;
pub use phonetic::metaphone;
pub use query::{MatchMode, QueryPlan, QueryPlanner, QueryTerm, SearchQuery};
pub use remover::IndexRemover;
pub use service::{count, Search};
pub use writer::IndexWriter;
