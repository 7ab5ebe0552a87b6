//! Boolean full-text and exact-match search index on Redis sorted sets

pub mod config;
pub mod error;
pub mod search;
pub mod state;

pub use error::{AppError, Result};
pub use search::{count, Document, MatchMode, Search, SearchError, SearchQuery};
