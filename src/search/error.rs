//! Error types for search operations

use crate::error::AppError;

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Namespace missing or empty
    #[error("A search index requires a namespace")]
    MissingNamespace,

    /// Document id missing or empty
    #[error("A document id is required")]
    MissingDocumentId,

    /// Query could not be built from its input
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Document indexing failed
    #[error("Document indexing failed: {0}")]
    IndexingFailed(String),

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Document removal failed
    #[error("Document removal failed: {0}")]
    RemovalFailed(String),

    /// Store access outside of index/query/remove failed
    #[error("Store error: {0}")]
    StoreError(String),
}

impl SearchError {
    /// True for errors raised before any store interaction
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SearchError::MissingNamespace
                | SearchError::MissingDocumentId
                | SearchError::InvalidQuery(_)
        )
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::MissingNamespace
            | SearchError::MissingDocumentId
            | SearchError::InvalidQuery(_) => {
                AppError::Validation(err.to_string())
            }
            _ => AppError::Store(err.to_string()),
        }
    }
}
