use thiserror::Error;

/// A query field was outside its allowed range.
///
/// Raised at construction time, before any browser interaction happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} must be between 0 and 100, got {value}")]
pub struct ValidationError {
    pub field: &'static str,
    pub value: u8,
}

/// Errors that cross the crate boundary.
///
/// Only query validation and session acquisition can fail a search; every
/// interaction or extraction problem downstream degrades to a partial or
/// empty result instead.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("invalid query: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),
}

pub type SearchResult<T> = Result<T, SearchError>;
