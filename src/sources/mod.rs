//! Article sources.
//!
//! A [`Source`] answers the three questions the application asks of a paper
//! index: search, look up one article, list recent articles. [`ArxivSource`]
//! talks to the arXiv query API; [`MockSource`] serves canned feeds for
//! tests and offline use.

mod arxiv;
pub mod mock;

pub use arxiv::ArxivSource;
pub use mock::MockSource;

use async_trait::async_trait;

use crate::feed::FeedError;
use crate::models::{ArticleRecord, FeedResult, SearchParams};

#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g. "arxiv")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Search for articles matching the parameters
    async fn search(&self, params: &SearchParams) -> Result<FeedResult, SourceError>;

    /// Fetch exactly one article by identifier
    async fn get_by_id(&self, id: &str) -> Result<ArticleRecord, SourceError>;

    /// Most recently updated articles, optionally limited to categories
    async fn recent(
        &self,
        categories: &[String],
        max_results: usize,
    ) -> Result<FeedResult, SourceError>;

    /// Validate that an identifier is correctly formatted for this source
    fn validate_id(&self, _id: &str) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Connection failure or broken response stream
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    /// HTTP 429, with the server's retry-after hint in seconds
    #[error("Rate limit exceeded")]
    RateLimit(Option<u64>),

    /// HTTP 5xx
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Unexpected non-success response
    #[error("API error: {0}")]
    Api(String),

    /// The API rejected the request (bad id, bad query syntax)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Article not found: {0}")]
    NotFound(String),

    /// Response body could not be decoded
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else {
            SourceError::Network(err.to_string())
        }
    }
}
