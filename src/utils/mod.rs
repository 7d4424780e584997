//! Utility modules supporting the clients and the CLI.
//!
//! - [`HttpClient`]: HTTP client with request pacing
//! - [`RetryConfig`] / [`with_retry`]: retry with exponential backoff on transient errors
//! - [`feed_table`], [`article_details`], ...: terminal rendering
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use scholarly::sources::SourceError;
//! use scholarly::utils::{with_retry, RetryConfig};
//!
//! # async fn fetch_data() -> Result<String, SourceError> { Ok("data".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), SourceError> {
//! let config = RetryConfig::default().max_attempts(3);
//! let result = with_retry(config, || fetch_data()).await?;
//! # Ok(())
//! # }
//! ```

mod display;
mod http;
mod retry;

pub use display::{
    article_details, comments_table, feed_table, insight_details, is_terminal,
    truncate_with_ellipsis,
};
pub use http::{HttpClient, RateLimitedRequestBuilder};
pub use retry::{with_retry, RetryConfig, TransientError};
