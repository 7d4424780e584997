//! # Scholarly
//!
//! Backend of an academic-paper discovery tool built around the arXiv query
//! API.
//!
//! ## Architecture
//!
//! - [`feed`]: decoder turning arXiv Atom responses into article records
//! - [`sources`]: the [`Source`] trait and the arXiv client
//! - [`insights`]: AI summaries and key findings with a templated fallback
//! - [`discussion`]: per-article comment threads
//! - [`library`]: the service layer the views call into
//! - [`models`]: core data structures
//! - [`utils`]: HTTP client, retry, and terminal rendering
//! - [`config`]: configuration management

pub mod config;
pub mod discussion;
pub mod feed;
pub mod insights;
pub mod library;
pub mod models;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use feed::{decode_feed, FeedError};
pub use library::{ArticlePage, Library, LibraryError};
pub use models::{ArticleRecord, FeedResult};
pub use sources::{ArxivSource, Source, SourceError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
