//! Core data models for articles, searches, insights and discussions.

mod article;
mod discussion;
mod insight;
mod search;

pub use article::{ArticleRecord, Author, Category, DroppedEntry, FeedResult, Link};
pub use discussion::{Comment, Reply};
pub use insight::{AiInsight, InsightOrigin};
pub use search::{SearchParams, SortBy, SortOrder, MAX_RESULTS_LIMIT};
