//! Per-article discussion threads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reply to a top-level comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    pub article_id: String,
    pub message: String,
    pub username: String,
    pub timestamp: DateTime<Utc>,
}

/// A top-level comment on an article with its replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub article_id: String,
    pub message: String,
    pub username: String,
    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl Comment {
    pub fn reply_count(&self) -> usize {
        self.replies.len()
    }
}
