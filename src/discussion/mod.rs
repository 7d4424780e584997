//! Per-article comment threads.
//!
//! A thread is a list of top-level [`Comment`]s, each carrying its
//! [`Reply`]s. Listing returns comments newest first and replies in the order
//! they were posted.

mod file;
mod memory;

pub use file::FileCommentStore;
pub use memory::MemoryCommentStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::{Comment, Reply};

/// Comment store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Comment not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[async_trait]
pub trait CommentStore: Send + Sync + std::fmt::Debug {
    /// Post a top-level comment on an article
    async fn add_comment(
        &self,
        article_id: &str,
        username: &str,
        message: &str,
    ) -> Result<Comment, StoreError>;

    /// All comments on an article, newest first
    async fn list_comments(&self, article_id: &str) -> Result<Vec<Comment>, StoreError>;

    /// Reply to an existing comment
    async fn add_reply(
        &self,
        article_id: &str,
        comment_id: &str,
        username: &str,
        message: &str,
    ) -> Result<Reply, StoreError>;
}

/// Comment threads keyed by article id, in posting order
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct Threads {
    #[serde(default)]
    articles: BTreeMap<String, Vec<Comment>>,
}

impl Threads {
    pub(crate) fn add_comment(
        &mut self,
        article_id: &str,
        username: &str,
        message: &str,
    ) -> Result<Comment, StoreError> {
        let article_id = required("article id", article_id)?;
        let username = required("username", username)?;
        let message = required("message", message)?;

        let timestamp = Utc::now();
        let comment = Comment {
            id: new_id(article_id, username, message, timestamp),
            article_id: article_id.to_string(),
            message: message.to_string(),
            username: username.to_string(),
            timestamp,
            replies: Vec::new(),
        };

        self.articles
            .entry(article_id.to_string())
            .or_default()
            .push(comment.clone());
        Ok(comment)
    }

    pub(crate) fn add_reply(
        &mut self,
        article_id: &str,
        comment_id: &str,
        username: &str,
        message: &str,
    ) -> Result<Reply, StoreError> {
        let article_id = required("article id", article_id)?;
        let comment_id = required("comment id", comment_id)?;
        let username = required("username", username)?;
        let message = required("message", message)?;

        let comment = self
            .articles
            .get_mut(article_id)
            .and_then(|comments| comments.iter_mut().find(|c| c.id == comment_id))
            .ok_or_else(|| StoreError::NotFound(comment_id.to_string()))?;

        let timestamp = Utc::now();
        let reply = Reply {
            id: new_id(comment_id, username, message, timestamp),
            article_id: article_id.to_string(),
            message: message.to_string(),
            username: username.to_string(),
            timestamp,
        };
        comment.replies.push(reply.clone());
        Ok(reply)
    }

    /// Comments newest first, each with its replies oldest first. Equal
    /// timestamps keep the later post first.
    pub(crate) fn list(&self, article_id: &str) -> Vec<Comment> {
        let mut comments: Vec<Comment> = match self.articles.get(article_id.trim()) {
            Some(comments) => comments.iter().rev().cloned().collect(),
            None => return Vec::new(),
        };
        comments.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        for comment in &mut comments {
            comment.replies.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        }
        comments
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, StoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StoreError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(value)
}

/// Content-derived id, unique within the process
fn new_id(parent: &str, username: &str, message: &str, timestamp: DateTime<Utc>) -> String {
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let seed = format!(
        "{}\n{}\n{}\n{}\n{}",
        parent,
        username,
        message,
        timestamp.to_rfc3339(),
        sequence
    );
    format!("{:x}", md5::compute(seed.as_bytes()))
}
