use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CommentStore, StoreError, Threads};
use crate::models::{Comment, Reply};

/// Comment store that lives for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryCommentStore {
    threads: RwLock<Threads>,
}

impl MemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn add_comment(
        &self,
        article_id: &str,
        username: &str,
        message: &str,
    ) -> Result<Comment, StoreError> {
        self.threads
            .write()
            .await
            .add_comment(article_id, username, message)
    }

    async fn list_comments(&self, article_id: &str) -> Result<Vec<Comment>, StoreError> {
        Ok(self.threads.read().await.list(article_id))
    }

    async fn add_reply(
        &self,
        article_id: &str,
        comment_id: &str,
        username: &str,
        message: &str,
    ) -> Result<Reply, StoreError> {
        self.threads
            .write()
            .await
            .add_reply(article_id, comment_id, username, message)
    }
}
