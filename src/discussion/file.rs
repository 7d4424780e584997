//! Comment threads persisted as a single JSON document.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{CommentStore, StoreError, Threads};
use crate::models::{Comment, Reply};

const COMMENTS_FILE: &str = "comments.json";

/// Comment store backed by a JSON file.
///
/// Every operation reads the file, so several stores pointing at the same
/// path see each other's writes. Writes within one store are serialised and
/// replace the file atomically.
#[derive(Debug)]
pub struct FileCommentStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCommentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store `comments.json` inside a data directory
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(COMMENTS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Threads, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Threads::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Threads::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, threads: &Threads) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(threads)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn update<T>(
        &self,
        change: impl FnOnce(&mut Threads) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut threads = self.load().await?;
        let result = change(&mut threads)?;
        self.save(&threads).await?;
        Ok(result)
    }
}

#[async_trait]
impl CommentStore for FileCommentStore {
    async fn add_comment(
        &self,
        article_id: &str,
        username: &str,
        message: &str,
    ) -> Result<Comment, StoreError> {
        let comment = self
            .update(|threads| threads.add_comment(article_id, username, message))
            .await?;
        tracing::debug!(article = %comment.article_id, id = %comment.id, "Saved comment");
        Ok(comment)
    }

    async fn list_comments(&self, article_id: &str) -> Result<Vec<Comment>, StoreError> {
        Ok(self.load().await?.list(article_id))
    }

    async fn add_reply(
        &self,
        article_id: &str,
        comment_id: &str,
        username: &str,
        message: &str,
    ) -> Result<Reply, StoreError> {
        self.update(|threads| threads.add_reply(article_id, comment_id, username, message))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_persists_across_instances() {
        let dir = tempdir().unwrap();
        let store = FileCommentStore::in_dir(&dir.path().join("data"));

        let comment = store.add_comment("2301.1", "ada", "hello").await.unwrap();
        store
            .add_reply("2301.1", &comment.id, "alan", "hi ada")
            .await
            .unwrap();

        let reopened = FileCommentStore::in_dir(&dir.path().join("data"));
        let comments = reopened.list_comments("2301.1").await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].message, "hello");
        assert_eq!(comments[0].replies[0].message, "hi ada");
        assert_eq!(comments[0].replies[0].username, "alan");
    }

    #[tokio::test]
    async fn test_missing_and_empty_file() {
        let dir = tempdir().unwrap();
        let store = FileCommentStore::new(dir.path().join("comments.json"));
        assert!(store.list_comments("2301.1").await.unwrap().is_empty());

        std::fs::write(store.path(), "\n").unwrap();
        assert!(store.list_comments("2301.1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let store = FileCommentStore::new(dir.path().join("comments.json"));
        std::fs::write(store.path(), "{not json").unwrap();

        assert!(matches!(
            store.list_comments("2301.1").await,
            Err(StoreError::Serialize(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_change_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let store = FileCommentStore::new(dir.path().join("comments.json"));

        let result = store.add_reply("2301.1", "nope", "ada", "hi").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(!store.path().exists());
    }
}
