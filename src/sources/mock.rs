//! Mock source for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::models::{ArticleRecord, FeedResult, SearchParams};
use crate::sources::{Source, SourceError};

#[derive(Debug, Default)]
struct MockState {
    feed: Option<FeedResult>,
    articles: HashMap<String, ArticleRecord>,
    failure: Option<String>,
}

/// A mock source that serves a canned feed and articles by id.
#[derive(Debug, Default)]
pub struct MockSource {
    state: Mutex<MockState>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the feed returned by `search` and `recent`.
    ///
    /// Its entries also become available to `get_by_id`.
    pub fn set_feed(&self, feed: FeedResult) {
        let mut state = self.lock();
        for entry in &feed.entries {
            state
                .articles
                .insert(entry.arxiv_id().to_string(), entry.clone());
        }
        state.feed = Some(feed);
    }

    /// Make an article available to `get_by_id`
    pub fn add_article(&self, article: ArticleRecord) {
        self.lock()
            .articles
            .insert(article.arxiv_id().to_string(), article);
    }

    /// Fail every call with a network error until cleared
    pub fn fail_with(&self, message: impl Into<String>) {
        self.lock().failure = Some(message.into());
    }

    pub fn clear_failure(&self) {
        self.lock().failure = None;
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_failure(&self) -> Result<(), SourceError> {
        match &self.lock().failure {
            Some(message) => Err(SourceError::Network(message.clone())),
            None => Ok(()),
        }
    }

    fn feed(&self) -> FeedResult {
        self.lock().feed.clone().unwrap_or_else(FeedResult::empty)
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn search(&self, _params: &SearchParams) -> Result<FeedResult, SourceError> {
        self.check_failure()?;
        Ok(self.feed())
    }

    async fn get_by_id(&self, id: &str) -> Result<ArticleRecord, SourceError> {
        self.check_failure()?;
        self.lock()
            .articles
            .get(id.trim())
            .cloned()
            .ok_or_else(|| SourceError::NotFound(id.to_string()))
    }

    async fn recent(
        &self,
        _categories: &[String],
        max_results: usize,
    ) -> Result<FeedResult, SourceError> {
        self.check_failure()?;
        let mut feed = self.feed();
        feed.entries.truncate(max_results);
        Ok(feed)
    }
}
