//! Service layer behind the search, home and article views.
//!
//! [`Library`] wires an article [`Source`], a [`CommentStore`] and an optional
//! [`TextGenerator`] together. Failures are logged with their technical
//! detail and returned as a [`LibraryError`] whose
//! [`user_message`](LibraryError::user_message) is safe to show to a reader.

use serde::Serialize;
use std::sync::Arc;

use crate::discussion::{CommentStore, StoreError};
use crate::insights::{fallback_insight, generate_insight, TextGenerator};
use crate::models::{AiInsight, ArticleRecord, Comment, FeedResult, Reply, SearchParams};
use crate::sources::{ArxivSource, Source, SourceError};

/// Errors surfaced to the views
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("Loading articles failed: {0}")]
    Articles(#[source] SourceError),

    #[error("Loading article failed: {0}")]
    Article(#[source] SourceError),

    #[error("Article not found: {0}")]
    NotFound(String),

    #[error("Loading comments failed: {0}")]
    Comments(#[source] StoreError),

    #[error("Saving comment failed: {0}")]
    SaveComment(#[source] StoreError),
}

impl LibraryError {
    /// Short message for the reader; details stay in the logs
    pub fn user_message(&self) -> &'static str {
        match self {
            LibraryError::Articles(_) => "failed to load articles",
            LibraryError::Article(_) | LibraryError::Comments(_) => "failed to load article",
            LibraryError::NotFound(_) => "article not found",
            LibraryError::SaveComment(_) => "failed to save comment",
        }
    }
}

/// Everything the article view shows besides the insight
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticlePage {
    pub article: ArticleRecord,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone)]
pub struct Library {
    source: Arc<dyn Source>,
    comments: Arc<dyn CommentStore>,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl Library {
    pub fn new(source: Arc<dyn Source>, comments: Arc<dyn CommentStore>) -> Self {
        Self {
            source,
            comments,
            generator: None,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn source(&self) -> &dyn Source {
        self.source.as_ref()
    }

    /// Search results page
    pub async fn search(&self, params: &SearchParams) -> Result<FeedResult, LibraryError> {
        self.source.search(params).await.map_err(|e| {
            tracing::error!(query = %params.search_query, error = %e, "Search failed");
            LibraryError::Articles(e)
        })
    }

    /// Home page: most recently updated articles
    pub async fn home(
        &self,
        categories: &[String],
        max_results: usize,
    ) -> Result<FeedResult, LibraryError> {
        self.source
            .recent(categories, max_results)
            .await
            .map_err(|e| {
                tracing::error!(?categories, error = %e, "Loading recent articles failed");
                LibraryError::Articles(e)
            })
    }

    /// Article page: the record and its discussion.
    ///
    /// Comments are keyed by the unversioned arXiv id of the record.
    pub async fn article_page(&self, id: &str) -> Result<ArticlePage, LibraryError> {
        let article = match self.source.get_by_id(id).await {
            Ok(article) => article,
            Err(SourceError::NotFound(missing)) => {
                tracing::info!(id = %missing, "Article not found");
                return Err(LibraryError::NotFound(missing));
            }
            Err(e) => {
                tracing::error!(id, error = %e, "Loading article failed");
                return Err(LibraryError::Article(e));
            }
        };

        let comments = self
            .comments
            .list_comments(&thread_key(article.arxiv_id()))
            .await
            .map_err(|e| {
                tracing::error!(id, error = %e, "Loading comments failed");
                LibraryError::Comments(e)
            })?;

        Ok(ArticlePage { article, comments })
    }

    /// Insight for an article. Never fails; without a generator the templated
    /// fallback is returned.
    pub async fn insight(&self, article: &ArticleRecord) -> AiInsight {
        match &self.generator {
            Some(generator) => generate_insight(article, generator.as_ref()).await,
            None => fallback_insight(article),
        }
    }

    pub async fn post_comment(
        &self,
        article_id: &str,
        username: &str,
        message: &str,
    ) -> Result<Comment, LibraryError> {
        self.comments
            .add_comment(&thread_key(article_id), username, message)
            .await
            .map_err(|e| {
                tracing::error!(article_id, error = %e, "Saving comment failed");
                LibraryError::SaveComment(e)
            })
    }

    pub async fn post_reply(
        &self,
        article_id: &str,
        comment_id: &str,
        username: &str,
        message: &str,
    ) -> Result<Reply, LibraryError> {
        self.comments
            .add_reply(&thread_key(article_id), comment_id, username, message)
            .await
            .map_err(|e| {
                tracing::error!(article_id, comment_id, error = %e, "Saving reply failed");
                LibraryError::SaveComment(e)
            })
    }

    /// Comments for an article, newest first
    pub async fn comments(&self, article_id: &str) -> Result<Vec<Comment>, LibraryError> {
        self.comments
            .list_comments(&thread_key(article_id))
            .await
            .map_err(|e| {
                tracing::error!(article_id, error = %e, "Loading comments failed");
                LibraryError::Comments(e)
            })
    }
}

/// Key of an article's comment thread. All versions and spellings of an
/// arXiv id share one thread; anything else is only trimmed.
fn thread_key(article_id: &str) -> String {
    ArxivSource::base_id(article_id).unwrap_or_else(|_| article_id.trim().to_string())
}
