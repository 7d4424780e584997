//! AI summaries and key findings for articles.
//!
//! [`generate_insight`] asks a [`TextGenerator`] for a summary and a list of
//! key findings. Generation is best effort: any failure is logged and a
//! templated [`fallback_insight`] built from the article metadata is returned
//! instead.

mod gemini;
mod text;

pub use gemini::GeminiClient;
pub use text::{clean_markdown, extract_key_points};

use async_trait::async_trait;

use crate::models::{AiInsight, ArticleRecord, InsightOrigin};

/// Errors from a text-generation backend
#[derive(Debug, thiserror::Error)]
pub enum InsightError {
    #[error("Text generation is not configured (no API key)")]
    NotConfigured,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Generation API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    BadResponse(String),

    #[error("Model returned no text")]
    EmptyOutput,
}

impl From<reqwest::Error> for InsightError {
    fn from(err: reqwest::Error) -> Self {
        InsightError::Request(err.without_url().to_string())
    }
}

/// A backend that turns a prompt into text
#[async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    async fn generate(&self, prompt: &str) -> Result<String, InsightError>;
}

fn article_context(article: &ArticleRecord) -> String {
    format!(
        "Title: {}\nAuthors: {}\nCategory: {}\nAbstract: {}",
        article.title,
        article.author_names().join(", "),
        primary_term(article),
        article.summary
    )
}

pub fn summary_prompt(article: &ArticleRecord) -> String {
    format!(
        "Please provide a comprehensive summary of this research paper:\n\n{}",
        article_context(article)
    )
}

pub fn key_points_prompt(article: &ArticleRecord) -> String {
    format!(
        "Please extract the key points, contributions, and main findings from this research paper:\n\n{}",
        article_context(article)
    )
}

/// Generate an insight, falling back to a template when generation fails
pub async fn generate_insight(article: &ArticleRecord, generator: &dyn TextGenerator) -> AiInsight {
    let summary_prompt = summary_prompt(article);
    let key_points_prompt = key_points_prompt(article);

    let generated = tokio::try_join!(
        generator.generate(&summary_prompt),
        generator.generate(&key_points_prompt)
    );

    match generated {
        Ok((summary, key_points)) => AiInsight {
            summary: clean_markdown(&summary),
            key_findings: extract_key_points(&key_points),
            pdf_link: pdf_href(article),
            origin: InsightOrigin::Model,
        },
        Err(e) => {
            tracing::warn!(
                article = %article.arxiv_id(),
                error = %e,
                "Insight generation failed, using fallback"
            );
            fallback_insight(article)
        }
    }
}

/// Templated insight built only from article metadata
pub fn fallback_insight(article: &ArticleRecord) -> AiInsight {
    let authors = match article.author_names().as_slice() {
        [] => "unknown authors".to_string(),
        names => names.join(", "),
    };
    let field = primary_term(article);

    let summary = format!(
        "This paper by {} explores {}. The research is in the field of {} and presents \
         contributions through its methodology and empirical validation. The authors analyse \
         the problem domain and discuss potential applications.",
        authors,
        article.title.to_lowercase(),
        field
    );

    let key_findings = vec![
        format!(
            "The research focuses on {} applications with potential real-world impact.",
            field
        ),
        "The authors employ new techniques to address limitations in existing approaches."
            .to_string(),
        "The methodology is evaluated against current methods.".to_string(),
        "The work points to directions for future research in this domain.".to_string(),
    ];

    AiInsight {
        summary,
        key_findings,
        pdf_link: pdf_href(article),
        origin: InsightOrigin::Fallback,
    }
}

fn primary_term(article: &ArticleRecord) -> &str {
    article
        .primary_category
        .as_ref()
        .map(|c| c.term.as_str())
        .unwrap_or("an unspecified field")
}

fn pdf_href(article: &ArticleRecord) -> Option<String> {
    article.pdf_link().map(|link| link.href.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, Category, Link};

    #[derive(Debug)]
    struct Scripted {
        summary: Result<&'static str, ()>,
        points: &'static str,
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, prompt: &str) -> Result<String, InsightError> {
            if prompt.starts_with("Please provide a comprehensive summary") {
                self.summary
                    .map(str::to_string)
                    .map_err(|_| InsightError::EmptyOutput)
            } else {
                Ok(self.points.to_string())
            }
        }
    }

    fn article() -> ArticleRecord {
        let mut article = ArticleRecord::new("http://arxiv.org/abs/2301.12345v1");
        article.title = "Graph Neural Networks".to_string();
        article.summary = "We study GNNs.".to_string();
        article.authors = vec![Author::new("Ada Lovelace"), Author::new("Alan Turing")];
        article.primary_category = Some(Category::new("cs.LG"));
        article.links = vec![
            Link::new("http://arxiv.org/abs/2301.12345v1", "alternate"),
            Link::new("http://arxiv.org/pdf/2301.12345v1", "related").title("pdf"),
        ];
        article
    }

    #[test]
    fn test_prompts_carry_metadata() {
        let prompt = summary_prompt(&article());
        assert!(prompt.contains("Title: Graph Neural Networks"));
        assert!(prompt.contains("Authors: Ada Lovelace, Alan Turing"));
        assert!(prompt.contains("Category: cs.LG"));
        assert!(prompt.contains("Abstract: We study GNNs."));
        assert!(key_points_prompt(&article()).starts_with("Please extract the key points"));
    }

    #[tokio::test]
    async fn test_generate_insight_from_model() {
        let generator = Scripted {
            summary: Ok("## Overview\nThe paper **studies**\nGNNs."),
            points: "- scales to large graphs\n- beats baselines",
        };
        let insight = generate_insight(&article(), &generator).await;

        assert_eq!(insight.origin, InsightOrigin::Model);
        assert_eq!(insight.summary, "Overview\n\nThe paper studies GNNs.");
        assert_eq!(
            insight.key_findings,
            vec!["Scales to large graphs.", "Beats baselines."]
        );
        assert_eq!(
            insight.pdf_link.as_deref(),
            Some("http://arxiv.org/pdf/2301.12345v1")
        );
    }

    #[tokio::test]
    async fn test_generate_insight_falls_back() {
        let generator = Scripted {
            summary: Err(()),
            points: "- unused\n- unused",
        };
        let insight = generate_insight(&article(), &generator).await;

        assert_eq!(insight.origin, InsightOrigin::Fallback);
        assert_eq!(insight, fallback_insight(&article()));
    }

    #[test]
    fn test_fallback_insight() {
        let insight = fallback_insight(&article());
        assert!(insight
            .summary
            .starts_with("This paper by Ada Lovelace, Alan Turing explores graph neural networks."));
        assert_eq!(insight.key_findings.len(), 4);
        assert!(insight.key_findings[0].contains("cs.LG"));
        assert!(insight.pdf_link.is_some());

        let bare = fallback_insight(&ArticleRecord::new("x"));
        assert!(bare.summary.contains("unknown authors"));
        assert!(bare.pdf_link.is_none());
    }
}
