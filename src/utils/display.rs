//! Terminal rendering for feeds, articles and discussions.

use comfy_table::{Attribute, Cell, Table};
use std::fmt::Write;
use std::io::IsTerminal;

use crate::models::{AiInsight, ArticleRecord, Comment, FeedResult};

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Truncate text to at most `max_width` characters, appending `...` when cut.
///
/// ```
/// use scholarly::utils::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
/// assert_eq!(truncate_with_ellipsis("Hi", 8), "Hi");
/// ```
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let kept: String = text.chars().take(max_width - 3).collect();
    format!("{}...", kept.trim_end())
}

/// Table of search results: id, title, first authors, primary category, year
pub fn feed_table(feed: &FeedResult) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["ID", "Title", "Authors", "Category", "Year"]);

    for article in &feed.entries {
        let year = article
            .published_at()
            .map(|d| d.format("%Y").to_string())
            .unwrap_or_default();

        table.add_row(vec![
            Cell::new(article.arxiv_id()),
            Cell::new(truncate_with_ellipsis(&article.title, 60)).add_attribute(Attribute::Bold),
            Cell::new(truncate_with_ellipsis(&authors_line(article), 30)),
            Cell::new(
                article
                    .primary_category
                    .as_ref()
                    .map(|c| c.term.as_str())
                    .unwrap_or(""),
            ),
            Cell::new(year),
        ]);
    }
    table
}

/// Table of comments, replies indented below their parent
pub fn comments_table(comments: &[Comment]) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["ID", "User", "When", "Message"]);

    for comment in comments {
        table.add_row(vec![
            Cell::new(&comment.id),
            Cell::new(&comment.username).add_attribute(Attribute::Bold),
            Cell::new(comment.timestamp.format("%Y-%m-%d %H:%M").to_string()),
            Cell::new(&comment.message),
        ]);
        for reply in &comment.replies {
            table.add_row(vec![
                Cell::new(format!("  ↳ {}", reply.id)),
                Cell::new(&reply.username),
                Cell::new(reply.timestamp.format("%Y-%m-%d %H:%M").to_string()),
                Cell::new(&reply.message),
            ]);
        }
    }
    table
}

/// Human-readable article detail block
pub fn article_details(article: &ArticleRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", article.title);
    let _ = writeln!(out, "{}", authors_line(article));
    let _ = writeln!(out);
    let _ = writeln!(out, "  arXiv:     {}", article.arxiv_id());
    if let Some(category) = &article.primary_category {
        let _ = writeln!(out, "  Category:  {}", category.term);
    }
    if !article.published.is_empty() {
        let _ = writeln!(out, "  Published: {}", article.published);
    }
    if let Some(link) = article.abstract_link() {
        let _ = writeln!(out, "  Abstract:  {}", link.href);
    }
    if let Some(link) = article.pdf_link() {
        let _ = writeln!(out, "  PDF:       {}", link.href);
    }
    if let Some(doi) = &article.doi {
        let _ = writeln!(out, "  DOI:       {}", doi);
    }
    if let Some(journal) = &article.journal_ref {
        let _ = writeln!(out, "  Journal:   {}", journal);
    }
    if let Some(comment) = &article.comment {
        let _ = writeln!(out, "  Comment:   {}", comment);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", article.summary);
    out
}

/// Human-readable insight block
pub fn insight_details(insight: &AiInsight) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Summary:");
    let _ = writeln!(out, "{}", insight.summary);
    let _ = writeln!(out);
    let _ = writeln!(out, "Key findings:");
    for finding in &insight.key_findings {
        let _ = writeln!(out, "  - {}", finding);
    }
    out
}

fn authors_line(article: &ArticleRecord) -> String {
    article.author_names().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, Category, Link};

    fn sample() -> ArticleRecord {
        let mut article = ArticleRecord::new("http://arxiv.org/abs/2301.12345v1");
        article.title = "A Very Long Title About Transformers".to_string();
        article.published = "2023-01-15T10:00:00Z".to_string();
        article.authors = vec![Author::new("Ada Lovelace"), Author::new("Alan Turing")];
        article.primary_category = Some(Category::new("cs.AI"));
        article.links = vec![Link::new("http://arxiv.org/pdf/2301.12345v1", "related").title("pdf")];
        article
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
        assert_eq!(truncate_with_ellipsis("Hello", 5), "Hello");
        assert_eq!(truncate_with_ellipsis("Hello", 2), "..");
        assert_eq!(truncate_with_ellipsis("Ünïcødé text here", 9), "Ünïcød...");
    }

    #[test]
    fn test_feed_table_contains_rows() {
        let feed = FeedResult::from_entries(vec![sample()]);
        let rendered = feed_table(&feed).to_string();
        assert!(rendered.contains("2301.12345v1"));
        assert!(rendered.contains("cs.AI"));
        assert!(rendered.contains("2023"));
    }

    #[test]
    fn test_article_details() {
        let rendered = article_details(&sample());
        assert!(rendered.contains("Ada Lovelace, Alan Turing"));
        assert!(rendered.contains("PDF:       http://arxiv.org/pdf/2301.12345v1"));
        assert!(!rendered.contains("DOI:"));
    }
}
