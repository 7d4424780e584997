//! Mapping from the element tree to [`FeedResult`].

use crate::models::{ArticleRecord, Author, Category, DroppedEntry, FeedResult, Link};

use super::tree::{self, Element};
use super::FeedError;

/// Why a single entry could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryError {
    #[error("entry has no id")]
    MissingId,
}

/// Decode an arXiv Atom document into a [`FeedResult`].
///
/// Entries keep document order. An entry without an id is dropped and
/// reported in [`FeedResult::dropped`]; the rest of the feed still decodes.
/// Only input that is not well-formed XML fails, with
/// [`FeedError::Malformed`].
pub fn decode_feed(xml: &str) -> Result<FeedResult, FeedError> {
    let root = tree::parse(xml)?;

    let mut entries = Vec::new();
    let mut dropped = Vec::new();

    for (position, element) in root.children_named("entry").enumerate() {
        match decode_entry(element) {
            Ok(record) => entries.push(record),
            Err(reason) => {
                tracing::warn!(position, %reason, "Dropping feed entry");
                dropped.push(DroppedEntry {
                    position,
                    reason: reason.to_string(),
                });
            }
        }
    }

    let total_results = count(&root, "totalResults").unwrap_or(entries.len());
    let start_index = count(&root, "startIndex").unwrap_or(0);
    let items_per_page = count(&root, "itemsPerPage").unwrap_or(entries.len());

    tracing::debug!(
        entries = entries.len(),
        dropped = dropped.len(),
        total_results,
        "Decoded feed"
    );

    Ok(FeedResult {
        entries,
        total_results,
        start_index,
        items_per_page,
        dropped,
    })
}

/// Build one record from an `<entry>` element
pub(crate) fn decode_entry(entry: &Element) -> Result<ArticleRecord, EntryError> {
    let id = entry.child_text("id").ok_or(EntryError::MissingId)?;

    let authors: Vec<Author> = entry.children_named("author").filter_map(author).collect();
    let categories: Vec<Category> = entry.children_named("category").filter_map(category).collect();
    let links: Vec<Link> = entry.children_named("link").filter_map(link).collect();

    let primary_category = entry
        .child("primary_category")
        .and_then(category)
        .or_else(|| categories.first().cloned());

    Ok(ArticleRecord {
        id,
        title: collapse_whitespace(&entry.child_text("title").unwrap_or_default()),
        summary: entry.child_text("summary").unwrap_or_default(),
        published: entry.child_text("published").unwrap_or_default(),
        updated: entry.child_text("updated").unwrap_or_default(),
        authors,
        categories,
        primary_category,
        links,
        doi: entry.child_text("doi"),
        journal_ref: entry.child_text("journal_ref").map(|j| collapse_whitespace(&j)),
        comment: entry.child_text("comment").map(|c| collapse_whitespace(&c)),
    })
}

fn author(element: &Element) -> Option<Author> {
    let name = element.child_text("name")?;
    Some(Author {
        name: collapse_whitespace(&name),
        affiliation: element.child_text("affiliation"),
    })
}

fn category(element: &Element) -> Option<Category> {
    Some(Category {
        term: element.non_empty_attr("term")?,
        scheme: element.non_empty_attr("scheme"),
        label: element.non_empty_attr("label"),
    })
}

fn link(element: &Element) -> Option<Link> {
    let href = element.non_empty_attr("href")?;
    Some(Link {
        href,
        // Atom: a link without rel is an alternate link
        rel: element
            .non_empty_attr("rel")
            .unwrap_or_else(|| "alternate".to_string()),
        title: element.non_empty_attr("title"),
        link_type: element.non_empty_attr("type"),
    })
}

fn count(root: &Element, name: &str) -> Option<usize> {
    root.child_text(name).and_then(|v| v.parse().ok())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
