//! Article records decoded from arXiv Atom feeds.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// An author of an article, in the order listed on the paper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            affiliation: None,
        }
    }

    pub fn affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }
}

/// Subject classification attached to an article (e.g. `cs.AI`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub term: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Category {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            scheme: None,
            label: None,
        }
    }
}

/// A link attached to an entry (abstract page, PDF, DOI resolver, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,

    pub rel: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
}

impl Link {
    pub fn new(href: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: rel.into(),
            title: None,
            link_type: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn link_type(mut self, link_type: impl Into<String>) -> Self {
        self.link_type = Some(link_type.into());
        self
    }

    /// Whether this link points at the article PDF.
    ///
    /// Matches `title="pdf"`, `type="application/pdf"`, or an href ending in
    /// `.pdf` (case-insensitive).
    pub fn is_pdf(&self) -> bool {
        self.title.as_deref() == Some("pdf")
            || self.link_type.as_deref() == Some("application/pdf")
            || self.href.to_ascii_lowercase().ends_with(".pdf")
    }

    /// Whether this is the abstract (`rel="alternate"`) link
    pub fn is_alternate(&self) -> bool {
        self.rel == "alternate"
    }
}

/// A single article decoded from a feed entry.
///
/// Records are plain values: consumers that need extra view state copy the
/// fields they need instead of mutating the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Entry identifier URI, e.g. `http://arxiv.org/abs/2301.12345v1`
    pub id: String,

    pub title: String,

    /// Abstract text
    pub summary: String,

    /// Publication date (ISO 8601, empty when the feed omits it)
    pub published: String,

    /// Last updated date (ISO 8601, empty when the feed omits it)
    pub updated: String,

    pub authors: Vec<Author>,

    pub categories: Vec<Category>,

    pub primary_category: Option<Category>,

    pub links: Vec<Link>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ArticleRecord {
    /// Create a record with only an identifier set
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            summary: String::new(),
            published: String::new(),
            updated: String::new(),
            authors: Vec::new(),
            categories: Vec::new(),
            primary_category: None,
            links: Vec::new(),
            doi: None,
            journal_ref: None,
            comment: None,
        }
    }

    /// First link that looks like the PDF
    pub fn pdf_link(&self) -> Option<&Link> {
        self.links.iter().find(|link| link.is_pdf())
    }

    /// First `rel="alternate"` link (the abstract page)
    pub fn abstract_link(&self) -> Option<&Link> {
        self.links.iter().find(|link| link.is_alternate())
    }

    /// Short arXiv identifier (`2301.12345v1`) extracted from the entry id.
    ///
    /// Falls back to the full id when it is not an arXiv abstract URL.
    pub fn arxiv_id(&self) -> &str {
        match self.id.rfind("/abs/") {
            Some(pos) => &self.id[pos + 5..],
            None => &self.id,
        }
    }

    pub fn author_names(&self) -> Vec<&str> {
        self.authors.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.published).ok()
    }

    pub fn updated_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.updated).ok()
    }
}

/// An entry that was skipped while decoding a feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedEntry {
    /// Zero-based position of the entry in the source document
    pub position: usize,

    pub reason: String,
}

/// Decoded search response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedResult {
    /// Entries in document order
    pub entries: Vec<ArticleRecord>,

    pub total_results: usize,

    pub start_index: usize,

    pub items_per_page: usize,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<DroppedEntry>,
}

impl FeedResult {
    /// Feed with the given entries and counters derived from them
    pub fn from_entries(entries: Vec<ArticleRecord>) -> Self {
        let count = entries.len();
        Self {
            entries,
            total_results: count,
            start_index: 0,
            items_per_page: count,
            dropped: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::from_entries(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries dropped during decoding
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}
