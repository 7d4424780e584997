//! Decoder for arXiv Atom search responses.
//!
//! The document is parsed into a small element tree and fields are picked by
//! tag name, never by position, so whitespace and element order inside an
//! entry do not matter.
//!
//! ```rust
//! use scholarly::feed::decode_feed;
//!
//! let feed = decode_feed(r#"
//!     <feed xmlns="http://www.w3.org/2005/Atom">
//!       <entry>
//!         <id>http://arxiv.org/abs/2301.12345v1</id>
//!         <title>Example</title>
//!         <category term="cs.AI"/>
//!       </entry>
//!     </feed>"#).unwrap();
//!
//! assert_eq!(feed.entries[0].arxiv_id(), "2301.12345v1");
//! assert_eq!(feed.entries[0].primary_category.as_ref().unwrap().term, "cs.AI");
//! ```

mod decoder;
mod tree;

pub use decoder::{decode_feed, EntryError};

/// Errors that abort decoding of a whole feed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// Input is not well-formed XML
    #[error("Malformed feed: {0}")]
    Malformed(String),
}
