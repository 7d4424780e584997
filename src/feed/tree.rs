//! Minimal owned element tree built from `quick-xml` events.
//!
//! Elements are keyed by local name, so `arxiv:doi` and `doi` look the same
//! to callers. Namespace declarations are dropped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::FeedError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, FeedError> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| FeedError::Malformed(format!("bad attribute: {}", e)))?;
            if attr.key.as_ref().starts_with(b"xmlns") {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| FeedError::Malformed(format!("bad attribute value: {}", e)))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    /// First direct child with the given local name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given local name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Attribute value by local name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute value, `None` when missing or blank
    pub fn non_empty_attr(&self, name: &str) -> Option<String> {
        self.attr(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Trimmed text of the first child with the given name, `None` when
    /// missing or blank
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name)
            .map(|c| c.text.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

/// Parse a complete document and return its root element
pub(crate) fn parse(xml: &str) -> Result<Element, FeedError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            FeedError::Malformed(format!(
                "XML error at position {}: {}",
                reader.error_position(),
                e
            ))
        })?;

        match event {
            Event::Start(ref start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(FeedError::Malformed("multiple root elements".to_string()));
                }
                stack.push(Element::from_start(start)?);
            }
            Event::Empty(ref start) => {
                let element = Element::from_start(start)?;
                close(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| FeedError::Malformed("unexpected closing tag".to_string()))?;
                close(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| FeedError::Malformed(format!("bad text content: {}", e)))?;
                append_text(&text, &mut stack)?;
            }
            Event::CData(data) => {
                let data = data.into_inner();
                append_text(&String::from_utf8_lossy(&data), &mut stack)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(FeedError::Malformed(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| FeedError::Malformed("document has no root element".to_string()))
}

fn close(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), FeedError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(FeedError::Malformed("multiple root elements".to_string()));
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn append_text(text: &str, stack: &mut [Element]) -> Result<(), FeedError> {
    match stack.last_mut() {
        Some(current) => current.text.push_str(text),
        None if text.trim().is_empty() => {}
        None => {
            return Err(FeedError::Malformed(
                "text content outside of the root element".to_string(),
            ));
        }
    }
    Ok(())
}
