//! Minimal markup tree for rule sources.
//!
//! The engine only needs to walk a tree: tag names, ordered children,
//! attribute lookup and text values. This module builds exactly that from a
//! `quick-xml` event stream and nothing more (no validation, no namespaces).
//!
//! Whitespace-only text nodes that contain a line break are formatting of the
//! source file, not content, and are dropped while building the tree.

use crate::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element { name: name.into(), ..Self::default() }
    }

    /// Tag name compared case-insensitively.
    pub fn is(&self, tag: &str) -> bool {
        self.name.eq_ignore_ascii_case(tag)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First child element with the given tag.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(tag))
    }

    /// Concatenated text content of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(&e.children, out),
        }
    }
}

/// Parse `source` into a tree. The returned element is an unnamed document
/// node whose children are the top-level nodes (normally one `<aiml>`).
pub fn parse(source: &str) -> Result<Element> {
    let mut reader = Reader::from_str(source);
    let mut stack: Vec<Element> = vec![Element::default()];

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(open_element(&start)?),
            Event::Empty(start) => {
                let element = open_element(&start)?;
                push_node(&mut stack, Node::Element(element));
            }
            Event::End(end) => {
                if stack.len() < 2 {
                    return Err(Error::UnbalancedTag { found: String::from_utf8_lossy(end.name().as_ref()).into_owned() });
                }
                if let Some(element) = stack.pop() {
                    push_node(&mut stack, Node::Element(element));
                }
            }
            Event::Text(text) => push_text(&mut stack, text.unescape().map_err(quick_xml::Error::from)?.into_owned()),
            Event::CData(data) => push_text(&mut stack, String::from_utf8_lossy(&data.into_inner()).into_owned()),
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype.
            _ => {}
        }
    }

    if stack.len() > 1 {
        let open = stack.pop().map(|e| e.name).unwrap_or_default();
        return Err(Error::UnbalancedTag { found: format!("EOF (<{open}> left open)") });
    }
    Ok(stack.pop().unwrap_or_default())
}

fn open_element(start: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element::new(String::from_utf8_lossy(start.local_name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(quick_xml::Error::from)?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn push_node(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

fn push_text(stack: &mut [Element], text: String) {
    if text.trim().is_empty() && text.contains('\n') {
        return;
    }
    push_node(stack, Node::Text(text));
}
