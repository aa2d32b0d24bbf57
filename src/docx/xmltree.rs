//! Normalized XML element tree.
//!
//! Event-driven parsers force every consumer to re-answer the same question:
//! is this child a single node or a list? This module answers it once. Every
//! element's children are always a list, in document order, with a tagged
//! node type distinguishing elements from text. Namespace prefixes are
//! stripped; lookups use local names only, which is how the rest of the
//! crate addresses `w:p`, `wp:extent`, `a:blip` and friends.

use crate::common::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

/// A node in the normalized tree.
#[derive(Debug, Clone)]
pub enum XmlNode {
    /// Element with attributes and children
    Element(XmlElement),
    /// Character data (entity references already resolved)
    Text(String),
}

/// An attribute with its local name.
#[derive(Debug, Clone)]
pub struct XmlAttr {
    /// Local attribute name (prefix stripped)
    pub name: String,
    /// Unescaped attribute value
    pub value: String,
}

/// An element in the normalized tree.
#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    /// Local element name (prefix stripped)
    pub name: String,
    /// Attributes in document order
    pub attrs: Vec<XmlAttr>,
    /// Children in document order - always a list
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Parse an XML document and return its root element.
    pub fn parse(xml: &[u8]) -> Result<XmlElement> {
        let mut reader = Reader::from_reader(xml);
        // Whitespace between elements is kept as text nodes; runs carry
        // significant spaces (xml:space="preserve") we must not lose.

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;
        let mut buf = Vec::with_capacity(1024);

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let element = element_from_tag(e.local_name().as_ref(), e.attributes());
                    stack.push(element);
                },
                Ok(Event::Empty(e)) => {
                    let element = element_from_tag(e.local_name().as_ref(), e.attributes());
                    attach(&mut stack, &mut root, XmlNode::Element(element));
                },
                Ok(Event::End(_)) => {
                    if let Some(done) = stack.pop() {
                        attach(&mut stack, &mut root, XmlNode::Element(done));
                    }
                },
                Ok(Event::Text(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(e.as_ref());
                        push_text(parent, &text);
                    }
                },
                Ok(Event::GeneralRef(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let entity = String::from_utf8_lossy(e.as_ref());
                        if let Some(resolved) = resolve_entity(&entity) {
                            push_text(parent, &resolved);
                        }
                    }
                },
                Ok(Event::CData(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let raw = e.into_inner();
                        let text = String::from_utf8_lossy(&raw);
                        push_text(parent, &text);
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(e.to_string())),
                // Declarations, comments and processing instructions carry
                // no content for us.
                _ => {},
            }
            buf.clear();
        }

        root.ok_or_else(|| Error::Xml("document has no root element".to_string()))
    }

    /// Get an attribute value by local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Get the conventional `val` attribute.
    #[inline]
    pub fn val(&self) -> Option<&str> {
        self.attr("val")
    }

    /// First child element with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    /// Whether a child element with the given local name exists.
    #[inline]
    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// All child elements, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Child elements with the given local name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.name == name)
    }

    /// First descendant element with the given local name (depth-first).
    pub fn descendant(&self, name: &str) -> Option<&XmlElement> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }
}

fn element_from_tag(
    local_name: &[u8],
    attributes: quick_xml::events::attributes::Attributes<'_>,
) -> XmlElement {
    let mut attrs = Vec::new();
    for attr in attributes.flatten() {
        let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        attrs.push(XmlAttr { name, value });
    }
    XmlElement {
        name: String::from_utf8_lossy(local_name).into_owned(),
        attrs,
        children: Vec::new(),
    }
}

fn attach(stack: &mut Vec<XmlElement>, root: &mut Option<XmlElement>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if root.is_none()
                && let XmlNode::Element(e) = node
            {
                *root = Some(e);
            }
        },
    }
}

fn push_text(parent: &mut XmlElement, text: &str) {
    // Merge with a preceding text node so entity boundaries stay invisible.
    if let Some(XmlNode::Text(existing)) = parent.children.last_mut() {
        existing.push_str(text);
    } else {
        parent.children.push(XmlNode::Text(text.to_string()));
    }
}

fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {},
    }

    if let Some(hex) = entity.strip_prefix("#x") {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#') {
        if let Ok(code) = dec.parse::<u32>()
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    }

    None
}
