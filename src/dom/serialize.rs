//! Serializing arena subtrees back to HTML text.
//!
//! The output is a fragment in the same dialect the renderer produces:
//! double-quoted attributes, self-closed void elements, comments and
//! doctypes dropped.

use super::arena::{Dom, NodeData, NodeId};
use crate::html::escape::escape_html;

/// Void elements that take no closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Serialize one node (and its subtree) to HTML.
pub fn serialize_node(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, id, &mut out);
    out
}

/// Serialize the children of a node, excluding the node itself.
///
/// This is how fragments come back out: parse wrapped, rewrite, then
/// serialize the body's children.
pub fn serialize_children(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    for child in dom.children(id) {
        write_node(dom, child, &mut out);
    }
    out
}

fn write_node(dom: &Dom, id: NodeId, out: &mut String) {
    let Some(node) = dom.get(id) else {
        return;
    };

    match &node.data {
        NodeData::Document => {
            for child in dom.children(id) {
                write_node(dom, child, out);
            }
        },
        NodeData::Element { name, attrs } => {
            let tag = name.local.as_ref();
            out.push('<');
            out.push_str(tag);
            for (attr_name, value) in attrs {
                out.push(' ');
                out.push_str(attr_name);
                out.push_str("=\"");
                out.push_str(&escape_html(value));
                out.push('"');
            }
            if VOID_ELEMENTS.contains(&tag) {
                out.push_str(" />");
                return;
            }
            out.push('>');
            for child in dom.children(id) {
                write_node(dom, child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        },
        NodeData::Text(text) => out.push_str(&escape_html(text)),
        NodeData::Comment(_) | NodeData::Doctype => {},
    }
}
