//! html5ever TreeSink implementation feeding the arena.

use std::cell::RefCell;

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as Html5Attribute, ParseOpts, QualName, parse_document};

use super::arena::{Dom, NodeData, NodeId};

/// Handle used by TreeSink to reference nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeHandle(NodeId);

impl Default for NodeHandle {
    fn default() -> Self {
        NodeHandle(NodeId::NONE)
    }
}

/// TreeSink implementation that builds a [`Dom`].
///
/// Uses interior mutability (RefCell) because html5ever's TreeSink trait
/// takes `&self` while the arena needs mutation.
struct DomSink {
    dom: RefCell<Dom>,
    quirks_mode: RefCell<QuirksMode>,
}

impl DomSink {
    fn new() -> Self {
        Self {
            dom: RefCell::new(Dom::new()),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
        }
    }

    fn into_dom(self) -> Dom {
        self.dom.into_inner()
    }
}

impl TreeSink for DomSink {
    type Handle = NodeHandle;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, _msg: std::borrow::Cow<'static, str>) {
        // Be lenient like browsers; malformed editor HTML still parses.
    }

    fn get_document(&self) -> Self::Handle {
        NodeHandle(self.dom.borrow().document())
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        static EMPTY: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };

        let dom = self.dom.borrow();
        match dom.get(target.0) {
            Some(node) => match &node.data {
                NodeData::Element { name, .. } => {
                    // SAFETY: the QualName lives in the arena, which lives as
                    // long as self; the borrow checker cannot see this
                    // through the RefCell. The reference is used immediately
                    // by the tree builder and never stored.
                    unsafe { std::mem::transmute::<&QualName, &'a QualName>(name) }
                },
                _ => &EMPTY,
            },
            None => &EMPTY,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Html5Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let converted: Vec<(String, String)> = attrs
            .into_iter()
            .map(|a| (a.name.local.as_ref().to_string(), a.value.to_string()))
            .collect();
        NodeHandle(self.dom.borrow_mut().create_element(name, converted))
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        NodeHandle(self.dom.borrow_mut().create_comment(text.to_string()))
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        // Processing instructions are kept as inert comments.
        NodeHandle(self.dom.borrow_mut().create_comment(String::new()))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut dom = self.dom.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => dom.append(parent.0, node.0),
            NodeOrText::AppendText(text) => dom.append_text(parent.0, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let parent = self.dom.borrow().get(element.0).map(|n| n.parent);
        if let Some(parent) = parent
            && parent.is_some()
        {
            let mut dom = self.dom.borrow_mut();
            match child {
                NodeOrText::AppendNode(node) => dom.append(parent, node.0),
                NodeOrText::AppendText(text) => dom.append_text(parent, &text),
            }
            return;
        }
        self.append(prev_element, child);
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        let mut dom = self.dom.borrow_mut();
        let doc = dom.document();
        let doctype = dom.create_doctype();
        dom.append(doc, doctype);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        *target
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x.0 == y.0
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut dom = self.dom.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => dom.insert_before(sibling.0, node.0),
            NodeOrText::AppendText(text) => {
                let text_node = dom.create_text(text.to_string());
                dom.insert_before(sibling.0, text_node);
            },
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Html5Attribute>) {
        let mut dom = self.dom.borrow_mut();
        if let Some(node) = dom.get_mut(target.0)
            && let NodeData::Element { attrs: existing, .. } = &mut node.data
        {
            for attr in attrs {
                let local = attr.name.local.as_ref();
                if !existing.iter().any(|(name, _)| name == local) {
                    existing.push((local.to_string(), attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.dom.borrow_mut().detach(target.0);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        self.dom.borrow_mut().reparent_children(node.0, new_parent.0);
    }
}

/// Parse a full HTML document into a [`Dom`].
pub fn parse_html(html: &str) -> Dom {
    let sink = DomSink::new();
    let result = parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes());
    result.into_dom()
}

/// Parse an HTML fragment (editor content, converted output) by wrapping it
/// in a minimal document; callers address the content through
/// [`Dom::body`].
pub fn parse_fragment(html: &str) -> Dom {
    let wrapped = format!("<!DOCTYPE html><html><head></head><body>{html}</body></html>");
    parse_html(&wrapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_parse() {
        let dom = parse_html("<html><body><p>Hello</p></body></html>");
        let p = dom.find_by_tag("p").expect("should find p");
        assert_eq!(dom.element_name(p), Some("p"));
        assert_eq!(dom.text_of_subtree(p), "Hello");
    }

    #[test]
    fn test_fragment_body() {
        let dom = parse_fragment(r#"<p style="color: red">one</p><p>two</p>"#);
        let body = dom.body().expect("fragment should have a body");
        let paragraphs: Vec<_> = dom
            .children(body)
            .filter(|&c| dom.is_element(c))
            .collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(dom.get_attr(paragraphs[0], "style"), Some("color: red"));
    }

    #[test]
    fn test_malformed_html_is_tolerated() {
        let dom = parse_fragment("<p>unclosed <b>bold");
        let body = dom.body().unwrap();
        assert_eq!(dom.text_of_subtree(body), "unclosed bold");
    }
}
