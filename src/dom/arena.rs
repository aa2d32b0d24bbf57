//! The arena itself: index-linked nodes in one vector.

use html5ever::QualName;

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this is a valid node id.
    #[inline]
    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    /// Check if this is the sentinel value.
    #[inline]
    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element with name and attributes (attribute names are local)
    Element {
        name: QualName,
        attrs: Vec<(String, String)>,
    },
    /// Text content
    Text(String),
    /// Comment (kept for parsing, dropped on serialization)
    Comment(String),
    /// Doctype declaration
    Doctype,
}

/// A node with its tree links.
#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Arena-backed DOM tree.
pub struct Dom {
    nodes: Vec<Node>,
    document: NodeId,
}

impl Dom {
    /// Create an empty DOM with a document root.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: NodeId::NONE,
        };
        dom.document = dom.alloc(Node::new(NodeData::Document));
        dom
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// The document root id.
    #[inline]
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// Get a node by id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by id.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Create an element node.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<(String, String)>) -> NodeId {
        self.alloc(Node::new(NodeData::Element { name, attrs }))
    }

    /// Create a text node.
    pub fn create_text(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text)))
    }

    /// Create a comment node.
    pub fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text)))
    }

    /// Create a doctype node.
    pub fn create_doctype(&mut self) -> NodeId {
        self.alloc(Node::new(NodeData::Doctype))
    }

    /// Append a child to a parent node.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
        }
        if last_child.is_some()
            && let Some(last_node) = self.get_mut(last_child)
        {
            last_node.next_sibling = child;
        }
        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert a node before a sibling.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let (parent, prev) = match self.get(sibling) {
            Some(n) => (n.parent, n.prev_sibling),
            None => return,
        };

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }
        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }
        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Append text, merging with a trailing text node when possible.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(existing) = &mut last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Detach a node from its parent, fixing up sibling links.
    pub fn detach(&mut self, target: NodeId) {
        let (parent, prev, next) = {
            let node = match self.get(target) {
                Some(n) => n,
                None => return,
            };
            (node.parent, node.prev_sibling, node.next_sibling)
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if parent.is_some()
            && let Some(p) = self.get_mut(parent)
        {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if parent.is_some()
            && let Some(p) = self.get_mut(parent)
        {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(target) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Move all children of `node` onto `new_parent`.
    pub fn reparent_children(&mut self, node: NodeId, new_parent: NodeId) {
        let children: Vec<_> = self.children(node).collect();
        for child in &children {
            self.detach(*child);
        }
        for child in children {
            self.append(new_parent, child);
        }
    }

    /// Iterate over the children of a node.
    pub fn children(&self, parent: NodeId) -> ChildrenIter<'_> {
        let first = self.get(parent).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        ChildrenIter {
            dom: self,
            current: first,
        }
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether only the document root exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Find the first element matching a predicate, depth-first.
    pub fn find<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        let mut stack = vec![self.document];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.get(id) {
                if predicate(node) {
                    return Some(id);
                }
                let mut children: Vec<_> = self.children(id).collect();
                children.reverse();
                stack.extend(children);
            }
        }
        None
    }

    /// Find the first element with a tag name.
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.find(|node| {
            matches!(&node.data, NodeData::Element { name, .. } if name.local.as_ref() == tag)
        })
    }

    /// The `<body>` element, when present.
    pub fn body(&self) -> Option<NodeId> {
        self.find_by_tag("body")
    }

    /// Element tag name (local part).
    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(name.local.as_ref()),
            _ => None,
        })
    }

    /// Rename an element in place, keeping its attributes and children.
    pub fn rename_element(&mut self, id: NodeId, new_name: &str) {
        if let Some(node) = self.get_mut(id)
            && let NodeData::Element { name, .. } = &mut node.data
        {
            *name = QualName::new(
                None,
                html5ever::ns!(html),
                html5ever::LocalName::from(new_name),
            );
        }
    }

    /// Get an attribute value.
    pub fn get_attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(name, _)| name == attr_name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        })
    }

    /// Set (or replace) an attribute value. Setting the empty string on
    /// `style` removes the attribute instead of leaving litter behind.
    pub fn set_attr(&mut self, id: NodeId, attr_name: &str, value: &str) {
        if let Some(node) = self.get_mut(id)
            && let NodeData::Element { attrs, .. } = &mut node.data
        {
            if value.is_empty() && attr_name == "style" {
                attrs.retain(|(name, _)| name != attr_name);
                return;
            }
            if let Some(slot) = attrs.iter_mut().find(|(name, _)| name == attr_name) {
                slot.1 = value.to_string();
            } else {
                attrs.push((attr_name.to_string(), value.to_string()));
            }
        }
    }

    /// Whether the node is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    /// Text of a text node.
    pub fn text_content(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Concatenated text of a subtree.
    pub fn text_of_subtree(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let Some(node) = self.get(id) {
            if let NodeData::Text(t) = &node.data {
                out.push_str(t);
            }
            for child in self.children(id) {
                self.collect_text(child, out);
            }
        }
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the children of a node.
pub struct ChildrenIter<'a> {
    dom: &'a Dom,
    current: NodeId,
}

impl<'a> Iterator for ChildrenIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .dom
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use html5ever::{LocalName, ns};

    fn qname(local: &str) -> QualName {
        QualName::new(None, ns!(html), LocalName::from(local))
    }

    #[test]
    fn test_append_and_iterate() {
        let mut dom = Dom::new();
        let div = dom.create_element(qname("div"), vec![]);
        let p1 = dom.create_element(qname("p"), vec![]);
        let p2 = dom.create_element(qname("p"), vec![]);
        dom.append(dom.document(), div);
        dom.append(div, p1);
        dom.append(div, p2);

        let children: Vec<_> = dom.children(div).collect();
        assert_eq!(children, vec![p1, p2]);
    }

    #[test]
    fn test_text_merging() {
        let mut dom = Dom::new();
        let p = dom.create_element(qname("p"), vec![]);
        dom.append(dom.document(), p);
        dom.append_text(p, "Hello, ");
        dom.append_text(p, "World!");

        let children: Vec<_> = dom.children(p).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(dom.text_content(children[0]), Some("Hello, World!"));
    }

    #[test]
    fn test_rename_keeps_children() {
        let mut dom = Dom::new();
        let p = dom.create_element(qname("p"), vec![("style".into(), "x".into())]);
        dom.append(dom.document(), p);
        dom.append_text(p, "text");

        dom.rename_element(p, "h2");
        assert_eq!(dom.element_name(p), Some("h2"));
        assert_eq!(dom.get_attr(p, "style"), Some("x"));
        assert_eq!(dom.text_of_subtree(p), "text");
    }

    #[test]
    fn test_set_attr_replaces() {
        let mut dom = Dom::new();
        let p = dom.create_element(qname("p"), vec![]);
        dom.set_attr(p, "style", "color: red");
        dom.set_attr(p, "style", "color: blue");
        assert_eq!(dom.get_attr(p, "style"), Some("color: blue"));

        dom.set_attr(p, "style", "");
        assert_eq!(dom.get_attr(p, "style"), None);
    }

    #[test]
    fn test_detach() {
        let mut dom = Dom::new();
        let div = dom.create_element(qname("div"), vec![]);
        let p1 = dom.create_element(qname("p"), vec![]);
        let p2 = dom.create_element(qname("p"), vec![]);
        dom.append(dom.document(), div);
        dom.append(div, p1);
        dom.append(div, p2);

        dom.detach(p1);
        let children: Vec<_> = dom.children(div).collect();
        assert_eq!(children, vec![p2]);
    }
}
