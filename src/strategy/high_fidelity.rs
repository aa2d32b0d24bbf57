//! The high-fidelity rendering strategy.
//!
//! Builds on the structural pipeline but finishes through the DOM surface:
//! the rendered fragment is parsed into the arena, cleaned up at the tree
//! level (adjacent runs with identical styling merged, empty spans
//! dropped), and serialized back. The tree pass gives closer visual
//! fidelity than string-level cleanup for small and medium files, at the
//! cost of requiring the render surface - which is why this strategy can
//! never run inside the background worker.

use crate::common::diagnostics::Diagnostic;
use crate::common::error::Result;
use crate::dom::{Dom, NodeData, NodeId, parse_fragment, serialize_children};
use crate::strategy::{ConvertRequest, ImportStrategy, structural};

/// DOM-surface rendering for small and medium inputs.
pub struct HighFidelityStrategy;

impl ImportStrategy for HighFidelityStrategy {
    fn name(&self) -> &'static str {
        "high-fidelity"
    }

    fn attempt(
        &self,
        request: &ConvertRequest<'_>,
        progress: &mut dyn FnMut(u8, &str),
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<String> {
        let html = structural::convert_sync(request.bytes, progress, diagnostics)?;

        progress(95, "refining output");
        let mut dom = parse_fragment(&html);
        let Some(body) = dom.body() else {
            return Ok(html);
        };

        prune_empty_spans(&mut dom, body);
        merge_adjacent_spans(&mut dom, body);

        Ok(serialize_children(&dom, body))
    }
}

/// Drop `<span>` elements with nothing inside them.
fn prune_empty_spans(dom: &mut Dom, id: NodeId) {
    let children: Vec<NodeId> = dom.children(id).collect();
    for child in children {
        prune_empty_spans(dom, child);
        if dom.element_name(child) == Some("span")
            && dom.children(child).next().is_none()
        {
            dom.detach(child);
        }
    }
}

/// Merge consecutive spans that carry identical attributes and contain
/// only text, so `<span style="x">a</span><span style="x">b</span>`
/// becomes one span.
fn merge_adjacent_spans(dom: &mut Dom, id: NodeId) {
    let children: Vec<NodeId> = dom.children(id).collect();
    for child in &children {
        merge_adjacent_spans(dom, *child);
    }

    let mut index = 0;
    while index + 1 < children.len() {
        let current = children[index];
        if dom.get(current).is_none_or(|n| n.parent.is_none()) {
            // Pruned earlier; never merge into a detached node.
            index += 1;
            continue;
        }
        let mut next_index = index + 1;
        while next_index < children.len() {
            let next = children[next_index];
            if dom.get(next).is_none_or(|n| n.parent.is_none()) {
                // Already merged away.
                next_index += 1;
                continue;
            }
            if !mergeable(dom, current, next) {
                break;
            }
            let text = dom.text_of_subtree(next);
            dom.detach(next);
            dom.append_text(current, &text);
            next_index += 1;
        }
        index = next_index;
    }
}

/// Two nodes merge when both are spans with equal attributes and text-only
/// content.
fn mergeable(dom: &Dom, a: NodeId, b: NodeId) -> bool {
    if dom.element_name(a) != Some("span") || dom.element_name(b) != Some("span") {
        return false;
    }
    if !text_only(dom, a) || !text_only(dom, b) {
        return false;
    }
    match (dom.get(a), dom.get(b)) {
        (Some(na), Some(nb)) => match (&na.data, &nb.data) {
            (
                NodeData::Element { attrs: attrs_a, .. },
                NodeData::Element { attrs: attrs_b, .. },
            ) => attrs_a == attrs_b,
            _ => false,
        },
        _ => false,
    }
}

fn text_only(dom: &Dom, id: NodeId) -> bool {
    dom.children(id)
        .all(|child| dom.text_content(child).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refine(html: &str) -> String {
        let mut dom = parse_fragment(html);
        let body = dom.body().unwrap();
        prune_empty_spans(&mut dom, body);
        merge_adjacent_spans(&mut dom, body);
        serialize_children(&dom, body)
    }

    #[test]
    fn test_identical_spans_merge() {
        let html = r#"<p><span style="color: #FF0000">a</span><span style="color: #FF0000">b</span></p>"#;
        assert_eq!(
            refine(html),
            r#"<p><span style="color: #FF0000">ab</span></p>"#
        );
    }

    #[test]
    fn test_different_spans_stay_apart() {
        let html = r#"<p><span style="color: #FF0000">a</span><span>b</span></p>"#;
        assert_eq!(refine(html), html);
    }

    #[test]
    fn test_empty_spans_pruned() {
        let html = r#"<p><span></span><span>text</span></p>"#;
        assert_eq!(refine(html), "<p><span>text</span></p>");
    }

    #[test]
    fn test_span_with_nested_markup_not_merged() {
        let html = r#"<p><span>a<br />x</span><span>b</span></p>"#;
        assert_eq!(refine(html), html);
    }
}
