//! Insert and delete propagation over list-like structures (arrays, object
//! literals, argument lists, type unions, generic arguments).

use super::{Candidate, Confidence};
use crate::edit::{LogicalEdit, Span};
use crate::suggest::{payload_present, Placement};
use crate::syntax::{is_comment_kind, role_of_node, span_of, SyntaxTree};
use crate::util::{collapse_whitespace, is_separator, trim_separators};
use tracing::debug;
use tree_sitter::Node;

/// Mirror an inserted element next to every element shaped like its neighbour.
pub(super) fn insert_candidates(
    after_tree: &SyntaxTree,
    after: &str,
    edit: &LogicalEdit,
) -> Vec<Candidate> {
    let content = trim_separators(after, edit.new_span);
    if content.is_empty() {
        return Vec::new();
    }
    let Some(inserted) = after_tree.named_node_exact(content) else {
        debug!("inserted text is not a whole syntax node");
        return Vec::new();
    };

    let (anchor, placement) = match previous_element(inserted) {
        Some(prev) => (prev, Placement::After),
        None => match next_element(inserted) {
            Some(next) => (next, Placement::Before),
            None => return Vec::new(),
        },
    };

    let payload = match placement {
        Placement::After => collapse_whitespace(&after[anchor.end_byte()..inserted.end_byte()]),
        _ => collapse_whitespace(&after[inserted.start_byte()..anchor.start_byte()]),
    };
    let anchor_span = span_of(&anchor);
    let anchor_text = &after[anchor_span.range()];
    let anchor_shape = shape(anchor, after);
    let parent_kind = anchor.parent().map(|p| p.kind());
    let inserted_span = span_of(&inserted);
    let inserted_shape = shape(inserted, after);

    let mut out = Vec::new();
    for node in after_tree.nodes_of_kind(anchor.kind()) {
        let span = span_of(&node);
        if span == anchor_span || span.overlaps(inserted_span) || span.overlaps(edit.new_span) {
            continue;
        }
        if node.parent().map(|p| p.kind()) != parent_kind || shape(node, after) != anchor_shape {
            continue;
        }
        let neighbour = match placement {
            Placement::After => next_element(node),
            _ => previous_element(node),
        };
        let present = neighbour
            .is_some_and(|n| n.kind() == inserted.kind() && shape(n, after) == inserted_shape);
        if present || payload_present(after, span, placement, &payload) {
            continue;
        }

        let text = &after[span.range()];
        out.push(Candidate {
            target: span,
            anchor: text.to_string(),
            placement,
            payload: payload.clone(),
            role: role_of_node(node),
            confidence: if text == anchor_text {
                Confidence::High
            } else {
                Confidence::Medium
            },
            distance: 0,
        });
    }
    out
}

/// Remove elements identical to the one that was deleted, under the same
/// kind of parent.
pub(super) fn delete_candidates(
    before_tree: &SyntaxTree,
    after_tree: &SyntaxTree,
    before: &str,
    after: &str,
    edit: &LogicalEdit,
) -> Vec<Candidate> {
    let content = trim_separators(before, edit.old_span);
    if content.is_empty() {
        return Vec::new();
    }
    let Some(removed) = before_tree.named_node_exact(content) else {
        debug!("deleted text is not a whole syntax node");
        return Vec::new();
    };
    let removed_text = &before[content.range()];
    let parent_kind = removed.parent().map(|p| p.kind());
    let side = SeparatorSide::of(before, edit.old_span, content);

    after_tree
        .nodes_of_kind(removed.kind())
        .into_iter()
        .filter(|node| {
            node.parent().map(|p| p.kind()) == parent_kind
                && &after[node.byte_range()] == removed_text
        })
        .map(|node| {
            let target = side.widen(after, span_of(&node));
            Candidate {
                target,
                anchor: after[target.range()].to_string(),
                placement: Placement::Replace,
                payload: String::new(),
                role: role_of_node(node),
                confidence: Confidence::High,
                distance: 0,
            }
        })
        .collect()
}

/// Which separator, if any, went away together with a deleted element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeparatorSide {
    Leading,
    Trailing,
    None,
}

impl SeparatorSide {
    fn of(text: &str, deleted: Span, content: Span) -> Self {
        if text[deleted.start..content.start].contains(is_separator) {
            SeparatorSide::Leading
        } else if text[content.end..deleted.end].contains(is_separator) {
            SeparatorSide::Trailing
        } else {
            SeparatorSide::None
        }
    }

    fn widen(self, text: &str, span: Span) -> Span {
        match self {
            SeparatorSide::Trailing => {
                let rest = text[span.end..].trim_start_matches([' ', '\t']);
                match rest.chars().next() {
                    Some(c) if is_separator(c) => {
                        let remaining = rest[c.len_utf8()..].trim_start();
                        Span::new(span.start, text.len() - remaining.len())
                    }
                    _ => span,
                }
            }
            SeparatorSide::Leading => {
                let head = text[..span.start].trim_end();
                match head.chars().next_back() {
                    Some(c) if is_separator(c) => Span::new(head.len() - c.len_utf8(), span.end),
                    _ => span,
                }
            }
            SeparatorSide::None => span,
        }
    }
}

/// Comparable identity of an element: the key of a key/value pair, the name
/// of a declaration, otherwise the whole text.
fn shape<'a>(node: Node<'_>, text: &'a str) -> &'a str {
    for field in ["key", "name", "pattern"] {
        if let Some(child) = node.child_by_field_name(field) {
            return &text[child.byte_range()];
        }
    }
    &text[node.byte_range()]
}

fn previous_element(node: Node<'_>) -> Option<Node<'_>> {
    let parent = node.parent()?;
    let mut prev = node.prev_named_sibling();
    while let Some(p) = prev {
        if !is_comment_kind(p.kind()) {
            break;
        }
        prev = p.prev_named_sibling();
    }
    let mut prev = prev?;
    // Left-recursive lists (`a | b | c`) nest earlier elements one level down.
    while prev.kind() == parent.kind() {
        prev = last_named_child(prev)?;
    }
    Some(prev)
}

fn next_element(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node;
    loop {
        let mut next = current.next_named_sibling();
        while let Some(n) = next {
            if !is_comment_kind(n.kind()) {
                break;
            }
            next = n.next_named_sibling();
        }
        if next.is_some() {
            return next;
        }
        let parent = current.parent()?;
        let grandparent = parent.parent()?;
        if parent.kind() != grandparent.kind() {
            return None;
        }
        current = parent;
    }
}

fn last_named_child(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let last = node
        .named_children(&mut cursor)
        .filter(|child| !is_comment_kind(child.kind()))
        .last();
    last
}
