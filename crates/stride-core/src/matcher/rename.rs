//! Rename propagation

use super::{Candidate, Confidence, MatchConfig};
use crate::edit::{LogicalEdit, Span};
use crate::suggest::Placement;
use crate::syntax::{role_of_node, span_of, Role, SyntaxTree};
use crate::util::{is_ident_char, word_occurrences, word_pattern};

/// Every other token in the post-edit tree that still reads `old_text` in
/// the role the renamed token had.
pub(super) fn structural(
    config: &MatchConfig,
    before_tree: &SyntaxTree,
    after_tree: &SyntaxTree,
    after: &str,
    edit: &LogicalEdit,
) -> Vec<Candidate> {
    let old = edit.old_text.as_str();
    if old.trim().is_empty() {
        return Vec::new();
    }
    let Some(site) = before_tree.node_covering(edit.old_span) else {
        return Vec::new();
    };

    let role = role_of_node(site);
    if role == Role::Other {
        return same_kind(after_tree, site.kind(), span_of(&site) == edit.old_span, after, edit);
    }

    let tokens = after_tree.tokens();
    let binds_local = role == Role::Property
        && tokens
            .iter()
            .any(|t| t.kind == DESTRUCTURED_BINDING && &after[t.span.range()] == old);
    let pattern = word_pattern(old);

    let mut out = Vec::new();
    for token in tokens {
        let Some(confidence) = role_confidence(config, role, token.role, binds_local) else {
            continue;
        };
        let text = &after[token.span.range()];
        if token.role.is_text() {
            let Some(pattern) = &pattern else {
                continue;
            };
            for offset in word_occurrences(pattern, text) {
                let start = token.span.start + offset;
                let span = Span::new(start, start + old.len());
                if !span.overlaps(edit.new_span) {
                    out.push(replacement(span, edit, token.role, confidence));
                }
            }
        } else if text == old && !token.span.overlaps(edit.new_span) {
            out.push(replacement(token.span, edit, token.role, confidence));
        }
    }
    out
}

/// Renames of multi-token text (`a.b` -> `c`) match nodes of the same kind.
fn same_kind(
    after_tree: &SyntaxTree,
    kind: &str,
    exact_site: bool,
    after: &str,
    edit: &LogicalEdit,
) -> Vec<Candidate> {
    if !exact_site {
        return Vec::new();
    }
    after_tree
        .nodes_of_kind(kind)
        .into_iter()
        .map(|node| span_of(&node))
        .filter(|span| &after[span.range()] == edit.old_text && !span.overlaps(edit.new_span))
        .map(|span| replacement(span, edit, Role::Other, Confidence::Medium))
        .collect()
}

/// `({ isActive }) =>` reads a property and binds a local of the same name.
const DESTRUCTURED_BINDING: &str = "shorthand_property_identifier_pattern";

/// `binds_local` lets a property rename reach identifiers even with strict
/// roles, once a destructuring pattern ties the two names together.
fn role_confidence(
    config: &MatchConfig,
    site: Role,
    candidate: Role,
    binds_local: bool,
) -> Option<Confidence> {
    if site == candidate {
        Some(Confidence::High)
    } else if binds_local && candidate == Role::Identifier {
        Some(Confidence::Medium)
    } else if !config.strict_roles && site.is_symbol() && candidate.is_symbol() {
        Some(Confidence::Medium)
    } else {
        None
    }
}

/// Word-bounded text scan for buffers without a grammar.
pub(super) fn plain_text(after: &str, edit: &LogicalEdit) -> Vec<Candidate> {
    let old = edit.old_text.as_str();
    if !old.chars().any(is_ident_char) {
        return Vec::new();
    }
    let Some(pattern) = word_pattern(old) else {
        return Vec::new();
    };
    word_occurrences(&pattern, after)
        .into_iter()
        .map(|start| Span::new(start, start + old.len()))
        .filter(|span| !span.overlaps(edit.new_span))
        .map(|span| replacement(span, edit, Role::Word, Confidence::Low))
        .collect()
}

fn replacement(span: Span, edit: &LogicalEdit, role: Role, confidence: Confidence) -> Candidate {
    Candidate {
        target: span,
        anchor: edit.old_text.clone(),
        placement: Placement::Replace,
        payload: edit.new_text.clone(),
        role,
        confidence,
        distance: 0,
    }
}
