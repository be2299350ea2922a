//! Similarity matcher
//!
//! Given a logical edit, finds the other places in the document where the
//! same edit applies:
//!
//! - renames propagate to tokens of the same syntactic role,
//! - inserts propagate to structurally similar list/argument/union positions,
//! - deletes propagate to identical elements under the same kind of parent.
//!
//! Without a grammar, renames fall back to a word-bounded text scan.

mod rename;
mod structural;
#[cfg(test)]
mod tests;

use crate::buffer::LineIndex;
use crate::edit::{EditKind, LogicalEdit, Span};
use crate::suggest::Placement;
use crate::syntax::{Language, Role, SyntaxTree};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Maximum suggestions produced for one editing session
pub const DEFAULT_MAX_SUGGESTIONS: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub max_suggestions: usize,
    /// When false, identifier, property and type roles are interchangeable
    pub strict_roles: bool,
    /// Scan plain text when no grammar is available
    pub plain_text_fallback: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            strict_roles: true,
            plain_text_fallback: true,
        }
    }
}

/// Confidence level of a match
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Text-only match
    Low,
    /// Compatible but not identical role or shape
    #[default]
    Medium,
    /// Same role, same shape
    High,
}

/// A place where the edit could be mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub target: Span,
    pub anchor: String,
    pub placement: Placement,
    pub payload: String,
    pub role: Role,
    pub confidence: Confidence,
    /// Line distance from the original edit
    pub distance: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SimilarityMatcher {
    config: MatchConfig,
}

impl SimilarityMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Candidates for `edit`, given the texts before and after editing.
    /// Ordered by confidence, then proximity to the edit.
    pub fn find(
        &self,
        before: &str,
        after: &str,
        language: Language,
        edit: &LogicalEdit,
    ) -> Vec<Candidate> {
        let mut candidates = match edit.kind {
            EditKind::Rename => match parse_pair(before, after, language) {
                Some((before_tree, after_tree)) => {
                    rename::structural(&self.config, &before_tree, &after_tree, after, edit)
                }
                None if self.config.plain_text_fallback => rename::plain_text(after, edit),
                None => Vec::new(),
            },
            EditKind::Insert => parse(after, language)
                .map(|after_tree| structural::insert_candidates(&after_tree, after, edit))
                .unwrap_or_default(),
            EditKind::Delete => match parse_pair(before, after, language) {
                Some((before_tree, after_tree)) => {
                    structural::delete_candidates(&before_tree, &after_tree, before, after, edit)
                }
                None => Vec::new(),
            },
        };

        rank(&mut candidates, after, edit.new_span);
        candidates.truncate(self.config.max_suggestions);

        debug!(
            kind = edit.kind.label(),
            language = language.name(),
            matches = candidates.len(),
            "matched {}",
            edit.summary()
        );
        candidates
    }
}

fn parse(text: &str, language: Language) -> Option<SyntaxTree> {
    if !language.has_grammar() {
        return None;
    }
    match SyntaxTree::parse(text, language) {
        Ok(tree) => Some(tree),
        Err(err) => {
            debug!("syntax tree unavailable: {}", err);
            None
        }
    }
}

fn parse_pair(before: &str, after: &str, language: Language) -> Option<(SyntaxTree, SyntaxTree)> {
    Some((parse(before, language)?, parse(after, language)?))
}

/// Fill in distances, sort, and drop duplicate targets.
fn rank(candidates: &mut Vec<Candidate>, text: &str, origin: Span) {
    let index = LineIndex::new(text);
    let origin_line = index.line_of(origin.start);
    for candidate in candidates.iter_mut() {
        candidate.distance = index.line_of(candidate.target.start).abs_diff(origin_line);
    }
    candidates.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then(a.distance.cmp(&b.distance))
            .then(a.target.start.cmp(&b.target.start))
    });
    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert((c.target, c.placement, c.payload.clone())));
}
