//! Suggestion engine
//!
//! Turns matcher candidates into suggestions the editor can preview as
//! virtual text and the acceptance loop can apply.

use crate::buffer::{line_span_in, Buffer};
use crate::edit::{EditEvent, EditKind, LogicalEdit, Span, TextEdit};
use crate::error::{Result, StrideError};
use crate::matcher::{Candidate, Confidence, DEFAULT_MAX_SUGGESTIONS};
use crate::syntax::Role;
use crate::util::starts_with_ignoring_whitespace;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_width::UnicodeWidthStr;
use uuid::Uuid;

/// Where the payload goes relative to the anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Before,
    After,
    /// Payload replaces the anchor (empty payload deletes it)
    Replace,
}

/// A proposed mirrored edit, not yet applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: Uuid,
    /// Kind of the logical edit this mirrors
    pub kind: EditKind,
    /// Text expected at `target`
    pub anchor: String,
    pub placement: Placement,
    pub payload: String,
    /// Location of the anchor in the buffer
    pub target: Span,
    pub role: Role,
    #[serde(default)]
    pub confidence: Confidence,
    /// Buffer version the suggestion was computed against
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl Suggestion {
    pub fn new(
        kind: EditKind,
        target: Span,
        anchor: impl Into<String>,
        placement: Placement,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            anchor: anchor.into(),
            placement,
            payload: payload.into(),
            target,
            role: Role::Other,
            confidence: Confidence::default(),
            version: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn from_candidate(edit: &LogicalEdit, candidate: Candidate, version: u64) -> Self {
        Self::new(
            edit.kind,
            candidate.target,
            candidate.anchor,
            candidate.placement,
            candidate.payload,
        )
        .with_role(candidate.role)
        .with_confidence(candidate.confidence)
        .with_version(version)
    }

    /// The buffer edit that applies this suggestion.
    pub fn text_edit(&self) -> TextEdit {
        match self.placement {
            Placement::Replace => TextEdit::replace(self.target, self.payload.clone()),
            Placement::After => TextEdit::insert(self.target.end, self.payload.clone()),
            Placement::Before => TextEdit::insert(self.target.start, self.payload.clone()),
        }
    }

    /// True while the buffer still holds the anchor at the target.
    pub fn is_anchored(&self, text: &str) -> bool {
        text.get(self.target.range()) == Some(self.anchor.as_str())
    }

    /// Apply to `buffer`, refusing when the anchor moved or changed.
    pub fn apply_to(&self, buffer: &mut Buffer) -> Result<EditEvent> {
        if !self.is_anchored(buffer.text()) {
            return Err(StrideError::StaleAnchor {
                expected: self.anchor.clone(),
                found: buffer.text().get(self.target.range()).unwrap_or_default().to_string(),
            });
        }
        buffer.apply(&self.text_edit())
    }

    /// True when an insert's payload already sits next to the anchor.
    pub fn is_already_applied(&self, text: &str) -> bool {
        payload_present(text, self.target, self.placement, &self.payload)
    }

    /// Move the target past an edit applied elsewhere. Returns false when the
    /// edit touched the anchor itself.
    pub fn rebase(&mut self, event: &EditEvent) -> bool {
        if self.target.overlaps(event.span) {
            return false;
        }
        if event.span.end <= self.target.start {
            self.target = self.target.shifted(event.delta());
        }
        true
    }

    pub fn summary(&self) -> String {
        match self.placement {
            Placement::Replace if self.payload.is_empty() => format!("delete `{}`", self.anchor),
            Placement::Replace => format!("`{}` -> `{}`", self.anchor, self.payload),
            Placement::After => format!("insert `{}` after `{}`", self.payload, self.anchor),
            Placement::Before => format!("insert `{}` before `{}`", self.payload, self.anchor),
        }
    }
}

/// True when `payload` (whitespace-insensitive) already follows or precedes
/// the target, depending on placement.
pub(crate) fn payload_present(text: &str, target: Span, placement: Placement, payload: &str) -> bool {
    match placement {
        Placement::After => text
            .get(target.end..)
            .is_some_and(|rest| starts_with_ignoring_whitespace(rest.chars(), payload.chars())),
        Placement::Before => text.get(..target.start).is_some_and(|head| {
            starts_with_ignoring_whitespace(head.chars().rev(), payload.chars().rev())
        }),
        Placement::Replace => false,
    }
}

/// How the editor should render a preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VirtualTextStyle {
    Insert,
    Replace,
    Delete,
}

/// Non-destructive preview of a suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualText {
    /// 0-based line
    pub line: usize,
    /// Byte column within the line
    pub column: usize,
    /// Terminal cell column within the line
    pub display_column: usize,
    pub text: String,
    pub style: VirtualTextStyle,
    /// Text covered by a replace/delete preview
    pub replaced: Option<Span>,
}

#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    max_suggestions: usize,
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SUGGESTIONS)
    }
}

impl SuggestionEngine {
    pub fn new(max_suggestions: usize) -> Self {
        Self { max_suggestions }
    }

    /// Suggestions for a batch of edits, in edit order. Targets proposed by
    /// more than one edit are kept once.
    pub fn build<'a>(
        &self,
        version: u64,
        matches: impl IntoIterator<Item = (&'a LogicalEdit, Vec<Candidate>)>,
    ) -> Vec<Suggestion> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (edit, candidates) in matches {
            for candidate in candidates {
                if out.len() >= self.max_suggestions {
                    return out;
                }
                let key = (candidate.target, candidate.placement, candidate.payload.clone());
                if seen.insert(key) {
                    out.push(Suggestion::from_candidate(edit, candidate, version));
                }
            }
        }
        out
    }

    /// Where and what to render for `suggestion`, or `None` if it went stale.
    pub fn preview(&self, suggestion: &Suggestion, buffer: &Buffer) -> Option<VirtualText> {
        let text = buffer.text();
        if !suggestion.is_anchored(text) {
            return None;
        }
        let offset = match suggestion.placement {
            Placement::After => suggestion.target.end,
            Placement::Before | Placement::Replace => suggestion.target.start,
        };
        let (line, column) = buffer.line_col(offset);
        let display_column = UnicodeWidthStr::width(&text[offset - column..offset]);
        let (style, replaced) = match suggestion.placement {
            Placement::Replace if suggestion.payload.is_empty() => {
                (VirtualTextStyle::Delete, Some(suggestion.target))
            }
            Placement::Replace => (VirtualTextStyle::Replace, Some(suggestion.target)),
            Placement::Before | Placement::After => (VirtualTextStyle::Insert, None),
        };
        Some(VirtualText {
            line,
            column,
            display_column,
            text: suggestion.payload.clone(),
            style,
            replaced,
        })
    }

    /// The lines covered by the target as they would read after acceptance.
    pub fn render_line(&self, suggestion: &Suggestion, buffer: &Buffer) -> Option<String> {
        let text = buffer.text();
        if !suggestion.is_anchored(text) {
            return None;
        }
        let index = buffer.line_index();
        let first = line_span_in(text, &index, index.line_of(suggestion.target.start))?;
        let last = line_span_in(text, &index, index.line_of(suggestion.target.end))?;
        let edit = suggestion.text_edit();

        let mut line = String::with_capacity(last.end - first.start + edit.new_text.len());
        line.push_str(&text[first.start..edit.span.start]);
        line.push_str(&edit.new_text);
        line.push_str(&text[edit.span.end..last.end]);
        Some(line)
    }
}
