//! Edit primitives: byte spans, requested edits, observed edit events and
//! the logical edits the tracker derives from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` into a buffer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {start} is past end {end}");
        Self { start, end }
    }

    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Strict overlap. An empty span overlaps only when it sits strictly inside.
    pub fn overlaps(&self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Overlap or shared boundary.
    pub fn touches(&self, other: Span) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    /// Move both ends by `delta`, saturating at zero.
    pub fn shifted(&self, delta: isize) -> Span {
        Span {
            start: shift(self.start, delta),
            end: shift(self.end, delta),
        }
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

pub(crate) fn shift(offset: usize, delta: isize) -> usize {
    offset.checked_add_signed(delta).unwrap_or(0)
}

/// A request to replace `span` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub span: Span,
    pub new_text: String,
}

impl TextEdit {
    pub fn replace(span: Span, new_text: impl Into<String>) -> Self {
        Self {
            span,
            new_text: new_text.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(Span::empty(at), text)
    }

    pub fn delete(span: Span) -> Self {
        Self::replace(span, String::new())
    }
}

/// An applied mutation, in the coordinates of the text it was applied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditEvent {
    pub span: Span,
    pub old_text: String,
    pub new_text: String,
    pub timestamp: DateTime<Utc>,
}

impl EditEvent {
    pub fn new(span: Span, old_text: impl Into<String>, new_text: impl Into<String>) -> Self {
        Self {
            span,
            old_text: old_text.into(),
            new_text: new_text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Length change this event causes.
    pub fn delta(&self) -> isize {
        self.new_text.len() as isize - self.old_text.len() as isize
    }

    /// Where the inserted text lives after the event.
    pub fn new_span(&self) -> Span {
        Span::new(self.span.start, self.span.start + self.new_text.len())
    }
}

/// Kind of a logical edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    /// Text replaced by other non-empty text (identifier renames, literal changes)
    Rename,
    /// Text added with nothing removed
    Insert,
    /// Text removed with nothing added
    Delete,
}

impl EditKind {
    pub fn label(&self) -> &'static str {
        match self {
            EditKind::Rename => "rename",
            EditKind::Insert => "insert",
            EditKind::Delete => "delete",
        }
    }
}

/// A single user-intended change, aggregated from one or more edit events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalEdit {
    pub kind: EditKind,
    /// Text that was there before editing started (empty for inserts)
    pub old_text: String,
    /// Text that is there now (empty for deletes)
    pub new_text: String,
    /// Location of `old_text` in the pre-editing snapshot
    pub old_span: Span,
    /// Location of `new_text` in the current text
    pub new_span: Span,
    /// Trimmed line around the change, for display
    pub anchor_context: String,
}

impl LogicalEdit {
    pub fn summary(&self) -> String {
        match self.kind {
            EditKind::Rename => format!("rename `{}` -> `{}`", self.old_text, self.new_text),
            EditKind::Insert => format!("insert `{}`", self.new_text.trim()),
            EditKind::Delete => format!("delete `{}`", self.old_text.trim()),
        }
    }
}
