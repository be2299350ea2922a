//! Acceptance loop
//!
//! Presents suggestions one at a time. Accepting applies the head to the
//! buffer and rebases everything behind it; skipping drops the head without
//! touching the buffer. A suggestion whose anchor no longer matches is
//! discarded silently, never applied partially.

use crate::buffer::Buffer;
use crate::edit::EditEvent;
use crate::error::Result;
use crate::suggest::{Placement, Suggestion};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Result of an accept request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptOutcome {
    Applied {
        suggestion: Suggestion,
        /// `None` when the payload was already present and nothing changed
        event: Option<EditEvent>,
    },
    /// Nothing valid left to apply
    Exhausted,
}

/// Counters for one queue lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub accepted: usize,
    pub skipped: usize,
    pub discarded: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SuggestionQueue {
    pending: VecDeque<Suggestion>,
    stats: QueueStats,
}

impl SuggestionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, suggestions: impl IntoIterator<Item = Suggestion>) {
        self.pending.extend(suggestions);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// The loop is over when nothing is queued.
    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Suggestion> {
        self.pending.iter()
    }

    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Head of the queue, after discarding stale entries in front of it.
    pub fn current(&mut self, buffer: &Buffer) -> Option<&Suggestion> {
        self.drop_stale_head(buffer);
        self.pending.front()
    }

    /// Apply the first valid suggestion.
    pub fn accept(&mut self, buffer: &mut Buffer) -> Result<AcceptOutcome> {
        self.drop_stale_head(buffer);
        let Some(suggestion) = self.pending.pop_front() else {
            return Ok(AcceptOutcome::Exhausted);
        };

        if suggestion.placement != Placement::Replace && suggestion.is_already_applied(buffer.text())
        {
            debug!(id = %suggestion.id, "payload already present; nothing to apply");
            self.stats.accepted += 1;
            return Ok(AcceptOutcome::Applied {
                suggestion,
                event: None,
            });
        }

        let event = suggestion.apply_to(buffer)?;
        self.stats.accepted += 1;
        info!(id = %suggestion.id, "applied {}", suggestion.summary());
        self.rebase(&event, buffer);

        Ok(AcceptOutcome::Applied {
            suggestion,
            event: Some(event),
        })
    }

    /// Drop the head without mutating the buffer.
    pub fn skip(&mut self) -> Option<Suggestion> {
        let skipped = self.pending.pop_front()?;
        self.stats.skipped += 1;
        debug!(id = %skipped.id, "skipped {}", skipped.summary());
        Some(skipped)
    }

    /// Shift queued targets past `event` (already applied to `buffer`) and
    /// discard anything it invalidated.
    pub fn rebase(&mut self, event: &EditEvent, buffer: &Buffer) {
        let before = self.pending.len();
        self.pending
            .retain_mut(|s| s.rebase(event) && s.is_anchored(buffer.text()));
        self.note_discarded(before);
    }

    /// Discard every queued suggestion whose anchor no longer matches.
    pub fn revalidate(&mut self, buffer: &Buffer) -> usize {
        let before = self.pending.len();
        self.pending.retain(|s| s.is_anchored(buffer.text()));
        self.note_discarded(before)
    }

    fn drop_stale_head(&mut self, buffer: &Buffer) {
        while let Some(head) = self.pending.front() {
            if head.is_anchored(buffer.text()) {
                break;
            }
            debug!(id = %head.id, "discarding stale suggestion {}", head.summary());
            self.pending.pop_front();
            self.stats.discarded += 1;
        }
    }

    fn note_discarded(&mut self, before: usize) -> usize {
        let dropped = before - self.pending.len();
        if dropped > 0 {
            debug!(dropped, "discarded stale suggestions");
            self.stats.discarded += dropped;
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::{EditKind, Span, TextEdit};

    fn replace_all(text: &str, old: &str, new: &str) -> Vec<Suggestion> {
        text.match_indices(old)
            .map(|(start, _)| {
                Suggestion::new(
                    EditKind::Rename,
                    Span::new(start, start + old.len()),
                    old,
                    Placement::Replace,
                    new,
                )
            })
            .collect()
    }

    #[test]
    fn test_accepting_everything_rebases_later_targets() {
        let mut buffer = Buffer::new("app.use(); app.listen();");
        let mut queue = SuggestionQueue::new();
        queue.extend(replace_all(buffer.text(), "app", "server"));

        while !queue.is_done() {
            queue.accept(&mut buffer).unwrap();
        }
        assert_eq!(buffer.text(), "server.use(); server.listen();");
        assert_eq!(queue.stats().accepted, 2);
        assert_eq!(queue.accept(&mut buffer).unwrap(), AcceptOutcome::Exhausted);
    }

    #[test]
    fn test_insert_next_to_a_longer_token_is_applied() {
        let mut buffer = Buffer::new("[1, 23]");
        let mut queue = SuggestionQueue::new();
        queue.extend([Suggestion::new(
            EditKind::Insert,
            Span::new(1, 2),
            "1",
            Placement::After,
            ", 2",
        )]);

        match queue.accept(&mut buffer).unwrap() {
            AcceptOutcome::Applied { event, .. } => assert!(event.is_some()),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(buffer.text(), "[1, 2, 23]");
    }

    #[test]
    fn test_skipping_never_touches_the_buffer() {
        let mut buffer = Buffer::new("a b a");
        let mut queue = SuggestionQueue::new();
        queue.extend(replace_all(buffer.text(), "a", "z"));

        let version = buffer.version();
        assert!(queue.skip().is_some());
        assert!(queue.skip().is_some());
        assert!(queue.skip().is_none());
        assert_eq!(buffer.text(), "a b a");
        assert_eq!(buffer.version(), version);
        assert_eq!(queue.stats().skipped, 2);
    }

    #[test]
    fn test_stale_head_is_discarded_silently() {
        let mut buffer = Buffer::new("foo(1); foo(2);");
        let mut queue = SuggestionQueue::new();
        queue.extend(replace_all(buffer.text(), "foo", "bar"));

        // External edit rewrites the first call.
        let event = buffer.apply(&TextEdit::replace(Span::new(0, 3), "baz")).unwrap();
        assert_eq!(event.old_text, "foo");

        match queue.accept(&mut buffer).unwrap() {
            AcceptOutcome::Applied { suggestion, .. } => assert_eq!(suggestion.target.start, 8),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(buffer.text(), "baz(1); bar(2);");
        assert_eq!(queue.stats().discarded, 1);
    }

    #[test]
    fn test_insert_after_is_not_duplicated() {
        let mut buffer = Buffer::new("[\"critical\", \"warning\", \"info\"]");
        let target = Span::new(13, 22);
        assert_eq!(&buffer.text()[target.range()], "\"warning\"");
        let suggestion = Suggestion::new(
            EditKind::Insert,
            target,
            "\"warning\"",
            Placement::After,
            ", \"debug\"",
        );

        let mut queue = SuggestionQueue::new();
        queue.extend([suggestion.clone(), suggestion]);
        let first = queue.accept(&mut buffer).unwrap();
        assert!(matches!(first, AcceptOutcome::Applied { event: Some(_), .. }));
        let second = queue.accept(&mut buffer).unwrap();
        assert!(matches!(
            second,
            AcceptOutcome::Applied { event: None, .. } | AcceptOutcome::Exhausted
        ));
        assert_eq!(
            buffer.text(),
            "[\"critical\", \"warning\", \"debug\", \"info\"]"
        );
    }

    #[test]
    fn test_accept_drops_suggestions_overlapping_the_applied_range() {
        let mut buffer = Buffer::new("abc");
        let mut queue = SuggestionQueue::new();
        queue.extend([
            Suggestion::new(EditKind::Rename, Span::new(0, 3), "abc", Placement::Replace, "x"),
            Suggestion::new(EditKind::Rename, Span::new(1, 2), "b", Placement::Replace, "y"),
        ]);
        queue.accept(&mut buffer).unwrap();
        assert_eq!(buffer.text(), "x");
        assert!(queue.is_done());
        assert_eq!(queue.stats().discarded, 1);
    }

    #[test]
    fn test_revalidate_after_external_edit() {
        let mut buffer = Buffer::new("one two one");
        let mut queue = SuggestionQueue::new();
        queue.extend(replace_all(buffer.text(), "one", "1"));
        buffer.replace_all("one two");
        assert_eq!(queue.revalidate(&buffer), 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.current(&buffer).unwrap().target, Span::new(0, 3));
    }
}
