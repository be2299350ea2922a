//! Change tracker
//!
//! Folds raw edit events into logical edits. Between `begin` and `finish`
//! (insert mode, in editor terms) every event is merged into a group. An
//! event joins a group when it touches the group's region or when only
//! identifier characters separate them. Groups keep the pre-editing text of
//! their region, so `finish` can diff each region once and classify it.

use crate::edit::{EditEvent, EditKind, LogicalEdit, Span};
use crate::util::{
    common_prefix_len, common_suffix_len, ident_run_after, ident_run_before, is_ident_char,
};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// A region edited during the current session.
#[derive(Debug, Clone)]
struct EditGroup {
    /// Region in current (shadow) coordinates
    span: Span,
    /// Pre-editing text of the region
    original: String,
    events: usize,
    last_at: DateTime<Utc>,
}

/// Logical edits from one editing session, with the texts they refer to.
#[derive(Debug, Clone)]
pub struct EditBatch {
    /// Text when editing started
    pub before: String,
    /// Text when editing finished
    pub after: String,
    pub edits: Vec<LogicalEdit>,
}

#[derive(Debug, Clone)]
pub struct ChangeTracker {
    baseline: Option<String>,
    shadow: String,
    groups: Vec<EditGroup>,
    merge_within_token: bool,
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self {
            baseline: None,
            shadow: String::new(),
            groups: Vec::new(),
            merge_within_token: true,
        }
    }

    /// Disable merging of edits separated only by identifier characters.
    pub fn with_token_merging(mut self, enabled: bool) -> Self {
        self.merge_within_token = enabled;
        self
    }

    pub fn is_active(&self) -> bool {
        self.baseline.is_some()
    }

    /// Number of separate regions edited so far.
    pub fn pending_groups(&self) -> usize {
        self.groups.len()
    }

    /// Start an editing session over `text`.
    pub fn begin(&mut self, text: &str) {
        if self.is_active() {
            debug!("tracker restarted while active; discarding {} groups", self.groups.len());
        }
        self.baseline = Some(text.to_string());
        self.shadow = text.to_string();
        self.groups.clear();
    }

    /// Drop the current session without producing edits.
    pub fn cancel(&mut self) {
        self.baseline = None;
        self.shadow.clear();
        self.groups.clear();
    }

    /// Fold one event into the session. Events outside a session are ignored.
    pub fn record(&mut self, event: &EditEvent) {
        if !self.is_active() {
            debug!("edit recorded outside an editing session; ignoring");
            return;
        }
        if self.shadow.get(event.span.range()) != Some(event.old_text.as_str()) {
            warn!(
                start = event.span.start,
                end = event.span.end,
                "edit does not match tracked text; dropping editing session"
            );
            self.cancel();
            return;
        }

        let span = event.span;
        let touched: Vec<usize> = self
            .groups
            .iter()
            .enumerate()
            .filter(|(_, group)| self.joins(group.span, span))
            .map(|(idx, _)| idx)
            .collect();

        let delta = event.delta();
        let merged = if touched.is_empty() {
            EditGroup {
                span: event.new_span(),
                original: event.old_text.clone(),
                events: 1,
                last_at: event.timestamp,
            }
        } else {
            let first = &self.groups[touched[0]];
            let last = &self.groups[touched[touched.len() - 1]];
            let lo = span.start.min(first.span.start);
            let hi = span.end.max(last.span.end);

            // Text between groups has not been edited yet, so the shadow still
            // holds its original form.
            let mut original = String::new();
            let mut cursor = lo;
            let mut events = 1;
            for &idx in &touched {
                let group = &self.groups[idx];
                original.push_str(&self.shadow[cursor..group.span.start]);
                original.push_str(&group.original);
                cursor = group.span.end;
                events += group.events;
            }
            original.push_str(&self.shadow[cursor..hi]);

            EditGroup {
                span: Span::new(lo, crate::edit::shift(hi, delta)),
                original,
                events,
                last_at: event.timestamp,
            }
        };

        let mut groups = Vec::with_capacity(self.groups.len() + 1);
        for (idx, group) in self.groups.drain(..).enumerate() {
            if touched.contains(&idx) {
                continue;
            }
            if group.span.start >= span.end {
                groups.push(EditGroup {
                    span: group.span.shifted(delta),
                    ..group
                });
            } else {
                groups.push(group);
            }
        }
        groups.push(merged);
        groups.sort_by_key(|group| group.span.start);
        self.groups = groups;

        self.shadow
            .replace_range(span.range(), &event.new_text);
    }

    fn joins(&self, region: Span, span: Span) -> bool {
        if region.touches(span) {
            return true;
        }
        if !self.merge_within_token {
            return false;
        }
        let gap = if span.end < region.start {
            &self.shadow[span.end..region.start]
        } else {
            &self.shadow[region.end..span.start]
        };
        gap.chars().all(is_ident_char)
    }

    /// End the session and derive logical edits, ordered by position.
    pub fn finish(&mut self) -> Option<EditBatch> {
        let before = self.baseline.take()?;
        let after = std::mem::take(&mut self.shadow);
        let groups = std::mem::take(&mut self.groups);

        let mut edits = Vec::new();
        let mut shift_so_far: isize = 0;
        for group in &groups {
            let old_start = crate::edit::shift(group.span.start, -shift_so_far);
            let current = &after[group.span.range()];
            shift_so_far += current.len() as isize - group.original.len() as isize;

            if let Some(edit) =
                classify(&before, &after, old_start, &group.original, group.span.start, current)
            {
                debug!(
                    kind = edit.kind.label(),
                    events = group.events,
                    last_at = %group.last_at,
                    "{}",
                    edit.summary()
                );
                edits.push(edit);
            }
        }

        Some(EditBatch {
            before,
            after,
            edits,
        })
    }
}

/// Diff one region and turn it into a logical edit.
fn classify(
    before: &str,
    after: &str,
    old_start: usize,
    original: &str,
    new_start: usize,
    current: &str,
) -> Option<LogicalEdit> {
    let prefix = common_prefix_len(original, current);
    let suffix = common_suffix_len(&original[prefix..], &current[prefix..]);
    let removed = &original[prefix..original.len() - suffix];
    let added = &current[prefix..current.len() - suffix];
    if removed.is_empty() && added.is_empty() {
        return None;
    }

    let old_span = Span::new(old_start + prefix, old_start + original.len() - suffix);
    let new_span = Span::new(new_start + prefix, new_start + current.len() - suffix);

    let inside_word = |text: &str, span: Span| {
        ident_run_before(text, span.start) > 0 || ident_run_after(text, span.end) > 0
    };
    let all_ident = |s: &str| s.chars().all(is_ident_char);

    let kind = if !removed.is_empty() && !added.is_empty() {
        EditKind::Rename
    } else if removed.is_empty() {
        if all_ident(added) && inside_word(after, new_span) {
            EditKind::Rename
        } else {
            EditKind::Insert
        }
    } else if all_ident(removed) && inside_word(before, old_span) {
        EditKind::Rename
    } else {
        EditKind::Delete
    };

    let (old_span, new_span) = if kind == EditKind::Rename {
        (widen(before, old_span), widen(after, new_span))
    } else {
        (old_span, new_span)
    };

    let old_text = before[old_span.range()].to_string();
    let new_text = after[new_span.range()].to_string();
    if kind == EditKind::Rename && (old_text == new_text || new_text.is_empty()) {
        return None;
    }

    Some(LogicalEdit {
        kind,
        old_text,
        new_text,
        old_span,
        new_span,
        anchor_context: line_around(after, new_span.start).trim().to_string(),
    })
}

/// Extend `span` to whole identifier tokens on both sides.
fn widen(text: &str, span: Span) -> Span {
    Span::new(
        span.start - ident_run_before(text, span.start),
        span.end + ident_run_after(text, span.end),
    )
}

fn line_around(text: &str, offset: usize) -> &str {
    let start = text[..offset].rfind('\n').map(|pos| pos + 1).unwrap_or(0);
    let end = text[offset..]
        .find('\n')
        .map(|pos| offset + pos)
        .unwrap_or(text.len());
    &text[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Buffer;
    use crate::edit::TextEdit;

    /// Apply edits to a buffer while feeding the tracker, like a session does.
    fn track(text: &str, edits: &[TextEdit]) -> EditBatch {
        let mut buffer = Buffer::new(text);
        let mut tracker = ChangeTracker::new();
        tracker.begin(buffer.text());
        for edit in edits {
            let event = buffer.apply(edit).unwrap();
            tracker.record(&event);
        }
        let batch = tracker.finish().unwrap();
        assert_eq!(batch.after, buffer.text());
        batch
    }

    fn type_chars(at: usize, text: &str) -> Vec<TextEdit> {
        let mut offset = at;
        text.chars()
            .map(|c| {
                let edit = TextEdit::insert(offset, c.to_string());
                offset += c.len_utf8();
                edit
            })
            .collect()
    }

    #[test]
    fn test_change_inner_word_then_typing_is_one_rename() {
        let text = "const app = express();\napp.use(x);\n";
        let mut edits = vec![TextEdit::delete(Span::new(6, 9))];
        edits.extend(type_chars(6, "server"));

        let batch = track(text, &edits);
        assert_eq!(batch.edits.len(), 1);
        let edit = &batch.edits[0];
        assert_eq!(edit.kind, EditKind::Rename);
        assert_eq!(edit.old_text, "app");
        assert_eq!(edit.new_text, "server");
        assert_eq!(edit.old_span, Span::new(6, 9));
        assert_eq!(edit.new_span, Span::new(6, 12));
        assert_eq!(edit.anchor_context, "const server = express();");
    }

    #[test]
    fn test_backspacing_character_by_character_aggregates() {
        // "getUserById" -> "getUser", one backspace at a time from the end.
        let text = "const x = getUserById(1);";
        let end = 21;
        let edits: Vec<TextEdit> = (0..4)
            .map(|i| TextEdit::delete(Span::new(end - i - 1, end - i)))
            .collect();

        let batch = track(text, &edits);
        assert_eq!(batch.edits.len(), 1);
        assert_eq!(batch.edits[0].kind, EditKind::Rename);
        assert_eq!(batch.edits[0].old_text, "getUserById");
        assert_eq!(batch.edits[0].new_text, "getUser");
    }

    #[test]
    fn test_typed_then_undone_produces_nothing() {
        let edits = vec![TextEdit::insert(3, "x"), TextEdit::delete(Span::new(3, 4))];
        let batch = track("abc def", &edits);
        assert!(batch.edits.is_empty());
    }

    #[test]
    fn test_unrelated_tokens_stay_separate() {
        let text = "let alpha = beta;";
        let edits = vec![
            TextEdit::replace(Span::new(4, 9), "gamma"),
            TextEdit::replace(Span::new(12, 16), "delta"),
        ];
        let batch = track(text, &edits);
        assert_eq!(batch.edits.len(), 2);
        assert_eq!(batch.edits[0].old_text, "alpha");
        assert_eq!(batch.edits[0].new_text, "gamma");
        assert_eq!(batch.edits[1].old_text, "beta");
        assert_eq!(batch.edits[1].new_text, "delta");
        assert_eq!(batch.edits[1].old_span, Span::new(12, 16));
        assert_eq!(batch.edits[1].new_span, Span::new(12, 17));
    }

    #[test]
    fn test_cursor_moves_inside_one_identifier_merge() {
        // "getUserById" -> "getAccountByKey" in two separate edits.
        let text = "getUserById();";
        let edits = vec![
            TextEdit::replace(Span::new(3, 7), "Account"),
            TextEdit::replace(Span::new(12, 14), "Key"),
        ];
        let batch = track(text, &edits);
        assert_eq!(batch.edits.len(), 1);
        assert_eq!(batch.edits[0].old_text, "getUserById");
        assert_eq!(batch.edits[0].new_text, "getAccountByKey");
    }

    #[test]
    fn test_token_merging_can_be_disabled() {
        let text = "getUserById();";
        let mut buffer = Buffer::new(text);
        let mut tracker = ChangeTracker::new().with_token_merging(false);
        tracker.begin(buffer.text());
        for edit in [
            TextEdit::replace(Span::new(3, 7), "Account"),
            TextEdit::replace(Span::new(12, 14), "Key"),
        ] {
            let event = buffer.apply(&edit).unwrap();
            tracker.record(&event);
        }
        assert_eq!(tracker.pending_groups(), 2);
    }

    #[test]
    fn test_editing_earlier_text_shifts_later_groups() {
        let text = "aa bb cc";
        let edits = vec![
            TextEdit::replace(Span::new(6, 8), "zz"),
            TextEdit::replace(Span::new(0, 2), "xxxx"),
        ];
        let batch = track(text, &edits);
        assert_eq!(batch.edits.len(), 2);
        assert_eq!(batch.edits[0].new_text, "xxxx");
        assert_eq!(batch.edits[1].old_span, Span::new(6, 8));
        assert_eq!(batch.edits[1].new_span, Span::new(8, 10));
        assert_eq!(&batch.after[batch.edits[1].new_span.range()], "zz");
    }

    #[test]
    fn test_appended_argument_is_an_insert() {
        let text = "fetchUser(\"user-123\");";
        let batch = track(text, &type_chars(20, ", 5000"));
        assert_eq!(batch.edits.len(), 1);
        let edit = &batch.edits[0];
        assert_eq!(edit.kind, EditKind::Insert);
        assert_eq!(edit.new_text, ", 5000");
        assert_eq!(edit.old_text, "");
        assert_eq!(edit.new_span, Span::new(20, 26));
    }

    #[test]
    fn test_prefixing_a_word_is_a_rename() {
        let batch = track("valid(x)", &type_chars(0, "in"));
        assert_eq!(batch.edits[0].kind, EditKind::Rename);
        assert_eq!(batch.edits[0].old_text, "valid");
        assert_eq!(batch.edits[0].new_text, "invalid");
    }

    #[test]
    fn test_removing_a_list_element_is_a_delete() {
        let text = "[\"a\", \"b\", \"c\"]";
        let batch = track(text, &[TextEdit::delete(Span::new(9, 14))]);
        assert_eq!(batch.edits.len(), 1);
        assert_eq!(batch.edits[0].kind, EditKind::Delete);
        assert_eq!(batch.edits[0].old_text, ", \"c\"");
        assert_eq!(batch.after, "[\"a\", \"b\"]");
    }

    #[test]
    fn test_events_outside_a_session_are_ignored() {
        let mut tracker = ChangeTracker::new();
        tracker.record(&EditEvent::new(Span::new(0, 1), "a", "b"));
        assert!(!tracker.is_active());
        assert!(tracker.finish().is_none());
    }

    #[test]
    fn test_out_of_sync_event_drops_the_session() {
        let mut tracker = ChangeTracker::new();
        tracker.begin("hello");
        tracker.record(&EditEvent::new(Span::new(0, 1), "x", "y"));
        assert!(!tracker.is_active());
    }
}
