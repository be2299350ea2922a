//! In-memory text buffer with a version counter.
//!
//! The buffer is the single source of truth the tracker, matcher and
//! acceptance loop agree on. Every successful mutation bumps `version`, which
//! lets asynchronous matching detect that its input went stale.

use crate::edit::{EditEvent, Span, TextEdit};
use crate::error::{Result, StrideError};
use crate::syntax::Language;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Buffer {
    text: String,
    version: u64,
    path: Option<PathBuf>,
    language: Language,
}

impl Buffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_language(text, Language::Unknown)
    }

    pub fn with_language(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            version: 0,
            path: None,
            language,
        }
    }

    /// Buffer backed by a file; the language comes from the extension.
    pub fn from_path(path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        let path = path.as_ref();
        Self {
            text: text.into(),
            version: 0,
            path: Some(path.to_path_buf()),
            language: Language::from_path(path),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Validate that `span` is in bounds and on character boundaries.
    pub fn check_span(&self, span: Span) -> Result<()> {
        if span.start > span.end || span.end > self.text.len() {
            return Err(StrideError::OutOfBounds {
                start: span.start,
                end: span.end,
                len: self.text.len(),
            });
        }
        for offset in [span.start, span.end] {
            if !self.text.is_char_boundary(offset) {
                return Err(StrideError::NotCharBoundary(offset));
            }
        }
        Ok(())
    }

    pub fn slice(&self, span: Span) -> Result<&str> {
        self.check_span(span)?;
        Ok(&self.text[span.range()])
    }

    /// Apply an edit and report what changed.
    pub fn apply(&mut self, edit: &TextEdit) -> Result<EditEvent> {
        self.check_span(edit.span)?;
        let old_text = self.text[edit.span.range()].to_string();
        self.text.replace_range(edit.span.range(), &edit.new_text);
        self.version += 1;
        Ok(EditEvent::new(edit.span, old_text, edit.new_text.clone()))
    }

    /// Replace the whole content (reload from disk, editor resync).
    pub fn replace_all(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.version += 1;
    }

    pub fn line_index(&self) -> LineIndex {
        LineIndex::new(&self.text)
    }

    /// 0-based line and byte column of `offset`.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let index = self.line_index();
        let line = index.line_of(offset);
        (line, offset - index.line_start(line).unwrap_or(0))
    }

    /// Byte offset of a 0-based line and byte column.
    pub fn offset_of(&self, line: usize, column: usize) -> Result<usize> {
        let span = self.line_span(line).ok_or(StrideError::OutOfBounds {
            start: line,
            end: line,
            len: self.line_index().line_count(),
        })?;
        let offset = span.start + column;
        if offset > span.end {
            return Err(StrideError::OutOfBounds {
                start: offset,
                end: offset,
                len: span.end,
            });
        }
        if !self.text.is_char_boundary(offset) {
            return Err(StrideError::NotCharBoundary(offset));
        }
        Ok(offset)
    }

    /// Span of a 0-based line, excluding its newline.
    pub fn line_span(&self, line: usize) -> Option<Span> {
        line_span_in(&self.text, &self.line_index(), line)
    }

    pub fn line_text(&self, line: usize) -> Option<&str> {
        self.line_span(line).map(|span| &self.text[span.range()])
    }
}

pub(crate) fn line_span_in(text: &str, index: &LineIndex, line: usize) -> Option<Span> {
    let start = index.line_start(line)?;
    let end = text[start..]
        .find('\n')
        .map(|pos| start + pos)
        .unwrap_or(text.len());
    Some(Span::new(start, end))
}

/// Offsets of line starts, for offset -> line lookups.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(pos, _)| pos + 1));
        Self { starts }
    }

    /// 0-based line containing `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        }
    }

    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.starts.get(line).copied()
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}
