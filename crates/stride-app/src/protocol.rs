//! JSON-lines protocol spoken by `stride serve`
//!
//! One request object per stdin line, one reply per stdout line. Requests
//! may carry an `id`, which is echoed on the matching reply; replies to
//! `finish` can arrive after replies to later requests.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use stride_core::{
    Buffer, Confidence, EditKind, Placement, Role, Span, Suggestion, VirtualText,
};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Replace the buffer
    Open {
        #[serde(default)]
        path: Option<PathBuf>,
        /// Editor filetype; overrides the extension of `path`
        #[serde(default)]
        language: Option<String>,
        text: String,
    },
    /// Start an editing session (insert mode entered)
    Begin,
    /// Replace `start..end` (byte offsets) with `text`
    Edit {
        start: usize,
        end: usize,
        #[serde(default)]
        text: String,
    },
    /// End the editing session and predict
    Finish,
    Current,
    Accept,
    Skip,
    Clear,
    Shutdown,
}

impl Request {
    pub fn label(&self) -> &'static str {
        match self {
            Request::Open { .. } => "open",
            Request::Begin => "begin",
            Request::Edit { .. } => "edit",
            Request::Finish => "finish",
            Request::Current => "current",
            Request::Accept => "accept",
            Request::Skip => "skip",
            Request::Clear => "clear",
            Request::Shutdown => "shutdown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub request: Request,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok {
        version: u64,
    },
    Suggestions {
        version: u64,
        items: Vec<SuggestionView>,
        /// The buffer changed while predicting; nothing was queued
        #[serde(default)]
        stale: bool,
    },
    Suggestion {
        item: Option<SuggestionView>,
        preview: Option<VirtualText>,
        /// Target lines as they would read after accepting
        #[serde(default)]
        rendered: Option<String>,
    },
    Applied {
        id: Uuid,
        text: String,
        version: u64,
        remaining: usize,
    },
    Exhausted,
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub response: Response,
}

impl Reply {
    pub fn new(id: Option<u64>, response: Response) -> Self {
        Self { id, response }
    }

    pub fn error(id: Option<u64>, message: impl Into<String>) -> Self {
        Self::new(
            id,
            Response::Error {
                message: message.into(),
            },
        )
    }
}

/// A suggestion as sent to the editor, with 0-based line/column of its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionView {
    pub id: Uuid,
    pub kind: EditKind,
    pub anchor: String,
    pub placement: Placement,
    pub payload: String,
    pub target: Span,
    pub line: usize,
    pub column: usize,
    pub role: Role,
    pub confidence: Confidence,
    pub summary: String,
}

impl SuggestionView {
    pub fn new(suggestion: &Suggestion, buffer: &Buffer) -> Self {
        let (line, column) = buffer.line_col(suggestion.target.start);
        Self {
            id: suggestion.id,
            kind: suggestion.kind,
            anchor: suggestion.anchor.clone(),
            placement: suggestion.placement,
            payload: suggestion.payload.clone(),
            target: suggestion.target,
            line,
            column,
            role: suggestion.role,
            confidence: suggestion.confidence,
            summary: suggestion.summary(),
        }
    }
}
