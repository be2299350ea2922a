//! Error type shared by the core editing primitives.

use crate::syntax::Language;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrideError {
    #[error("span {start}..{end} is out of bounds for a buffer of {len} bytes")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("offset {0} does not fall on a character boundary")]
    NotCharBoundary(usize),

    #[error("anchor {expected:?} no longer matches buffer text {found:?}")]
    StaleAnchor { expected: String, found: String },

    #[error("tree-sitter could not parse the {0:?} source")]
    Parse(Language),

    #[error("no grammar is available for {0:?}")]
    UnsupportedLanguage(Language),
}

pub type Result<T> = std::result::Result<T, StrideError>;
