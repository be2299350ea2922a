//! Core editing model for Stride: buffers, edit tracking, structural
//! matching, and the suggestion acceptance loop.

pub mod buffer;
pub mod edit;
pub mod error;
pub mod matcher;
pub mod queue;
pub mod session;
pub mod suggest;
pub mod syntax;
pub mod tracker;
pub mod util;

pub use buffer::Buffer;
pub use edit::{EditEvent, EditKind, LogicalEdit, Span, TextEdit};
pub use error::{Result, StrideError};
pub use matcher::{Candidate, Confidence, MatchConfig, SimilarityMatcher};
pub use queue::{AcceptOutcome, SuggestionQueue};
pub use session::{predict_batch, Prediction, Session};
pub use suggest::{Placement, Suggestion, SuggestionEngine, VirtualText, VirtualTextStyle};
pub use syntax::{Language, Role};
pub use tracker::{ChangeTracker, EditBatch};
