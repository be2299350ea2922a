//! Editing session
//!
//! Ties the buffer, change tracker, matcher and acceptance loop together.
//! Matching can also run elsewhere: take the batch with [`Session::take_batch`],
//! run [`predict_batch`] on any thread, then hand the result back with
//! [`Session::accept_prediction`]. Results for an outdated buffer version
//! are dropped.

use crate::buffer::Buffer;
use crate::edit::{EditEvent, TextEdit};
use crate::error::Result;
use crate::matcher::{MatchConfig, SimilarityMatcher};
use crate::queue::{AcceptOutcome, SuggestionQueue};
use crate::suggest::{Suggestion, SuggestionEngine, VirtualText};
use crate::syntax::Language;
use crate::tracker::{ChangeTracker, EditBatch};
use tracing::{debug, info};

/// Suggestions computed for one buffer version.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub version: u64,
    pub suggestions: Vec<Suggestion>,
}

/// Match every logical edit in `batch` and build suggestions for `version`.
pub fn predict_batch(
    matcher: &SimilarityMatcher,
    engine: &SuggestionEngine,
    batch: &EditBatch,
    language: Language,
    version: u64,
) -> Prediction {
    let matches = batch.edits.iter().map(|edit| {
        let candidates = matcher.find(&batch.before, &batch.after, language, edit);
        (edit, candidates)
    });
    let suggestions = engine.build(version, matches);
    info!(
        edits = batch.edits.len(),
        suggestions = suggestions.len(),
        version,
        "prediction ready"
    );
    Prediction {
        version,
        suggestions,
    }
}

pub struct Session {
    buffer: Buffer,
    tracker: ChangeTracker,
    queue: SuggestionQueue,
    matcher: SimilarityMatcher,
    engine: SuggestionEngine,
}

impl Session {
    pub fn new(buffer: Buffer, config: MatchConfig) -> Self {
        let engine = SuggestionEngine::new(config.max_suggestions);
        Self {
            buffer,
            tracker: ChangeTracker::new(),
            queue: SuggestionQueue::new(),
            matcher: SimilarityMatcher::new(config),
            engine,
        }
    }

    pub fn with_token_merging(mut self, enabled: bool) -> Self {
        self.tracker = ChangeTracker::new().with_token_merging(enabled);
        self
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn queue(&self) -> &SuggestionQueue {
        &self.queue
    }

    pub fn matcher(&self) -> &SimilarityMatcher {
        &self.matcher
    }

    pub fn engine(&self) -> &SuggestionEngine {
        &self.engine
    }

    pub fn is_editing(&self) -> bool {
        self.tracker.is_active()
    }

    /// Replace the buffer, dropping any session state tied to the old one.
    pub fn open(&mut self, buffer: Buffer) {
        debug!(language = buffer.language().name(), bytes = buffer.len(), "buffer opened");
        self.buffer = buffer;
        self.tracker.cancel();
        self.queue.clear();
    }

    pub fn begin_editing(&mut self) {
        self.tracker.begin(self.buffer.text());
    }

    /// Apply an edit. Starts an editing session if none is active and
    /// rebases queued suggestions past the change.
    pub fn edit(&mut self, edit: TextEdit) -> Result<EditEvent> {
        if !self.tracker.is_active() {
            self.begin_editing();
        }
        let event = self.buffer.apply(&edit)?;
        self.tracker.record(&event);
        if !self.queue.is_empty() {
            self.queue.rebase(&event, &self.buffer);
        }
        Ok(event)
    }

    /// End the editing session without matching.
    pub fn take_batch(&mut self) -> Option<EditBatch> {
        self.tracker.finish()
    }

    /// End the editing session and queue the suggestions it produced.
    pub fn finish_editing(&mut self) -> Vec<Suggestion> {
        let Some(batch) = self.take_batch() else {
            return Vec::new();
        };
        let prediction = predict_batch(
            &self.matcher,
            &self.engine,
            &batch,
            self.buffer.language(),
            self.buffer.version(),
        );
        let suggestions = prediction.suggestions.clone();
        self.accept_prediction(prediction);
        suggestions
    }

    /// Queue a prediction computed elsewhere. Returns false, and drops it,
    /// when the buffer moved on since the prediction was started.
    pub fn accept_prediction(&mut self, prediction: Prediction) -> bool {
        if prediction.version != self.buffer.version() {
            debug!(
                computed_for = prediction.version,
                current = self.buffer.version(),
                "dropping outdated prediction"
            );
            return false;
        }
        self.queue.clear();
        self.queue.extend(prediction.suggestions);
        self.queue.revalidate(&self.buffer);
        true
    }

    pub fn current(&mut self) -> Option<&Suggestion> {
        self.queue.current(&self.buffer)
    }

    /// Current suggestion with its virtual-text rendering.
    pub fn current_preview(&mut self) -> Option<(&Suggestion, VirtualText)> {
        let suggestion = self.queue.current(&self.buffer)?;
        let preview = self.engine.preview(suggestion, &self.buffer)?;
        Some((suggestion, preview))
    }

    /// Apply the current suggestion. An editing session still in progress
    /// is abandoned first.
    pub fn accept(&mut self) -> Result<AcceptOutcome> {
        if self.tracker.is_active() {
            debug!("accept during an editing session; discarding tracked edits");
            self.tracker.cancel();
        }
        self.queue.accept(&mut self.buffer)
    }

    pub fn skip(&mut self) -> Option<Suggestion> {
        self.queue.skip()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.tracker.cancel();
    }
}
