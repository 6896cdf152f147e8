//! Seams between the adaptive session and its collaborators.
//!
//! The session calls a [`VocabularyScorer`] once when the quota is reached
//! and reports progress through a [`SessionObserver`].

use crate::error::ScoringError;
use crate::scoring::{VocabularyEstimate, WordResponse};

/// Turns the deduplicated answers of a finished session into an estimate.
pub trait VocabularyScorer {
    fn score(&self, responses: &[WordResponse]) -> Result<VocabularyEstimate, ScoringError>;
}

/// Progress reporting for an adaptive session.
pub trait SessionObserver {
    /// A new item was opened. `fallback` is set when it came from the
    /// low-ability ranking because theta was infinite.
    fn on_item_selected(&self, turn: usize, word: &str, theta: f64, fallback: bool);
    fn on_response(&self, word: &str, response: bool, duplicate: bool);
    fn on_complete(&self, turns: usize, outcome: Result<&VocabularyEstimate, &ScoringError>);
}

/// No-op observer.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_item_selected(&self, _: usize, _: &str, _: f64, _: bool) {}
    fn on_response(&self, _: &str, _: bool, _: bool) {}
    fn on_complete(&self, _: usize, _: Result<&VocabularyEstimate, &ScoringError>) {}
}
