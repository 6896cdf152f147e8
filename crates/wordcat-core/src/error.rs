//! Engine error types.
//!
//! Adaptive-loop failures (`SessionError`) abort the session. Scoring
//! failures (`ScoringError`) only withhold the vocabulary estimate; the
//! collected responses stay intact.

use thiserror::Error;

/// Errors raised while constructing an item bank.
#[derive(Debug, Error)]
pub enum BankError {
    /// The bank has no items.
    #[error("item bank is empty")]
    Empty,

    /// Two items share the same word label.
    #[error("duplicate word in item bank: {0}")]
    DuplicateWord(String),
}

/// Errors that abort an adaptive session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Every item in the bank has already been administered.
    #[error("item bank exhausted after {administered} items")]
    ExhaustedBank { administered: usize },

    /// The submitted word is not part of the item bank.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// The submitted word is in the bank but was never presented.
    #[error("word was not administered in this session: {0}")]
    NotAdministered(String),

    /// A response arrived before the session was started.
    #[error("session has not been started")]
    NotStarted,

    /// A response arrived after the quota was reached.
    #[error("session is already complete")]
    AlreadyComplete,

    /// Persisted state violates one of the state invariants.
    #[error("malformed session state: {0}")]
    MalformedState(String),
}

impl SessionError {
    /// Returns `true` if the error points at the instrument or deployment
    /// rather than at a single participant's input.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, SessionError::ExhaustedBank { .. })
    }
}

/// Errors raised by the vocabulary-size estimator.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// A demographic answer needed to pick a norm table is missing.
    #[error("missing demographic answer: {0}")]
    MissingDemographic(&'static str),

    /// A word has no row in the norm table.
    #[error("word not found in norm table: {0}")]
    UnknownWord(String),

    /// The norm table has no column for this age.
    #[error("no norms for age {age} months")]
    AgeNotNormed { age: u32 },

    /// `bmin` or `slope` is missing (or the slope is zero) for this age.
    #[error("no usable rescaling constants for age {age} months")]
    MissingScale { age: u32 },

    /// A norm row has a non-positive or non-finite parameter.
    #[error("invalid norm parameters for word {word_id} at age {age}")]
    InvalidNorm { word_id: u32, age: u32 },
}

impl ScoringError {
    /// Returns `true` if the norm tables themselves are at fault (missing
    /// rows, bad constants) as opposed to the participant's data.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ScoringError::AgeNotNormed { .. }
                | ScoringError::MissingScale { .. }
                | ScoringError::InvalidNorm { .. }
        )
    }
}
