//! Adaptive checklist session.
//!
//! A session is a state machine `NotStarted -> InProgress -> Complete`
//! driven by one call per submitted answer. All per-participant state lives
//! in [`AdministrationState`], which the caller persists between turns and
//! passes back in; [`AdaptiveSession`] itself only holds read-only inputs.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bank::ItemBank;
use crate::error::{ScoringError, SessionError};
use crate::estimation::HillClimbingEstimator;
use crate::irt::standard_error;
use crate::norms::Demographics;
use crate::scoring::{latest_responses, VocabularyEstimate, WordResponse};
use crate::selection::{rank_by_information, select_from_ranking, select_max_information};
use crate::traits::{NoopObserver, SessionObserver, VocabularyScorer};

/// Configuration for the adaptive loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Number of distinct words to collect before scoring.
    pub quota: usize,
    /// Ability assumed before any answer; also where the fallback ranking
    /// is evaluated.
    pub start_theta: f64,
    /// Ability estimator settings.
    pub estimator: HillClimbingEstimator,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            quota: 25,
            start_theta: default_start_theta(),
            estimator: HillClimbingEstimator::default(),
        }
    }
}

fn default_start_theta() -> f64 {
    -5.0
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    InProgress,
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::NotStarted => write!(f, "not started"),
            Phase::InProgress => write!(f, "in progress"),
            Phase::Complete => write!(f, "complete"),
        }
    }
}

/// Everything one session needs to survive between turns.
///
/// Invariants (checked by [`AdministrationState::validate`]):
/// `administered` and `responses` have equal length, `administered` has no
/// duplicates, `turn == administered.len()`, and the open item is never
/// one that was already answered. The distinct-word count stays below
/// `quota` while in progress and reaches it on completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdministrationState {
    pub session_id: Uuid,
    pub phase: Phase,
    /// Distinct-word target captured when the session started.
    pub quota: usize,
    /// Starting ability captured when the session started. The fallback
    /// ranking is always evaluated here.
    #[serde(default = "default_start_theta")]
    pub start_theta: f64,
    /// Estimator settings captured when the session started.
    #[serde(default)]
    pub estimator: HillClimbingEstimator,
    /// Answered item indices in turn order.
    pub administered: Vec<usize>,
    /// Answers parallel to `administered`, as first given.
    pub responses: Vec<bool>,
    /// Current ability estimate; may be infinite.
    #[serde(with = "theta_serde")]
    pub theta: f64,
    pub turn: usize,
    /// The item currently shown and awaiting an answer.
    pub pending: Option<usize>,
    /// Every submission in arrival order, including resubmissions.
    pub answers: Vec<WordResponse>,
    /// Ability estimate after each turn.
    #[serde(with = "theta_serde::seq")]
    pub theta_history: Vec<f64>,
    #[serde(default)]
    pub demographics: Demographics,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub estimate: Option<VocabularyEstimate>,
    /// Why scoring failed, if it did. Answers are kept either way.
    pub scoring_error: Option<String>,
}

impl AdministrationState {
    /// A fresh, not-yet-started session.
    pub fn new(demographics: Demographics) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            phase: Phase::NotStarted,
            quota: 0,
            start_theta: default_start_theta(),
            estimator: HillClimbingEstimator::default(),
            administered: Vec::new(),
            responses: Vec::new(),
            theta: 0.0,
            turn: 0,
            pending: None,
            answers: Vec::new(),
            theta_history: Vec::new(),
            demographics,
            started_at: None,
            completed_at: None,
            estimate: None,
            scoring_error: None,
        }
    }

    /// Number of distinct words with at least one recorded answer.
    pub fn distinct_words(&self) -> usize {
        self.answers
            .iter()
            .map(|a| a.word.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Number of resubmissions for words that were already answered.
    pub fn resubmissions(&self) -> usize {
        self.answers.len() - self.distinct_words()
    }

    /// Check the state invariants against the bank it was built from.
    pub fn validate(&self, bank: &ItemBank) -> Result<(), SessionError> {
        let malformed = |msg: String| Err(SessionError::MalformedState(msg));

        if self.administered.len() != self.responses.len() {
            return malformed(format!(
                "{} administered items but {} responses",
                self.administered.len(),
                self.responses.len()
            ));
        }
        if self.turn != self.administered.len() {
            return malformed(format!(
                "turn counter {} does not match {} administered items",
                self.turn,
                self.administered.len()
            ));
        }
        if self.theta_history.len() != self.turn {
            return malformed(format!(
                "{} theta values recorded for {} turns",
                self.theta_history.len(),
                self.turn
            ));
        }

        let mut seen = HashSet::new();
        for &index in &self.administered {
            if index >= bank.len() {
                return malformed(format!("item index {index} outside bank of {}", bank.len()));
            }
            if !seen.insert(index) {
                return malformed(format!("item {index} administered twice"));
            }
        }

        if let Some(pending) = self.pending {
            if pending >= bank.len() {
                return malformed(format!("open item {pending} outside bank of {}", bank.len()));
            }
            if seen.contains(&pending) {
                return malformed(format!("open item {pending} was already answered"));
            }
        }

        for answer in &self.answers {
            match bank.index_of(&answer.word) {
                Some(index) if seen.contains(&index) => {}
                _ => return malformed(format!("answer for unadministered word {}", answer.word)),
            }
        }
        if self.distinct_words() != self.administered.len() {
            return malformed(format!(
                "{} distinct answered words for {} administered items",
                self.distinct_words(),
                self.administered.len()
            ));
        }

        if !self.start_theta.is_finite() {
            return malformed(format!("starting theta {} is not finite", self.start_theta));
        }

        let distinct = self.distinct_words();
        match (self.phase, self.pending) {
            (Phase::NotStarted, None) if self.turn == 0 => Ok(()),
            (Phase::NotStarted, _) => malformed("not-started session has progress".into()),
            (Phase::InProgress, None) => malformed("in-progress session has no open item".into()),
            (Phase::InProgress, Some(_)) if distinct < self.quota => Ok(()),
            (Phase::InProgress, Some(_)) => malformed(format!(
                "in-progress session already has {distinct} distinct answers for quota {}",
                self.quota
            )),
            (Phase::Complete, Some(_)) => malformed("complete session has an open item".into()),
            (Phase::Complete, None) if self.quota > 0 && distinct >= self.quota => Ok(()),
            (Phase::Complete, None) => malformed(format!(
                "complete session has {distinct} distinct answers for quota {}",
                self.quota
            )),
        }
    }

    /// Save the state as JSON.
    ///
    /// The file is written to a temporary sibling and renamed into place.
    /// Concurrent writers to the same path are not coordinated: the last
    /// rename wins.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize session state")?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .with_context(|| format!("failed to write session state to {}", path.display()))?;
        tmp.persist(path)
            .with_context(|| format!("failed to write session state to {}", path.display()))?;
        Ok(())
    }

    /// Load a state previously written by [`AdministrationState::save_json`].
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session state from {}", path.display()))?;
        let state: AdministrationState =
            serde_json::from_str(&content).context("failed to parse session state JSON")?;
        Ok(state)
    }
}

/// An item shown to the respondent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedItem {
    pub index: usize,
    pub word: String,
}

/// What a turn produced.
#[derive(Debug)]
pub enum TurnOutcome {
    /// A new item is open.
    NextItem(PresentedItem),
    /// A previously answered word was resubmitted. The new value counts for
    /// scoring; the open item and turn counter are unchanged.
    Duplicate { word: String, pending: PresentedItem },
    /// The quota was reached and the scorer ran. A scoring error withholds
    /// only the estimate.
    Complete {
        estimate: Result<VocabularyEstimate, ScoringError>,
    },
}

/// The updated state plus what happened.
#[derive(Debug)]
pub struct Turn {
    pub state: AdministrationState,
    pub outcome: TurnOutcome,
}

/// Drives sessions over one item bank.
pub struct AdaptiveSession<'a> {
    bank: &'a ItemBank,
    config: SessionConfig,
    initial_ranking: Vec<usize>,
    observer: &'a dyn SessionObserver,
}

impl<'a> AdaptiveSession<'a> {
    pub fn new(bank: &'a ItemBank, config: SessionConfig) -> Self {
        let initial_ranking = rank_by_information(bank, config.start_theta);
        if config.quota > bank.len() {
            tracing::warn!(
                quota = config.quota,
                items = bank.len(),
                "quota exceeds item bank size; sessions will exhaust the bank"
            );
        }
        Self {
            bank,
            config,
            initial_ranking,
            observer: &NoopObserver,
        }
    }

    /// Report progress to `observer`.
    pub fn with_observer(mut self, observer: &'a dyn SessionObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Item order used for the first item and while theta is infinite.
    pub fn initial_ranking(&self) -> &[usize] {
        &self.initial_ranking
    }

    /// The item awaiting an answer, if any.
    pub fn current_item(&self, state: &AdministrationState) -> Option<PresentedItem> {
        state.pending.and_then(|index| self.present(index))
    }

    /// Begin a session: open the top item of the information ranking at
    /// the starting ability.
    pub fn start(&self, demographics: Demographics) -> Result<Turn, SessionError> {
        if self.config.quota == 0 {
            return Err(SessionError::MalformedState("quota must be at least 1".into()));
        }

        let first = select_from_ranking(&self.initial_ranking, &[])?;
        let item = self
            .present(first)
            .ok_or(SessionError::ExhaustedBank { administered: 0 })?;

        let mut state = AdministrationState::new(demographics);
        state.phase = Phase::InProgress;
        state.quota = self.config.quota;
        state.start_theta = self.config.start_theta;
        state.estimator = self.config.estimator.clone();
        state.theta = self.config.start_theta;
        state.pending = Some(first);
        state.started_at = Some(Utc::now());

        tracing::info!(
            session = %state.session_id,
            word = %item.word,
            theta = state.theta,
            quota = state.quota,
            "session started"
        );
        self.observer
            .on_item_selected(0, &item.word, state.theta, false);

        Ok(Turn {
            state,
            outcome: TurnOutcome::NextItem(item),
        })
    }

    /// Record an answer and advance the session.
    ///
    /// Quota, starting theta, and estimator settings come from the state,
    /// so a session keeps the rules it was started with even if this
    /// `AdaptiveSession` was built from a different configuration.
    pub fn submit(
        &self,
        mut state: AdministrationState,
        word: &str,
        response: bool,
        scorer: &dyn VocabularyScorer,
    ) -> Result<Turn, SessionError> {
        state.validate(self.bank)?;
        match state.phase {
            Phase::NotStarted => return Err(SessionError::NotStarted),
            Phase::Complete => return Err(SessionError::AlreadyComplete),
            Phase::InProgress => {}
        }

        let index = self
            .bank
            .index_of(word)
            .ok_or_else(|| SessionError::UnknownItem(word.to_string()))?;
        let pending = state
            .pending
            .ok_or_else(|| SessionError::MalformedState("no open item".into()))?;
        let item = &self.bank.items()[index];
        let answer = WordResponse {
            word: item.word.clone(),
            word_id: item.word_id,
            response,
        };

        if index != pending {
            if !state.administered.contains(&index) {
                return Err(SessionError::NotAdministered(word.to_string()));
            }
            state.answers.push(answer);
            tracing::warn!(
                session = %state.session_id,
                word,
                response,
                "resubmitted answer recorded for scoring only"
            );
            self.observer.on_response(word, response, true);
            let pending = self
                .present(pending)
                .ok_or_else(|| SessionError::MalformedState("open item vanished".into()))?;
            return Ok(Turn {
                state,
                outcome: TurnOutcome::Duplicate {
                    word: word.to_string(),
                    pending,
                },
            });
        }

        state.answers.push(answer);
        state.administered.push(index);
        state.responses.push(response);
        state.turn += 1;
        state.pending = None;
        self.observer.on_response(word, response, false);

        state.theta = state.estimator.estimate(
            self.bank,
            &state.administered,
            &state.responses,
            state.theta,
        )?;
        state.theta_history.push(state.theta);

        let distinct = state.distinct_words();
        tracing::info!(
            session = %state.session_id,
            turn = state.turn,
            word,
            response,
            theta = state.theta,
            se = standard_error(state.theta, self.bank, &state.administered),
            distinct,
            "response recorded"
        );

        if distinct >= state.quota {
            return Ok(self.complete(state, scorer));
        }

        let (next, fallback) = self.select_next(&state)?;
        let item = self
            .present(next)
            .ok_or_else(|| SessionError::MalformedState(format!("selected item {next} missing")))?;
        state.pending = Some(next);
        self.observer
            .on_item_selected(state.turn, &item.word, state.theta, fallback);

        Ok(Turn {
            state,
            outcome: TurnOutcome::NextItem(item),
        })
    }

    fn select_next(&self, state: &AdministrationState) -> Result<(usize, bool), SessionError> {
        if state.theta.is_finite() {
            let next = select_max_information(self.bank, &state.administered, state.theta)?;
            Ok((next, false))
        } else {
            tracing::warn!(
                session = %state.session_id,
                theta = state.theta,
                "ability unbounded, falling back to starting ranking"
            );
            let next = select_from_ranking(&self.ranking_for(state), &state.administered)?;
            Ok((next, true))
        }
    }

    /// The fallback ranking at the state's own starting theta, which may
    /// differ from the one this session was configured with.
    fn ranking_for(&self, state: &AdministrationState) -> Cow<'_, [usize]> {
        if state.start_theta == self.config.start_theta {
            Cow::Borrowed(&self.initial_ranking)
        } else {
            Cow::Owned(rank_by_information(self.bank, state.start_theta))
        }
    }

    fn complete(&self, mut state: AdministrationState, scorer: &dyn VocabularyScorer) -> Turn {
        let latest = latest_responses(&state.answers);
        let estimate = scorer.score(&latest);

        state.phase = Phase::Complete;
        state.completed_at = Some(Utc::now());
        match &estimate {
            Ok(e) => {
                state.estimate = Some(e.clone());
                tracing::info!(
                    session = %state.session_id,
                    estimate = e.estimate,
                    raw_score = e.raw_score,
                    "session complete"
                );
            }
            Err(e) => {
                state.scoring_error = Some(e.to_string());
                tracing::error!(
                    session = %state.session_id,
                    "session complete but scoring failed: {e}"
                );
            }
        }
        self.observer.on_complete(state.turn, estimate.as_ref());

        Turn {
            state,
            outcome: TurnOutcome::Complete { estimate },
        }
    }

    fn present(&self, index: usize) -> Option<PresentedItem> {
        self.bank.word(index).map(|word| PresentedItem {
            index,
            word: word.to_string(),
        })
    }
}

/// JSON has no infinities; theta is written as a number or as `"inf"`,
/// `"-inf"`, or `"nan"`.
pub(crate) mod theta_serde {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    fn to_repr(value: f64) -> Repr {
        if value.is_finite() {
            Repr::Number(value)
        } else if value.is_nan() {
            Repr::Text("nan".into())
        } else if value > 0.0 {
            Repr::Text("inf".into())
        } else {
            Repr::Text("-inf".into())
        }
    }

    fn from_repr<E: Error>(repr: Repr) -> Result<f64, E> {
        match repr {
            Repr::Number(v) => Ok(v),
            Repr::Text(s) => match s.as_str() {
                "inf" | "+inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(E::custom(format!("invalid theta value: {other}"))),
            },
        }
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        to_repr(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        from_repr(Repr::deserialize(deserializer)?)
    }

    pub mod seq {
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        use super::{from_repr, to_repr, Repr};

        pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
            values
                .iter()
                .map(|&v| to_repr(v))
                .collect::<Vec<_>>()
                .serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Vec<f64>, D::Error> {
            Vec::<Repr>::deserialize(deserializer)?
                .into_iter()
                .map(from_repr)
                .collect()
        }
    }
}
