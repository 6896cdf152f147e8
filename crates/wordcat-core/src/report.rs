//! Completion report for a finished session.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bank::Instrument;
use crate::error::SessionError;
use crate::irt::standard_error;
use crate::norms::Demographics;
use crate::scoring::{latest_responses, VocabularyEstimate, WordResponse};
use crate::session::{theta_serde, AdministrationState, Phase};

/// Everything worth keeping once a session is complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique report identifier.
    pub id: Uuid,
    pub session_id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub instrument: InstrumentSummary,
    pub demographics: Demographics,
    pub turns: usize,
    #[serde(with = "theta_serde")]
    pub final_theta: f64,
    /// Standard error of the final theta; infinite while theta is unbounded.
    #[serde(with = "theta_serde")]
    pub standard_error: f64,
    /// Items in the order they were administered, with the first answer.
    pub administered: Vec<AdministeredItem>,
    /// The answers used for scoring, one per word.
    pub latest: Vec<WordResponse>,
    /// Submissions that overwrote an earlier answer.
    pub resubmissions: usize,
    pub estimate: Option<VocabularyEstimate>,
    pub scoring_error: Option<String>,
}

/// Summary of an instrument (without its item parameters).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentSummary {
    pub id: String,
    pub name: String,
    pub item_count: usize,
}

/// One turn of the adaptive loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdministeredItem {
    pub turn: usize,
    pub word: String,
    pub word_id: u32,
    pub response: bool,
    #[serde(with = "theta_serde")]
    pub theta_after: f64,
}

impl SessionReport {
    /// Build a report from a completed session.
    pub fn from_state(
        state: &AdministrationState,
        instrument: &Instrument,
    ) -> Result<Self, SessionError> {
        let bank = &instrument.bank;
        state.validate(bank)?;
        if state.phase != Phase::Complete {
            return Err(SessionError::MalformedState(format!(
                "cannot report on a session that is {}",
                state.phase
            )));
        }

        let administered = state
            .administered
            .iter()
            .zip(&state.responses)
            .zip(&state.theta_history)
            .enumerate()
            .filter_map(|(turn, ((&index, &response), &theta))| {
                bank.get(index).map(|item| AdministeredItem {
                    turn: turn + 1,
                    word: item.word.clone(),
                    word_id: item.word_id,
                    response,
                    theta_after: theta,
                })
            })
            .collect();

        Ok(Self {
            id: Uuid::new_v4(),
            session_id: state.session_id,
            created_at: Utc::now(),
            started_at: state.started_at,
            completed_at: state.completed_at,
            instrument: InstrumentSummary {
                id: instrument.info.id.clone(),
                name: instrument.info.name.clone(),
                item_count: bank.len(),
            },
            demographics: state.demographics.clone(),
            turns: state.turn,
            final_theta: state.theta,
            standard_error: standard_error(state.theta, bank, &state.administered),
            administered,
            latest: latest_responses(&state.answers),
            resubmissions: state.resubmissions(),
            estimate: state.estimate.clone(),
            scoring_error: state.scoring_error.clone(),
        })
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## Session {}\n\n", self.session_id));
        md.push_str(&format!(
            "**Instrument:** {} ({}, {} items)\n\n",
            self.instrument.name, self.instrument.id, self.instrument.item_count
        ));

        let age = self
            .demographics
            .age_months
            .map(|a| format!("{a} months"))
            .unwrap_or_else(|| "unknown".to_string());
        let sex = self
            .demographics
            .sex
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        md.push_str(&format!("**Age:** {age} | **Sex:** {sex}\n\n"));

        md.push_str(&format!(
            "**Summary:** {} turns, final theta {}, SE {}, {} resubmissions\n\n",
            self.turns,
            fmt_theta(self.final_theta),
            fmt_theta(self.standard_error),
            self.resubmissions
        ));

        match (&self.estimate, &self.scoring_error) {
            (Some(e), _) => {
                md.push_str("### Estimate\n\n");
                md.push_str("| Raw score | Vocabulary | Floor | Ceiling | Responses |\n");
                md.push_str("|-----------|------------|-------|---------|-----------|\n");
                md.push_str(&format!(
                    "| {} | {:.1} | {} | {} | {} |\n\n",
                    e.raw_score,
                    e.estimate,
                    e.floor_raw_score,
                    e.ceiling_raw_score,
                    e.responses_used
                ));
            }
            (None, Some(err)) => {
                md.push_str(&format!("**Scoring failed:** {err}\n\n"));
            }
            (None, None) => {}
        }

        if !self.administered.is_empty() {
            md.push_str("### Items\n\n");
            md.push_str("| Turn | Word | Response | Theta |\n");
            md.push_str("|------|------|----------|-------|\n");
            for item in &self.administered {
                md.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    item.turn,
                    item.word,
                    if item.response { "yes" } else { "no" },
                    fmt_theta(item.theta_after)
                ));
            }
        }

        md
    }
}

fn fmt_theta(theta: f64) -> String {
    if theta.is_finite() {
        format!("{theta:.3}")
    } else if theta > 0.0 {
        "+inf".to_string()
    } else {
        "-inf".to_string()
    }
}
