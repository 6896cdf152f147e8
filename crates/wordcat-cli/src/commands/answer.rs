//! The `wordcat answer` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use wordcat_core::bank::load_instrument;
use wordcat_core::norms::load_norms;
use wordcat_core::report::SessionReport;
use wordcat_core::scoring::NormScorer;
use wordcat_core::session::{AdaptiveSession, AdministrationState, TurnOutcome};

use super::ConsoleObserver;

pub fn execute(
    state_path: PathBuf,
    word: String,
    response: bool,
    instrument_flag: Option<PathBuf>,
    norms_flag: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = super::config(config_path.as_deref())?;
    let instrument = load_instrument(&super::instrument_path(instrument_flag, &config)?)?;
    let norms = load_norms(&super::norms_path(norms_flag, &config)?)?;
    let state = AdministrationState::load_json(&state_path)?;

    let scorer = NormScorer::new(&norms, state.demographics.clone());
    let session = AdaptiveSession::new(&instrument.bank, config.session_config())
        .with_observer(&ConsoleObserver);

    let turn = session
        .submit(state, &word, response, &scorer)
        .with_context(|| format!("failed to record answer for '{word}'"))?;
    turn.state.save_json(&state_path)?;
    tracing::debug!(state = %state_path.display(), turn = turn.state.turn, "state saved");

    match &turn.outcome {
        TurnOutcome::NextItem(item) => {
            println!(
                "Turn {} of {}. Next word: {}",
                turn.state.turn, turn.state.quota, item.word
            );
        }
        TurnOutcome::Duplicate { word, pending } => {
            println!("Updated earlier answer for {word}. Next word: {}", pending.word);
        }
        TurnOutcome::Complete { estimate } => {
            let report = SessionReport::from_state(&turn.state, &instrument)
                .context("failed to build completion report")?;
            let report_path = super::report_path(&state_path);
            report.save_json(&report_path)?;

            match estimate {
                Ok(e) => {
                    println!("Session complete after {} turns.", turn.state.turn);
                    println!(
                        "Vocabulary estimate: {:.1} words (raw score {}, range {}-{})",
                        e.estimate, e.raw_score, e.floor_raw_score, e.ceiling_raw_score
                    );
                }
                Err(e) => {
                    println!("Session complete after {} turns.", turn.state.turn);
                    println!("No estimate: {e}");
                }
            }
            println!("Report: {}", report_path.display());
        }
    }

    Ok(())
}
