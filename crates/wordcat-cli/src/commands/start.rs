//! The `wordcat start` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use wordcat_core::bank::load_instrument;
use wordcat_core::norms::Demographics;
use wordcat_core::session::{AdaptiveSession, TurnOutcome};

use super::ConsoleObserver;

pub fn execute(
    state_path: Option<PathBuf>,
    instrument_flag: Option<PathBuf>,
    age: Option<u32>,
    sex: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = super::config(config_path.as_deref())?;
    let instrument = load_instrument(&super::instrument_path(instrument_flag, &config)?)?;

    let demographics = Demographics {
        age_months: age,
        sex: super::parse_sex(sex)?,
    };
    if demographics.age_months.is_none() || demographics.sex.is_none() {
        eprintln!("Warning: age or sex missing; the session can run but will not be scored.");
    }

    let session = AdaptiveSession::new(&instrument.bank, config.session_config())
        .with_observer(&ConsoleObserver);
    let turn = session
        .start(demographics)
        .context("failed to start session")?;

    let path = state_path.unwrap_or_else(|| {
        config
            .state_dir
            .join(format!("{}.json", turn.state.session_id))
    });
    if path.exists() {
        anyhow::bail!(
            "state file already exists: {} (remove it or pick another path)",
            path.display()
        );
    }
    turn.state.save_json(&path)?;

    println!("Session {} started ({})", turn.state.session_id, instrument.info.name);
    println!("State: {}", path.display());
    if let TurnOutcome::NextItem(item) = &turn.outcome {
        println!("Next word: {}", item.word);
    }

    Ok(())
}
