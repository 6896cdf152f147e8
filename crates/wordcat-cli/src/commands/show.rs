//! The `wordcat show` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use wordcat_core::bank::load_instrument;
use wordcat_core::session::AdministrationState;

use super::fmt_theta;

pub fn execute(
    state_path: PathBuf,
    instrument_flag: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let state = AdministrationState::load_json(&state_path)?;

    println!("Session {} ({})", state.session_id, state.phase);
    println!(
        "Turn {} of {}, theta {}, {} resubmission(s)",
        state.turn,
        state.quota,
        fmt_theta(state.theta),
        state.resubmissions()
    );

    if !state.answers.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["#", "Word", "Answer"]);
        for (i, answer) in state.answers.iter().enumerate() {
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(&answer.word),
                Cell::new(if answer.response { "yes" } else { "no" }),
            ]);
        }
        println!("{table}");
    }

    if let Some(e) = &state.estimate {
        println!(
            "Vocabulary estimate: {:.1} words (raw score {})",
            e.estimate, e.raw_score
        );
    } else if let Some(err) = &state.scoring_error {
        println!("Scoring failed: {err}");
    } else if let Some(pending) = state.pending {
        // The word label needs the instrument; fall back to the item index.
        let word = super::config(config_path.as_deref())
            .and_then(|config| super::instrument_path(instrument_flag, &config))
            .and_then(|path| load_instrument(&path))
            .ok()
            .and_then(|instrument| instrument.bank.word(pending).map(str::to_string));
        match word {
            Some(word) => println!("Awaiting an answer for: {word}"),
            None => println!("Awaiting an answer for item {pending}"),
        }
    }

    Ok(())
}
