pub mod answer;
pub mod init;
pub mod rank;
pub mod score;
pub mod show;
pub mod start;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use wordcat_core::config::{load_config_from, WordcatConfig};
use wordcat_core::error::ScoringError;
use wordcat_core::norms::Sex;
use wordcat_core::scoring::VocabularyEstimate;
use wordcat_core::traits::SessionObserver;

/// Console progress observer.
pub struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_item_selected(&self, turn: usize, word: &str, theta: f64, fallback: bool) {
        let source = if fallback { " (starting ranking)" } else { "" };
        eprintln!("  Turn {}: {word} at theta {}{source}", turn + 1, fmt_theta(theta));
    }

    fn on_response(&self, word: &str, response: bool, duplicate: bool) {
        let answer = if response { "yes" } else { "no" };
        if duplicate {
            eprintln!("  Updated: {word} = {answer} (scoring only)");
        } else {
            eprintln!("  Recorded: {word} = {answer}");
        }
    }

    fn on_complete(&self, turns: usize, outcome: Result<&VocabularyEstimate, &ScoringError>) {
        match outcome {
            Ok(e) => eprintln!("\nComplete after {turns} turns: raw score {}", e.raw_score),
            Err(e) => eprintln!("\nComplete after {turns} turns, scoring failed: {e}"),
        }
    }
}

/// Load config from an explicit path or the default search locations.
pub fn config(path: Option<&Path>) -> Result<WordcatConfig> {
    load_config_from(path)
}

/// The instrument to use: the flag if given, else the config entry.
pub fn instrument_path(flag: Option<PathBuf>, config: &WordcatConfig) -> Result<PathBuf> {
    flag.or_else(|| config.instrument.clone())
        .context("no instrument given; pass --instrument or set `instrument` in wordcat.toml")
}

/// The norms file to use: the flag if given, else the config entry.
pub fn norms_path(flag: Option<PathBuf>, config: &WordcatConfig) -> Result<PathBuf> {
    flag.or_else(|| config.norms.clone())
        .context("no norms file given; pass --norms or set `norms` in wordcat.toml")
}

pub fn parse_sex(value: Option<String>) -> Result<Option<Sex>> {
    value
        .map(|s| s.parse::<Sex>().map_err(anyhow::Error::msg))
        .transpose()
}

/// Where the completion report for a state file goes.
pub fn report_path(state_path: &Path) -> PathBuf {
    state_path.with_extension("report.json")
}

pub fn fmt_theta(theta: f64) -> String {
    if theta.is_finite() {
        format!("{theta:.3}")
    } else if theta > 0.0 {
        "+inf".to_string()
    } else {
        "-inf".to_string()
    }
}
