//! The `wordcat score` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use wordcat_core::norms::{load_norms, Demographics};
use wordcat_core::scoring::{latest_responses, NormScorer, WordResponse};
use wordcat_core::traits::VocabularyScorer;

pub fn execute(
    responses_path: PathBuf,
    age: u32,
    sex: String,
    norms_flag: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = super::config(config_path.as_deref())?;
    let norms = load_norms(&super::norms_path(norms_flag, &config)?)?;

    let content = std::fs::read_to_string(&responses_path)
        .with_context(|| format!("failed to read responses: {}", responses_path.display()))?;
    let answers: Vec<WordResponse> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse responses JSON: {}", responses_path.display()))?;
    let responses = latest_responses(&answers);

    let demographics = Demographics {
        age_months: Some(age),
        sex: super::parse_sex(Some(sex))?,
    };
    let estimate = NormScorer::new(&norms, demographics)
        .score(&responses)
        .context("scoring failed")?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&estimate)?),
        "text" => {
            println!(
                "Vocabulary estimate: {:.1} words (raw score {})",
                estimate.estimate, estimate.raw_score
            );
            println!(
                "Floor {} / ceiling {} raw score from {} responses",
                estimate.floor_raw_score, estimate.ceiling_raw_score, estimate.responses_used
            );
        }
        other => anyhow::bail!("unknown format: {other} (expected text or json)"),
    }

    Ok(())
}
