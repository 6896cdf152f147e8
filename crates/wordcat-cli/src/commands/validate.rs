//! The `wordcat validate` command.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;

use wordcat_core::bank::{load_instrument, validate_bank};
use wordcat_core::norms::{load_norms, validate_norms, Sex};

pub fn execute(instrument_path: PathBuf, norms_path: Option<PathBuf>) -> Result<()> {
    let instrument = load_instrument(&instrument_path)?;
    println!(
        "Instrument: {} ({} items)",
        instrument.info.name,
        instrument.bank.len()
    );

    let mut warnings = validate_bank(&instrument.bank);

    if let Some(path) = &norms_path {
        let norms = load_norms(path)?;
        println!(
            "Norms: {} female rows, {} male rows",
            norms.female.len(),
            norms.male.len()
        );
        warnings.extend(validate_norms(&norms));

        for sex in [Sex::Female, Sex::Male] {
            let ids: HashSet<u32> = norms.table(sex).words.iter().map(|r| r.word_id).collect();
            for item in instrument.bank.items() {
                if !ids.contains(&item.word_id) {
                    warnings.push(wordcat_core::bank::ValidationWarning {
                        word: Some(item.word.clone()),
                        message: format!(
                            "word_id {} has no row in the {sex} norm table",
                            item.word_id
                        ),
                    });
                }
            }
        }
    }

    for w in &warnings {
        let prefix = w
            .word
            .as_ref()
            .map(|word| format!("  [{word}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("All files valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
