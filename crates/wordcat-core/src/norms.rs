//! Age- and sex-stratified norm tables for vocabulary-size scoring.
//!
//! A norm file is JSON with one table per sex. Each table has one row per
//! vocabulary-bank word, keyed by `word_id`, holding the producer and
//! non-producer normal parameters for every normed age (whole months), plus
//! per-age `bmin` and `slope` rescaling constants.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::bank::ValidationWarning;

/// Participant sex, used only to pick a norm table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Female => write!(f, "female"),
            Sex::Male => write!(f, "male"),
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "female" | "f" | "girl" => Ok(Sex::Female),
            "male" | "m" | "boy" => Ok(Sex::Male),
            other => Err(format!("unknown sex: {other}")),
        }
    }
}

/// Demographic answers collected before the checklist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    /// Age in whole months.
    #[serde(default)]
    pub age_months: Option<u32>,
    #[serde(default)]
    pub sex: Option<Sex>,
}

/// Normal-distribution parameters of one word at one age.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WordNorm {
    /// Mean vocabulary size of children who produce the word.
    pub p_mean: f64,
    pub p_sd: f64,
    /// Mean vocabulary size of children who do not produce the word.
    pub np_mean: f64,
    pub np_sd: f64,
}

impl WordNorm {
    pub(crate) fn is_valid(&self) -> bool {
        [self.p_mean, self.p_sd, self.np_mean, self.np_sd]
            .iter()
            .all(|v| v.is_finite())
            && self.p_sd > 0.0
            && self.np_sd > 0.0
    }
}

/// One word's norms across ages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormRow {
    pub word_id: u32,
    pub ages: BTreeMap<u32, WordNorm>,
}

/// Norm table for one sex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormTable {
    pub words: Vec<NormRow>,
    pub bmin: BTreeMap<u32, f64>,
    pub slope: BTreeMap<u32, f64>,
}

impl NormTable {
    /// Number of words in the table; raw scores range over `0..=len()`.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn row(&self, word_id: u32) -> Option<&NormRow> {
        self.words.iter().find(|row| row.word_id == word_id)
    }

    /// `(bmin, slope)` for an age.
    pub fn scale(&self, age: u32) -> Option<(f64, f64)> {
        Some((*self.bmin.get(&age)?, *self.slope.get(&age)?))
    }
}

/// The female and male norm tables of one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormSet {
    pub female: NormTable,
    pub male: NormTable,
}

impl NormSet {
    pub fn table(&self, sex: Sex) -> &NormTable {
        match sex {
            Sex::Female => &self.female,
            Sex::Male => &self.male,
        }
    }
}

/// Load a norm set from a JSON file.
pub fn load_norms(path: &Path) -> Result<NormSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read norms file: {}", path.display()))?;
    let norms: NormSet = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse norms JSON: {}", path.display()))?;
    Ok(norms)
}

/// Check a norm set for rows and constants the estimator cannot use.
pub fn validate_norms(norms: &NormSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for sex in [Sex::Female, Sex::Male] {
        let table = norms.table(sex);
        let mut seen_ids = HashSet::new();
        let mut ages = HashSet::new();

        if table.is_empty() {
            warnings.push(ValidationWarning {
                word: None,
                message: format!("{sex} table has no words"),
            });
        }

        for row in &table.words {
            if !seen_ids.insert(row.word_id) {
                warnings.push(ValidationWarning {
                    word: Some(row.word_id.to_string()),
                    message: format!("{sex} table: duplicate word_id {}", row.word_id),
                });
            }
            for (&age, norm) in &row.ages {
                ages.insert(age);
                if !norm.is_valid() {
                    warnings.push(ValidationWarning {
                        word: Some(row.word_id.to_string()),
                        message: format!(
                            "{sex} table: invalid parameters at age {age} (sd must be positive)"
                        ),
                    });
                }
            }
        }

        let mut ages: Vec<u32> = ages.into_iter().collect();
        ages.sort_unstable();
        for age in ages {
            match table.scale(age) {
                None => warnings.push(ValidationWarning {
                    word: None,
                    message: format!("{sex} table: missing bmin or slope for age {age}"),
                }),
                Some((_, slope)) if slope == 0.0 || !slope.is_finite() => {
                    warnings.push(ValidationWarning {
                        word: None,
                        message: format!("{sex} table: unusable slope {slope} for age {age}"),
                    })
                }
                Some(_) => {}
            }
        }
    }

    warnings
}
