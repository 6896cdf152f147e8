//! Item bank and instrument definition loading.
//!
//! An instrument is a TOML file with an `[instrument]` header and one
//! `[[items]]` table per word. Row order is the item index.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::BankError;
use crate::irt::ItemParams;

/// A single checklist word with its calibrated IRT parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Word label shown to the respondent.
    pub word: String,
    /// Key into the norm tables (independent of the item index).
    pub word_id: u32,
    /// 4PL parameters.
    pub params: ItemParams,
}

/// Instrument metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentInfo {
    /// Unique identifier for this instrument.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of the instrument.
    #[serde(default)]
    pub description: String,
}

/// Ordered, immutable set of items. Index `i` is item `i`.
#[derive(Debug, Clone)]
pub struct ItemBank {
    items: Vec<Item>,
    by_word: HashMap<String, usize>,
}

impl ItemBank {
    /// Build a bank, rejecting empty banks and duplicate word labels.
    pub fn new(items: Vec<Item>) -> Result<Self, BankError> {
        if items.is_empty() {
            return Err(BankError::Empty);
        }
        let mut by_word = HashMap::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if by_word.insert(item.word.clone(), index).is_some() {
                return Err(BankError::DuplicateWord(item.word.clone()));
            }
        }
        Ok(Self { items, by_word })
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// Item index for a word label.
    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.by_word.get(word).copied()
    }

    /// Word label for an item index.
    pub fn word(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(|item| item.word.as_str())
    }
}

/// A loaded instrument: metadata plus its item bank.
#[derive(Debug, Clone)]
pub struct Instrument {
    pub info: InstrumentInfo,
    pub bank: ItemBank,
}

#[derive(Debug, Deserialize)]
struct TomlInstrumentFile {
    instrument: InstrumentInfo,
    #[serde(default)]
    items: Vec<TomlItem>,
}

#[derive(Debug, Deserialize)]
struct TomlItem {
    word: String,
    word_id: u32,
    a: f64,
    b: f64,
    #[serde(default)]
    c: f64,
    #[serde(default = "default_upper")]
    d: f64,
}

fn default_upper() -> f64 {
    1.0
}

/// Parse an instrument TOML file.
pub fn load_instrument(path: &Path) -> Result<Instrument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read instrument file: {}", path.display()))?;

    parse_instrument_str(&content, path)
}

/// Parse instrument TOML from a string (useful for testing).
pub fn parse_instrument_str(content: &str, source_path: &Path) -> Result<Instrument> {
    let parsed: TomlInstrumentFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let items = parsed
        .items
        .into_iter()
        .map(|row| Item {
            word: row.word,
            word_id: row.word_id,
            params: ItemParams::new(row.a, row.b, row.c, row.d),
        })
        .collect();

    let bank = ItemBank::new(items)
        .with_context(|| format!("invalid item bank in {}", source_path.display()))?;

    tracing::debug!(
        instrument = %parsed.instrument.id,
        items = bank.len(),
        "loaded instrument"
    );

    Ok(Instrument {
        info: parsed.instrument,
        bank,
    })
}

/// A warning from instrument or norm-table validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The word (if applicable).
    pub word: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check an item bank for parameters the 4PL model cannot use sensibly.
pub fn validate_bank(bank: &ItemBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for item in bank.items() {
        if !seen_ids.insert(item.word_id) {
            warnings.push(ValidationWarning {
                word: Some(item.word.clone()),
                message: format!("duplicate word_id: {}", item.word_id),
            });
        }
    }

    for item in bank.items() {
        let p = &item.params;
        let mut problem = |message: String| {
            warnings.push(ValidationWarning {
                word: Some(item.word.clone()),
                message,
            })
        };

        if !p.is_finite() {
            problem("parameters must be finite numbers".into());
            continue;
        }
        if p.a <= 0.0 {
            problem(format!("discrimination must be positive, got {}", p.a));
        }
        if !(0.0..1.0).contains(&p.c) {
            problem(format!("lower asymptote c must be in [0, 1), got {}", p.c));
        }
        if p.d <= p.c || p.d > 1.0 {
            problem(format!("upper asymptote d must be in (c, 1], got {}", p.d));
        }
    }

    warnings
}
