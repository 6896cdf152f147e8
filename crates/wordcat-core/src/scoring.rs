//! Vocabulary-size estimation from norm tables (Mayor & Mani, 2019).
//!
//! For every hypothetical raw vocabulary size `B = 0..=N` the estimator
//! sums the log-density of each observed answer under that word's
//! age-specific producer or non-producer normal distribution, takes the
//! most likely `B`, and rescales it with the per-age `bmin` and `slope`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::norms::{Demographics, NormSet, NormTable, Sex, WordNorm};
use crate::traits::VocabularyScorer;

const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

/// One checklist answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordResponse {
    pub word: String,
    pub word_id: u32,
    /// `true` if the child produces (or understands) the word.
    pub response: bool,
}

/// Result of the vocabulary-size estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEstimate {
    /// Most likely raw vocabulary size.
    pub raw_score: usize,
    /// Calibrated estimate, `(raw_score - bmin) / slope`.
    pub estimate: f64,
    /// Most likely raw size had every answer been "no".
    pub floor_raw_score: usize,
    /// Most likely raw size had every answer been "yes".
    pub ceiling_raw_score: usize,
    /// Number of distinct words that entered the likelihood.
    pub responses_used: usize,
    pub age_months: u32,
    #[serde(default)]
    pub sex: Option<Sex>,
}

/// Collapse a submission log to one answer per word, keeping the latest.
///
/// Output follows the order in which each word was first answered.
pub fn latest_responses(answers: &[WordResponse]) -> Vec<WordResponse> {
    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut latest: Vec<WordResponse> = Vec::new();
    for answer in answers {
        match position.get(answer.word.as_str()) {
            Some(&i) => latest[i].response = answer.response,
            None => {
                position.insert(answer.word.as_str(), latest.len());
                latest.push(answer.clone());
            }
        }
    }
    latest
}

/// Natural log of the normal density, computed without forming the density.
pub fn log_normal_pdf(x: f64, mean: f64, sd: f64) -> f64 {
    let z = (x - mean) / sd;
    -0.5 * z * z - sd.ln() - LN_SQRT_2PI
}

/// Index of the first maximum.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

fn accumulate(surface: &mut [f64], mean: f64, sd: f64) {
    for (b, value) in surface.iter_mut().enumerate() {
        *value += log_normal_pdf(b as f64, mean, sd);
    }
}

/// Estimate vocabulary size for one participant.
///
/// `responses` must already be deduplicated (see [`latest_responses`]).
pub fn estimate_vocabulary(
    table: &NormTable,
    age: u32,
    responses: &[WordResponse],
) -> Result<VocabularyEstimate, ScoringError> {
    let (bmin, slope) = table
        .scale(age)
        .filter(|&(bmin, slope)| bmin.is_finite() && slope.is_finite() && slope != 0.0)
        .ok_or(ScoringError::MissingScale { age })?;

    let norms: Vec<(&WordResponse, &WordNorm)> = responses
        .iter()
        .map(|r| {
            let row = table
                .row(r.word_id)
                .ok_or_else(|| ScoringError::UnknownWord(r.word.clone()))?;
            let norm = row
                .ages
                .get(&age)
                .ok_or(ScoringError::AgeNotNormed { age })?;
            if !norm.is_valid() {
                return Err(ScoringError::InvalidNorm {
                    word_id: r.word_id,
                    age,
                });
            }
            Ok((r, norm))
        })
        .collect::<Result<_, _>>()?;

    let size = table.len() + 1;
    let mut basis = vec![0.0; size];
    let mut min_score = vec![0.0; size];
    let mut max_score = vec![0.0; size];

    for (response, norm) in &norms {
        if response.response {
            accumulate(&mut basis, norm.p_mean, norm.p_sd);
        } else {
            accumulate(&mut basis, norm.np_mean, norm.np_sd);
        }
        accumulate(&mut min_score, norm.np_mean, norm.np_sd);
        accumulate(&mut max_score, norm.p_mean, norm.p_sd);
    }

    let raw_score = argmax(&basis);
    let estimate = (raw_score as f64 - bmin) / slope;

    tracing::info!(
        raw_score,
        estimate,
        responses = norms.len(),
        age,
        "vocabulary estimate computed"
    );

    Ok(VocabularyEstimate {
        raw_score,
        estimate,
        floor_raw_score: argmax(&min_score),
        ceiling_raw_score: argmax(&max_score),
        responses_used: norms.len(),
        age_months: age,
        sex: None,
    })
}

/// Scores a participant against the norm table for their sex and age.
pub struct NormScorer<'a> {
    norms: &'a NormSet,
    demographics: Demographics,
}

impl<'a> NormScorer<'a> {
    pub fn new(norms: &'a NormSet, demographics: Demographics) -> Self {
        Self {
            norms,
            demographics,
        }
    }
}

impl VocabularyScorer for NormScorer<'_> {
    fn score(&self, responses: &[WordResponse]) -> Result<VocabularyEstimate, ScoringError> {
        let age = self
            .demographics
            .age_months
            .ok_or(ScoringError::MissingDemographic("age"))?;
        let sex = self
            .demographics
            .sex
            .ok_or(ScoringError::MissingDemographic("sex"))?;

        let mut estimate = estimate_vocabulary(self.norms.table(sex), age, responses)?;
        estimate.sex = Some(sex);
        Ok(estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::norms::NormRow;
    use std::collections::BTreeMap;

    fn answer(word: &str, word_id: u32, response: bool) -> WordResponse {
        WordResponse {
            word: word.into(),
            word_id,
            response,
        }
    }

    fn table(words: &[(u32, WordNorm)], age: u32, bmin: f64, slope: f64) -> NormTable {
        NormTable {
            words: words
                .iter()
                .map(|&(word_id, norm)| NormRow {
                    word_id,
                    ages: BTreeMap::from([(age, norm)]),
                })
                .collect(),
            bmin: BTreeMap::from([(age, bmin)]),
            slope: BTreeMap::from([(age, slope)]),
        }
    }

    fn norm(p_mean: f64, np_mean: f64) -> WordNorm {
        WordNorm {
            p_mean,
            p_sd: 1.0,
            np_mean,
            np_sd: 1.0,
        }
    }

    #[test]
    fn log_pdf_matches_density() {
        let x: f64 = 1.3;
        let (mean, sd) = (0.4, 0.7);
        let density = (-(x - mean).powi(2) / (2.0 * sd * sd)).exp()
            / (sd * (2.0 * std::f64::consts::PI).sqrt());
        assert!((log_normal_pdf(x, mean, sd) - density.ln()).abs() < 1e-12);
    }

    #[test]
    fn log_pdf_stays_finite_far_in_the_tail() {
        let v = log_normal_pdf(680.0, 0.0, 1.0);
        assert!(v.is_finite());
        assert!(v < -200_000.0);
    }

    #[test]
    fn latest_response_wins() {
        let log = vec![
            answer("dog", 1, true),
            answer("cat", 2, false),
            answer("dog", 1, false),
            answer("ball", 3, true),
            answer("cat", 2, true),
        ];
        let latest = latest_responses(&log);
        assert_eq!(
            latest,
            vec![
                answer("dog", 1, false),
                answer("cat", 2, true),
                answer("ball", 3, true),
            ]
        );
    }

    #[test]
    fn all_yes_with_producer_mean_at_top() {
        let t = table(&[(1, norm(2.0, 0.0)), (2, norm(2.0, 0.0))], 24, 0.5, 1.5);
        let result =
            estimate_vocabulary(&t, 24, &[answer("a", 1, true), answer("b", 2, true)]).unwrap();
        assert_eq!(result.raw_score, 2);
        assert!((result.estimate - (2.0 - 0.5) / 1.5).abs() < 1e-12);
        assert_eq!(result.ceiling_raw_score, 2);
        assert_eq!(result.floor_raw_score, 0);
        assert_eq!(result.responses_used, 2);
    }

    #[test]
    fn argmax_follows_the_density_peak() {
        // Producer mean 1, sd 1: the joint likelihood peaks at B = 1.
        let t = table(&[(1, norm(1.0, 0.0)), (2, norm(1.0, 0.0))], 24, 0.0, 1.0);
        let result =
            estimate_vocabulary(&t, 24, &[answer("a", 1, true), answer("b", 2, true)]).unwrap();
        assert_eq!(result.raw_score, 1);
        assert_eq!(result.estimate, 1.0);
    }

    #[test]
    fn ties_break_toward_lowest_raw_score() {
        // Peak exactly between B = 0 and B = 1.
        let t = table(&[(1, norm(0.5, 0.5))], 24, 0.0, 1.0);
        let result = estimate_vocabulary(&t, 24, &[answer("a", 1, true)]).unwrap();
        assert_eq!(result.raw_score, 0);
    }

    #[test]
    fn no_responses_scores_zero() {
        let t = table(&[(1, norm(1.0, 0.0))], 24, 1.0, 2.0);
        let result = estimate_vocabulary(&t, 24, &[]).unwrap();
        assert_eq!(result.raw_score, 0);
        assert_eq!(result.estimate, -0.5);
    }

    #[test]
    fn unknown_word_fails() {
        let t = table(&[(1, norm(1.0, 0.0))], 24, 0.0, 1.0);
        let err = estimate_vocabulary(&t, 24, &[answer("zebra", 99, true)]).unwrap_err();
        assert!(matches!(err, ScoringError::UnknownWord(ref w) if w == "zebra"));
    }

    #[test]
    fn age_outside_norms_fails() {
        let mut t = table(&[(1, norm(1.0, 0.0))], 24, 0.0, 1.0);
        t.bmin.insert(30, 0.0);
        t.slope.insert(30, 1.0);
        let err = estimate_vocabulary(&t, 30, &[answer("a", 1, true)]).unwrap_err();
        assert!(matches!(err, ScoringError::AgeNotNormed { age: 30 }));

        let err = estimate_vocabulary(&t, 31, &[answer("a", 1, true)]).unwrap_err();
        assert!(matches!(err, ScoringError::MissingScale { age: 31 }));
    }

    #[test]
    fn zero_sd_is_invalid() {
        let bad = WordNorm {
            p_mean: 1.0,
            p_sd: 0.0,
            np_mean: 0.0,
            np_sd: 1.0,
        };
        let t = table(&[(7, bad)], 24, 0.0, 1.0);
        let err = estimate_vocabulary(&t, 24, &[answer("a", 7, false)]).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidNorm { word_id: 7, age: 24 }));
    }

    #[test]
    fn non_finite_norm_is_invalid() {
        let nan_mean = WordNorm {
            p_mean: f64::NAN,
            ..norm(1.0, 0.0)
        };
        let t = table(&[(7, nan_mean)], 24, 0.0, 1.0);
        let err = estimate_vocabulary(&t, 24, &[answer("a", 7, true)]).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidNorm { word_id: 7, age: 24 }));

        let infinite_sd = WordNorm {
            np_sd: f64::INFINITY,
            ..norm(1.0, 0.0)
        };
        let t = table(&[(7, infinite_sd)], 24, 0.0, 1.0);
        let err = estimate_vocabulary(&t, 24, &[answer("a", 7, false)]).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidNorm { word_id: 7, age: 24 }));
    }

    #[test]
    fn scorer_requires_demographics() {
        let t = table(&[(1, norm(1.0, 0.0))], 24, 0.0, 1.0);
        let norms = NormSet {
            female: t.clone(),
            male: t,
        };
        let responses = [answer("a", 1, true)];

        let missing_age = NormScorer::new(
            &norms,
            Demographics {
                age_months: None,
                sex: Some(Sex::Male),
            },
        );
        assert!(matches!(
            missing_age.score(&responses),
            Err(ScoringError::MissingDemographic("age"))
        ));

        let missing_sex = NormScorer::new(
            &norms,
            Demographics {
                age_months: Some(24),
                sex: None,
            },
        );
        assert!(matches!(
            missing_sex.score(&responses),
            Err(ScoringError::MissingDemographic("sex"))
        ));
    }

    #[test]
    fn scorer_picks_table_by_sex_and_is_idempotent() {
        let norms = NormSet {
            female: table(&[(1, norm(1.0, 0.0))], 24, 0.0, 1.0),
            male: table(&[(1, norm(0.0, 1.0))], 24, 0.0, 1.0),
        };
        let responses = [answer("a", 1, true)];
        let demographics = |sex| Demographics {
            age_months: Some(24),
            sex: Some(sex),
        };

        let female = NormScorer::new(&norms, demographics(Sex::Female));
        let male = NormScorer::new(&norms, demographics(Sex::Male));

        let first = female.score(&responses).unwrap();
        assert_eq!(first.raw_score, 1);
        assert_eq!(first.sex, Some(Sex::Female));
        assert_eq!(female.score(&responses).unwrap(), first);
        assert_eq!(male.score(&responses).unwrap().raw_score, 0);
    }
}
