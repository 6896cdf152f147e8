//! End-to-end session tests against the core API.
//!
//! These drive the adaptive loop the way an external collaborator would:
//! persist the state after every turn, reload it, and submit the next answer.

use std::collections::BTreeMap;

use wordcat_core::bank::{Item, ItemBank};
use wordcat_core::irt::ItemParams;
use wordcat_core::norms::{Demographics, NormRow, NormSet, NormTable, Sex, WordNorm};
use wordcat_core::scoring::{estimate_vocabulary, NormScorer, WordResponse};
use wordcat_core::selection::rank_by_information;
use wordcat_core::session::{
    AdaptiveSession, AdministrationState, Phase, SessionConfig, TurnOutcome,
};

fn rasch_bank(words: &[&str]) -> ItemBank {
    let items = words
        .iter()
        .enumerate()
        .map(|(i, w)| Item {
            word: w.to_string(),
            word_id: i as u32 + 1,
            params: ItemParams::new(1.0, 0.0, 0.0, 1.0),
        })
        .collect();
    ItemBank::new(items).unwrap()
}

fn norm_table(ids: &[u32], age: u32, producer: (f64, f64), non_producer: (f64, f64)) -> NormTable {
    let words = ids
        .iter()
        .map(|&word_id| NormRow {
            word_id,
            ages: BTreeMap::from([(
                age,
                WordNorm {
                    p_mean: producer.0,
                    p_sd: producer.1,
                    np_mean: non_producer.0,
                    np_sd: non_producer.1,
                },
            )]),
        })
        .collect();
    NormTable {
        words,
        bmin: BTreeMap::from([(age, 0.5)]),
        slope: BTreeMap::from([(age, 0.25)]),
    }
}

fn norm_set(ids: &[u32]) -> NormSet {
    NormSet {
        female: norm_table(ids, 24, (2.0, 1.0), (0.0, 1.0)),
        male: norm_table(ids, 24, (2.0, 1.0), (0.0, 1.0)),
    }
}

fn open_word(outcome: &TurnOutcome) -> String {
    match outcome {
        TurnOutcome::NextItem(item) => item.word.clone(),
        TurnOutcome::Duplicate { pending, .. } => pending.word.clone(),
        TurnOutcome::Complete { .. } => panic!("no open item after completion"),
    }
}

#[test]
fn three_identical_items_reach_a_finite_theta() {
    let bank = rasch_bank(&["ball", "dog", "cup"]);
    let norms = norm_set(&[1, 2, 3]);
    let demographics = Demographics {
        age_months: Some(24),
        sex: Some(Sex::Female),
    };
    let scorer = NormScorer::new(&norms, demographics.clone());
    let session = AdaptiveSession::new(
        &bank,
        SessionConfig {
            quota: 3,
            ..Default::default()
        },
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let turn = session.start(demographics).unwrap();
    assert_eq!(turn.state.pending, Some(rank_by_information(&bank, -5.0)[0]));
    let mut word = open_word(&turn.outcome);
    turn.state.save_json(&path).unwrap();

    let mut last = None;
    for response in [false, false, true] {
        let state = AdministrationState::load_json(&path).unwrap();
        let turn = session.submit(state, &word, response, &scorer).unwrap();
        turn.state.save_json(&path).unwrap();
        if turn.state.phase != Phase::Complete {
            assert_eq!(turn.state.theta, f64::NEG_INFINITY);
            word = open_word(&turn.outcome);
        }
        last = Some(turn);
    }

    let turn = last.unwrap();
    assert_eq!(turn.state.phase, Phase::Complete);
    assert_eq!(turn.state.turn, 3);
    assert_eq!(turn.state.administered, vec![0, 1, 2]);
    assert!(turn.state.theta.is_finite());
    assert!((turn.state.theta - 0.5f64.ln()).abs() < 1e-4);
    match turn.outcome {
        TurnOutcome::Complete { estimate } => assert_eq!(estimate.unwrap().responses_used, 3),
        other => panic!("expected completion, got {other:?}"),
    }

    let reloaded = AdministrationState::load_json(&path).unwrap();
    assert_eq!(reloaded.phase, Phase::Complete);
    assert!(reloaded.estimate.is_some());
}

#[test]
fn all_yes_falls_back_to_the_starting_ranking() {
    let items = [-4.8, 1.0, -3.0, 0.0, 2.5]
        .iter()
        .enumerate()
        .map(|(i, &b)| Item {
            word: format!("word{i}"),
            word_id: i as u32,
            params: ItemParams::new(1.3, b, 0.0, 1.0),
        })
        .collect();
    let bank = ItemBank::new(items).unwrap();
    let norms = norm_set(&[0, 1, 2, 3, 4]);
    let scorer = NormScorer::new(&norms, Demographics::default());
    let session = AdaptiveSession::new(
        &bank,
        SessionConfig {
            quota: 4,
            ..Default::default()
        },
    );
    let ranking = rank_by_information(&bank, -5.0);
    assert_eq!(session.initial_ranking(), ranking.as_slice());

    let mut turn = session.start(Demographics::default()).unwrap();
    for _ in 0..2 {
        let word = open_word(&turn.outcome);
        turn = session.submit(turn.state, &word, true, &scorer).unwrap();
    }

    assert_eq!(turn.state.theta, f64::INFINITY);
    assert_eq!(turn.state.administered, ranking[..2].to_vec());
    assert_eq!(turn.state.pending, Some(ranking[2]));
}

#[test]
fn scoring_failure_still_completes_the_session() {
    let bank = rasch_bank(&["ball", "dog", "cup"]);
    let norms = norm_set(&[1, 2, 3]);
    let scorer = NormScorer::new(&norms, Demographics::default());
    let session = AdaptiveSession::new(
        &bank,
        SessionConfig {
            quota: 2,
            ..Default::default()
        },
    );

    let mut turn = session.start(Demographics::default()).unwrap();
    for response in [true, false] {
        let word = open_word(&turn.outcome);
        turn = session.submit(turn.state, &word, response, &scorer).unwrap();
    }

    assert_eq!(turn.state.phase, Phase::Complete);
    assert_eq!(turn.state.answers.len(), 2);
    assert!(turn.state.estimate.is_none());
    match turn.outcome {
        TurnOutcome::Complete { estimate } => {
            let err = estimate.unwrap_err();
            assert!(!err.is_configuration_error());
            assert!(err.to_string().contains("age"));
        }
        other => panic!("expected completion, got {other:?}"),
    }
}

#[test]
fn two_word_norm_table_argmax_and_rescaling() {
    let responses = vec![
        WordResponse {
            word: "ball".into(),
            word_id: 1,
            response: true,
        },
        WordResponse {
            word: "dog".into(),
            word_id: 2,
            response: true,
        },
    ];

    // Producers centred on the top raw score.
    let table = norm_table(&[1, 2], 24, (2.0, 1.0), (0.0, 1.0));
    let estimate = estimate_vocabulary(&table, 24, &responses).unwrap();
    assert_eq!(estimate.raw_score, 2);
    assert!((estimate.estimate - (2.0 - 0.5) / 0.25).abs() < 1e-12);
    assert_eq!(estimate.ceiling_raw_score, 2);
    assert_eq!(estimate.floor_raw_score, 0);

    // Producers centred on 1: the likelihood peaks there instead.
    let table = norm_table(&[1, 2], 24, (1.0, 1.0), (0.0, 1.0));
    let estimate = estimate_vocabulary(&table, 24, &responses).unwrap();
    assert_eq!(estimate.raw_score, 1);
    assert!((estimate.estimate - (1.0 - 0.5) / 0.25).abs() < 1e-12);
}

#[test]
fn resubmission_changes_the_score_but_not_the_loop() {
    let bank = rasch_bank(&["ball", "dog", "cup", "shoe"]);
    let norms = norm_set(&[1, 2, 3, 4]);
    let demographics = Demographics {
        age_months: Some(24),
        sex: Some(Sex::Male),
    };
    let scorer = NormScorer::new(&norms, demographics.clone());
    let config = SessionConfig {
        quota: 2,
        ..Default::default()
    };

    let run = |flip_first: bool| {
        let session = AdaptiveSession::new(&bank, config.clone());
        let turn = session.start(demographics.clone()).unwrap();
        let first = open_word(&turn.outcome);
        let mut turn = session.submit(turn.state, &first, true, &scorer).unwrap();
        let second = open_word(&turn.outcome);
        if flip_first {
            turn = session.submit(turn.state, &first, false, &scorer).unwrap();
            assert!(matches!(turn.outcome, TurnOutcome::Duplicate { .. }));
            assert_eq!(turn.state.turn, 1);
        }
        session.submit(turn.state, &second, true, &scorer).unwrap()
    };

    let plain = run(false);
    let flipped = run(true);

    assert_eq!(plain.state.turn, 2);
    assert_eq!(flipped.state.turn, 2);
    assert_eq!(plain.state.administered, flipped.state.administered);
    assert_eq!(plain.state.estimate.as_ref().unwrap().raw_score, 2);
    assert_eq!(flipped.state.estimate.as_ref().unwrap().raw_score, 1);
}
