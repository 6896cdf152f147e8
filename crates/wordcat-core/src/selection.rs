//! Information ranking and maximum-information item selection.

use std::cmp::Ordering;

use crate::bank::ItemBank;
use crate::error::SessionError;
use crate::irt::information;

/// Rank every item by descending Fisher information at `theta`.
///
/// Stable: items with equal information keep their bank order.
pub fn rank_by_information(bank: &ItemBank, theta: f64) -> Vec<usize> {
    let info: Vec<f64> = bank
        .items()
        .iter()
        .map(|item| information(theta, &item.params))
        .collect();

    let mut order: Vec<usize> = (0..bank.len()).collect();
    order.sort_by(|&x, &y| info[y].partial_cmp(&info[x]).unwrap_or(Ordering::Equal));
    order
}

/// Pick the not-yet-administered item with the highest information at `theta`.
///
/// Ties go to the lowest item index.
pub fn select_max_information(
    bank: &ItemBank,
    administered: &[usize],
    theta: f64,
) -> Result<usize, SessionError> {
    let mut best: Option<(usize, f64)> = None;
    for (index, item) in bank.items().iter().enumerate() {
        if administered.contains(&index) {
            continue;
        }
        let info = information(theta, &item.params);
        match best {
            Some((_, best_info)) if info <= best_info => {}
            _ => best = Some((index, info)),
        }
    }

    best.map(|(index, _)| index)
        .ok_or(SessionError::ExhaustedBank {
            administered: administered.len(),
        })
}

/// Pick the first item of a precomputed ranking that has not been administered.
///
/// Used while the ability estimate is infinite. With a fixed ranking this
/// walks one position further each turn.
pub fn select_from_ranking(
    ranking: &[usize],
    administered: &[usize],
) -> Result<usize, SessionError> {
    ranking
        .iter()
        .copied()
        .find(|index| !administered.contains(index))
        .ok_or(SessionError::ExhaustedBank {
            administered: administered.len(),
        })
}
