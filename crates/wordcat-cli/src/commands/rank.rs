//! The `wordcat rank` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use wordcat_core::bank::load_instrument;
use wordcat_core::irt::{information, probability};
use wordcat_core::selection::rank_by_information;

pub fn execute(instrument_path: PathBuf, theta: f64, top: usize) -> Result<()> {
    anyhow::ensure!(theta.is_finite(), "theta must be a finite number");

    let instrument = load_instrument(&instrument_path)?;
    let bank = &instrument.bank;
    let ranking = rank_by_information(bank, theta);

    let mut table = Table::new();
    table.set_header(vec!["Rank", "Word", "a", "b", "c", "d", "P(yes)", "Information"]);

    for (rank, &index) in ranking.iter().take(top).enumerate() {
        let Some(item) = bank.get(index) else {
            continue;
        };
        let p = &item.params;
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&item.word),
            Cell::new(format!("{:.2}", p.a)),
            Cell::new(format!("{:.2}", p.b)),
            Cell::new(format!("{:.2}", p.c)),
            Cell::new(format!("{:.2}", p.d)),
            Cell::new(format!("{:.3}", probability(theta, p))),
            Cell::new(format!("{:.4}", information(theta, p))),
        ]);
    }

    println!(
        "{} ({} items) ranked at theta {theta}",
        instrument.info.name,
        bank.len()
    );
    println!("{table}");

    Ok(())
}
