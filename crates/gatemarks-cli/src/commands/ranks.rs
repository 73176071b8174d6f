//! The `gatemarks ranks` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use gatemarks_core::rank::RankTable;
use gatemarks_remote::config::load_config_from;
use gatemarks_remote::create_store;

pub async fn execute(config_path: Option<PathBuf>, limit: usize) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = create_store(&config.store)?;
    let ranks = store.load().await?;

    if ranks.is_empty() {
        println!("No submissions recorded in the {} store.", store.name());
        return Ok(());
    }

    println!("{}", rank_table(&ranks, limit));

    if let Some(summary) = ranks.summary() {
        println!(
            "Samples {} | mean {:.2} | SD {:.2} | median {:.2} | P90 {:.2} | min {:.2} | max {:.2}",
            summary.samples,
            summary.mean,
            summary.std_dev,
            summary.median,
            summary.p90,
            summary.min,
            summary.max
        );
    }

    Ok(())
}

/// Public view of the table: rank and marks, never candidate ids.
fn rank_table(ranks: &RankTable, limit: usize) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Rank", "Marks"]);
    for (idx, entry) in ranks.entries().iter().take(limit).enumerate() {
        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(format!("{:.2}", entry.marks)),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatemarks_core::rank::RankEntry;

    #[test]
    fn table_shows_marks_without_ids() {
        let ranks = RankTable::from_entries(
            [("DA26S001", 40.0), ("DA26S002", 72.5), ("DA26S003", 12.25)].map(
                |(id, marks)| RankEntry {
                    candidate_id: id.into(),
                    marks,
                },
            ),
        );

        let rendered = rank_table(&ranks, 2).to_string();
        assert!(rendered.contains("72.50"));
        assert!(rendered.contains("40.00"));
        assert!(!rendered.contains("12.25"));
        assert!(!rendered.contains("DA26S"));
    }
}
