//! `pmsync sync` — mirror projects into manager workspaces.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use pmsync_sync::{pipeline, SyncReport};

use super::ConnectionArgs;

/// Arguments for `pmsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config = self.connection.config()?;
        let client = self.connection.client(&config);

        let report = pipeline::run(&client, &config).context("sync aborted")?;
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize sync report")?
            );
            return Ok(());
        }

        print_report(&report);
        Ok(())
    }
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "counter")]
    name: &'static str,
    #[tabled(rename = "value")]
    value: usize,
}

fn stat_rows(report: &SyncReport) -> Vec<StatRow> {
    let s = &report.stats;
    vec![
        StatRow { name: "projects fetched", value: report.projects },
        StatRow { name: "processed", value: s.processed },
        StatRow { name: "added", value: s.added },
        StatRow { name: "updated", value: s.updated },
        StatRow { name: "new manager pages", value: s.new_manager_pages },
        StatRow { name: "errors", value: s.errors },
    ]
}

fn print_report(report: &SyncReport) {
    let elapsed = report.elapsed().num_milliseconds() as f64 / 1000.0;
    let headline = format!(
        "✓ sync finished in {elapsed:.1}s ({} added, {} updated)",
        report.stats.added, report.stats.updated
    );
    if report.stats.errors == 0 {
        println!("{}", headline.green());
    } else {
        println!(
            "{} {}",
            headline.yellow(),
            format!("with {} error(s), see log", report.stats.errors).red()
        );
    }

    let mut table = Table::new(stat_rows(report));
    table.with(Style::rounded());
    println!("{table}");
}
