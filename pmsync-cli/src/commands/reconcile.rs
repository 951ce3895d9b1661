//! `pmsync reconcile` — reset statuses of system-written rows.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use pmsync_sync::{reconcile, ReconcileReport};

use super::ConnectionArgs;

/// Arguments for `pmsync reconcile`.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ReconcileArgs {
    pub fn run(self) -> Result<()> {
        let config = self.connection.config_without_template()?;
        let client = self.connection.client(&config);

        let report = reconcile::run(&client, &config).context("reconciliation aborted")?;
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report)
                    .context("failed to serialize reconcile report")?
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

fn print_report(report: &ReconcileReport) {
    let s = &report.stats;
    let elapsed = report.elapsed().num_milliseconds() as f64 / 1000.0;
    let headline = format!(
        "✓ reconciled {} row(s) across {} manager(s) in {elapsed:.1}s",
        s.reconciled, s.managers
    );
    if s.errors == 0 {
        println!("{}", headline.green());
    } else {
        println!("{} {}", headline.yellow(), format!("with {} error(s)", s.errors).red());
    }

    let rows = vec![
        StatRow { name: "managers", value: s.managers },
        StatRow { name: "rows checked", value: s.rows_checked },
        StatRow { name: "reconciled", value: s.reconciled },
        StatRow { name: "skipped", value: s.skipped },
        StatRow { name: "errors", value: s.errors },
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
