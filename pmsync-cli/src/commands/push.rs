//! `pmsync push-status` — copy manager-edited statuses to the source projects.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use pmsync_sync::{push, PushReport};

use super::ConnectionArgs;

/// Arguments for `pmsync push-status`.
#[derive(Args, Debug)]
pub struct PushArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Leave project rows without their sub-databases.
    #[arg(long)]
    pub no_subtables: bool,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl PushArgs {
    pub fn run(self) -> Result<()> {
        let config = self.connection.config_without_template()?;
        let client = self.connection.client(&config);

        let report =
            push::run(&client, &config, !self.no_subtables).context("status push aborted")?;
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize push report")?
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

fn print_report(report: &PushReport) {
    let s = &report.stats;
    let elapsed = report.elapsed().num_milliseconds() as f64 / 1000.0;
    let headline = format!(
        "✓ pushed {} status(es) from {} manager(s) in {elapsed:.1}s",
        s.pushed, s.managers
    );
    if s.errors == 0 {
        println!("{}", headline.green());
    } else {
        println!("{} {}", headline.yellow(), format!("with {} error(s)", s.errors).red());
    }

    let rows = vec![
        StatRow { name: "managers", value: s.managers },
        StatRow { name: "rows checked", value: s.rows_checked },
        StatRow { name: "pushed", value: s.pushed },
        StatRow { name: "sub-databases created", value: s.subtables_created },
        StatRow { name: "skipped", value: s.skipped },
        StatRow { name: "errors", value: s.errors },
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
