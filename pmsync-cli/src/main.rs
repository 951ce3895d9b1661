//! pmsync — mirror a Notion projects table into per-manager workspaces.
//!
//! # Usage
//!
//! ```text
//! pmsync sync [--json] [--fields <path>] [--api-base <url>] [--timeout-secs <n>]
//! pmsync reconcile [--json] [...]
//! pmsync push-status [--json] [--no-subtables] [...]
//! ```
//!
//! `NOTION_TOKEN`, `PROJECTS_DB`, `MANAGERS_DB` and `TEMPLATE_PAGE_ID` are read
//! from the environment unless given as flags. Only `sync` needs the template.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{push::PushArgs, reconcile::ReconcileArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "pmsync",
    version,
    about = "Mirror Notion projects into per-manager workspace pages",
    long_about = None,
)]
struct Cli {
    /// Log at debug level regardless of RUST_LOG.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upsert every valid project into each of its managers' nested tables.
    Sync(SyncArgs),

    /// Reset statuses of system-written rows to the source project status.
    Reconcile(ReconcileArgs),

    /// Copy manager-edited statuses back to the source projects and add
    /// missing project sub-databases.
    PushStatus(PushArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Reconcile(args) => args.run(),
        Commands::PushStatus(args) => args.run(),
    }
}

/// Logs go to stderr; stdout carries only the summary.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
