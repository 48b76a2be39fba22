//! # sc-cli
//!
//! Command-line interface for Session Conductor.
//!
//! - `sc profile list/show` — inspect the profiles in `conductor.toml`
//! - `sc plan` — dry-run a policy against a session file
//! - `sc apply` — run a scripted edit of a session file under a policy

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Session Conductor CLI — request-scoped session key policies.
#[derive(Parser)]
#[command(name = "sc", version, about)]
struct Cli {
    /// Conductor config file (TOML, or YAML by extension).
    #[arg(long, default_value = "conductor.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect configured policy profiles.
    Profile {
        #[command(subcommand)]
        command: commands::profile::ProfileCommands,
    },
    /// Show what a policy would do to a session, without changing it.
    Plan {
        #[command(flatten)]
        policy: commands::PolicyArgs,
    },
    /// Apply a policy around an edit of a session file.
    Apply {
        #[command(flatten)]
        policy: commands::PolicyArgs,
        #[command(flatten)]
        edits: commands::apply::EditArgs,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output on stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("sc_policy=info".parse()?)
                .add_directive("sc_cli=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let config = sc_policy::ConductorConfig::load_or_default(&cli.config)?;

    match &cli.command {
        Commands::Profile { command } => commands::profile::execute(command, &config),
        Commands::Plan { policy } => commands::plan::execute(policy, &config),
        Commands::Apply { policy, edits } => commands::apply::execute(policy, edits, &config),
    }
}
