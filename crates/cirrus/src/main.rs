//! Cirrus - ask questions about your cloud fleet and run commands on it
//!
//! Main entry point for the Cirrus CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;
mod wiring;

use commands::{ask, audit, chat, config, context, inventory, list, run, runners};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Cirrus - ask questions about your cloud fleet and run commands on it
#[derive(Parser)]
#[command(name = "cirrus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// AWS named profile
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// AWS region
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Extra config file layered over the discovered ones
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List running instances
    List(list::ListArgs),

    /// Run a shell command on one instance
    Run(run::RunArgs),

    /// Ask a one-shot question with infrastructure context
    Ask(ask::AskArgs),

    /// Print the context snapshot sent with questions
    Context(context::ContextArgs),

    /// Enter interactive mode (REPL)
    Chat(chat::ChatArgs),

    /// Count running instances
    Count(inventory::CountArgs),

    /// List offered instance types
    Types(inventory::TypesArgs),

    /// Look up API events for a resource
    Events(audit::EventsArgs),

    /// Search log groups for a pattern
    Logs(audit::LogsArgs),

    /// Search self-hosted GitHub runners
    Runners(runners::RunnersArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

/// Crates whose events reach the console at the chosen level.
const CONSOLE_CRATES: [&str; 6] = [
    "cirrus",
    "cirrus_cloud",
    "cirrus_session",
    "cirrus_llm",
    "cirrus_github",
    "cirrus_config",
];

fn console_filter(verbose: bool) -> String {
    let (level, fallback) = if verbose { ("debug", "info") } else { ("info", "warn") };
    let mut directives: Vec<String> = CONSOLE_CRATES
        .iter()
        .map(|name| format!("{name}={level}"))
        .collect();
    directives.push(fallback.to_string());
    directives.join(",")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loaded = cirrus_config::load_config(None)?;
    if let Some(ref path) = cli.config {
        loaded.overlay_file(path)?;
    }
    wiring::apply_cli_overrides(&mut loaded.config, cli.profile.clone(), cli.region.clone());

    // Initialize tracing: console (human-readable) + rotating JSON file
    let filter = console_filter(cli.verbose);

    let (file_writer, _guard) = if loaded.config.logging().file {
        let log_dir = cirrus_config::user_config_dir()
            .map(|d| d.join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"));
        let file_appender = tracing_appender::rolling::daily(&log_dir, "cirrus.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        (Some(non_blocking), Some(guard))
    } else {
        (None, None)
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(file_writer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "cirrus=trace,cirrus_cloud=trace,cirrus_session=trace,cirrus_llm=trace,cirrus_github=trace,cirrus_config=trace,info",
                ))
        }))
        .init();

    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }

    // Create context for commands
    let ctx = commands::Context {
        loaded,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::List(args) => list::run(args, &ctx).await,
        Commands::Run(args) => run::run(args, &ctx).await,
        Commands::Ask(args) => ask::run(args, &ctx).await,
        Commands::Context(args) => context::run(args, &ctx).await,
        Commands::Chat(args) => chat::run(args, &ctx).await,
        Commands::Count(args) => inventory::run_count(args, &ctx).await,
        Commands::Types(args) => inventory::run_types(args, &ctx).await,
        Commands::Events(args) => audit::run_events(args, &ctx).await,
        Commands::Logs(args) => audit::run_logs(args, &ctx).await,
        Commands::Runners(args) => runners::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_filter_covers_every_crate() {
        let quiet = console_filter(false);
        let verbose = console_filter(true);
        for name in CONSOLE_CRATES {
            assert!(quiet.contains(&format!("{name}=info")), "{quiet}");
            assert!(verbose.contains(&format!("{name}=debug")), "{verbose}");
        }
        assert!(quiet.contains("cirrus_config=info"));
        assert!(quiet.ends_with(",warn"));
        assert!(verbose.ends_with(",info"));
    }
}
