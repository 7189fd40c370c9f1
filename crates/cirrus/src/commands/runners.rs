//! Runners command - search self-hosted GitHub Actions runners.

use anyhow::Result;
use cirrus_github::RunnerListing;
use clap::Args;

use super::Context;
use crate::{output, wiring};

/// Arguments for the runners command.
#[derive(Args, Debug)]
pub struct RunnersArgs {
    /// Case-insensitive regex matched against each runner's JSON
    #[arg(default_value = ".*")]
    pub pattern: String,
}

/// Run the runners command.
pub async fn run(args: RunnersArgs, ctx: &Context) -> Result<()> {
    let directory = wiring::runner_directory(ctx.config());
    let listing = directory.search(&args.pattern).await;

    if ctx.json_output {
        return output::print_json(&listing);
    }

    match listing {
        RunnerListing::Unconfigured(reason) => println!("{}", reason),
        RunnerListing::Failed(reason) => output::print_error(&reason),
        RunnerListing::Empty => println!("No runners found connected to GitHub."),
        RunnerListing::Runners(lines) => {
            if lines.is_empty() {
                output::print_dim(&format!("No runners matched '{}'", args.pattern));
            }
            for line in lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
