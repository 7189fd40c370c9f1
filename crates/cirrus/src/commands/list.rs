//! List command - running instances and their reachability.

use anyhow::Result;
use clap::Args;

use super::{Context, FilterArgs};
use crate::{output, wiring};

/// Arguments for the list command.
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Run the list command.
pub async fn run(args: ListArgs, ctx: &Context) -> Result<()> {
    let cli = wiring::aws_cli(ctx.config());
    let directory = wiring::instance_directory(&cli);

    let instances = directory.list_instances(&args.filter.to_filter()).await?;

    if ctx.json_output {
        output::print_json(&instances)
    } else {
        output::print_instances(&instances);
        Ok(())
    }
}
