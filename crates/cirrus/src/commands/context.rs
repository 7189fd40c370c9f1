//! Context command - print the snapshot a question would carry.

use anyhow::Result;
use clap::Args;

use super::{Context, FilterArgs};
use crate::wiring;

/// Arguments for the context command.
#[derive(Args, Debug)]
pub struct ContextArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Leave command history out of the snapshot
    #[arg(long)]
    pub no_history: bool,
}

/// Run the context command. Always prints JSON.
pub async fn run(args: ContextArgs, ctx: &Context) -> Result<()> {
    let session = wiring::session_context(ctx.config());
    let snapshot = session
        .build_snapshot(&args.filter.to_filter(), !args.no_history)
        .await?;
    println!("{}", snapshot.to_json_pretty()?);
    Ok(())
}
