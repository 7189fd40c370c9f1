//! Chat command - interactive REPL mode.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use super::Context;
use super::repl::Repl;
use crate::wiring;

/// Arguments for the chat command.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Maximum tokens per reply
    #[arg(long)]
    pub max_tokens: Option<u32>,
}

/// Run the chat command (REPL).
pub async fn run(args: ChatArgs, ctx: &Context) -> Result<()> {
    let config = ctx.config();
    let session = Arc::new(wiring::session_context(config));
    let dispatcher = wiring::query_dispatcher(config, session);

    let mut options = wiring::query_options(config);
    if let Some(max_tokens) = args.max_tokens {
        options.max_tokens = max_tokens;
    }

    let mut repl = Repl::new(dispatcher, options, ctx.verbose)?;
    repl.run().await
}
