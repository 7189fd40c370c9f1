//! Ask command - one-shot question with infrastructure context.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use console::Style;
use serde::Serialize;

use super::{Context, FilterArgs};
use crate::{output, wiring};

/// Arguments for the ask command.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question to send
    #[arg(required = true)]
    pub question: String,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Maximum tokens in the reply
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct AskOutput<'a> {
    question: &'a str,
    reply: &'a str,
}

/// Run the ask command.
pub async fn run(args: AskArgs, ctx: &Context) -> Result<()> {
    let config = ctx.config();
    let session = Arc::new(wiring::session_context(config));
    let dispatcher = wiring::query_dispatcher(config, session.clone());

    let mut options = wiring::query_options(config);
    if let Some(max_tokens) = args.max_tokens {
        options.max_tokens = max_tokens;
    }
    if let Some(temperature) = args.temperature {
        options.temperature = temperature;
    }

    let snapshot = session.build_snapshot(&args.filter.to_filter(), true).await?;

    if ctx.verbose && !ctx.json_output {
        let dim = Style::new().dim();
        println!(
            "{}",
            dim.apply_to(format!(
                "Model: {} via {}",
                dispatcher.model(),
                dispatcher.backend_name().unwrap_or("(unconfigured)")
            ))
        );
        println!(
            "{}",
            dim.apply_to(format!(
                "Context: {} instance(s)",
                snapshot.environment.instances.len()
            ))
        );
        println!();
    }

    let reply = dispatcher.query(&args.question, Some(&snapshot), options).await?;

    if ctx.json_output {
        output::print_json(&AskOutput {
            question: &args.question,
            reply: &reply,
        })
    } else {
        println!("{}", reply);
        Ok(())
    }
}
