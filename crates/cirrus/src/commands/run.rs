//! Run command - one shell command on one instance.

use anyhow::Result;
use clap::Args;

use super::Context;
use crate::{output, wiring};

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Instance ID to run the command on
    pub instance: String,

    /// Shell command (remaining arguments are joined with spaces)
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Run the run command.
pub async fn run(args: RunArgs, ctx: &Context) -> Result<()> {
    let session = wiring::session_context(ctx.config());
    let command = args.command.join(" ");

    if !ctx.json_output {
        output::print_dim(&format!("Running command on {}...", args.instance));
    }
    let result = session.run_command_on_instance(&args.instance, &command).await;

    if ctx.json_output {
        output::print_json(&result)?;
    } else {
        output::print_result(&result);
    }

    if !result.status.is_success() {
        anyhow::bail!("command finished with status {}", result.status.as_str());
    }
    Ok(())
}
