//! Count and types commands - fleet inventory without reachability checks.

use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::Context;
use crate::{output, wiring};

/// Arguments for the count command.
#[derive(Args, Debug)]
pub struct CountArgs {
    /// Only count instances of this exact type
    #[arg(long = "type", value_name = "TYPE")]
    pub instance_type: Option<String>,
}

/// Arguments for the types command.
#[derive(Args, Debug)]
pub struct TypesArgs {
    /// Substring the type name must contain
    pub search: Option<String>,
}

/// Run the count command.
pub async fn run_count(args: CountArgs, ctx: &Context) -> Result<()> {
    let cli = wiring::aws_cli(ctx.config());
    let directory = wiring::instance_directory(&cli);

    let count = directory
        .count_running_instances(args.instance_type.as_deref())
        .await?;

    if ctx.json_output {
        output::print_json(&json!({
            "instance_type": args.instance_type,
            "running": count,
        }))
    } else {
        match args.instance_type {
            Some(t) => println!("{} running {} instance(s)", count, t),
            None => println!("{} running instance(s)", count),
        }
        Ok(())
    }
}

/// Run the types command.
pub async fn run_types(args: TypesArgs, ctx: &Context) -> Result<()> {
    let cli = wiring::aws_cli(ctx.config());
    let directory = wiring::instance_directory(&cli);

    let types = directory.list_instance_types(args.search.as_deref()).await?;

    if ctx.json_output {
        return output::print_json(&types);
    }
    if types.is_empty() {
        output::print_dim("No instance types matched.");
    }
    for t in &types {
        println!("{}", t);
    }
    Ok(())
}
