//! CLI command handlers.

use clap::Args;
use cirrus_config::{CirrusConfig, LoadedConfig};
use cirrus_types::{InstanceFilter, parse_tag};

pub mod ask;
pub mod audit;
pub mod chat;
pub mod config;
pub mod context;
pub mod inventory;
pub mod list;
pub mod repl;
pub mod run;
pub mod runners;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Configuration with CLI overrides applied.
    pub loaded: LoadedConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    pub fn config(&self) -> &CirrusConfig {
        &self.loaded.config
    }
}

/// Instance selection flags shared by `list`, `ask` and `context`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Instance types to match (e.g. t3.small,m5.large)
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub types: Vec<String>,

    /// Prefix of the Name tag
    #[arg(long)]
    pub name_prefix: Option<String>,

    /// Tag that must match exactly (repeatable)
    #[arg(long = "tag", value_name = "KEY=VALUE", value_parser = parse_tag_arg)]
    pub tags: Vec<(String, String)>,

    /// Include instances the remote-execution agent cannot reach
    #[arg(long)]
    pub all: bool,
}

impl FilterArgs {
    pub fn to_filter(&self) -> InstanceFilter {
        let mut filter = InstanceFilter::new().with_types(self.types.iter().cloned());
        if let Some(ref prefix) = self.name_prefix {
            filter = filter.with_name_prefix(prefix);
        }
        for (key, value) in &self.tags {
            filter = filter.with_tag(key, value);
        }
        if self.all {
            filter = filter.include_unreachable();
        }
        filter
    }
}

fn parse_tag_arg(input: &str) -> Result<(String, String), String> {
    parse_tag(input).map_err(|e| e.to_string())
}
