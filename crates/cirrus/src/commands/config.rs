//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use cirrus_config::{self, Backend};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show resolved configuration
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Store a model credential in the system keyring
    SetSecret {
        /// Backend name: bedrock, anthropic
        backend: String,
    },

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./cirrus.toml) instead of user config
        #[arg(long)]
        local: bool,
    },

    /// Show configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::SetSecret { backend } => cmd_set_secret(&backend),
        ConfigCommand::Init { local } => cmd_init(local),
        ConfigCommand::Path => cmd_path(),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = &ctx.loaded;
    let config = &loaded.config;

    println!("# Cirrus Configuration\n");

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    let aws = config.aws();
    println!("AWS:");
    println!(
        "  region:  {}",
        aws.resolved_region().as_deref().unwrap_or("(not set)")
    );
    println!("  profile: {}", aws.profile.as_deref().unwrap_or("(default)"));
    println!("  cli:     {}", aws.cli_path());
    println!();

    let llm = config.llm();
    let backend = llm.backend();
    println!("Model:");
    println!("  {} / {}  {}", backend, llm.model(), key_status_for(&backend, llm.api_key.as_deref()));
    if let Some(ref base_url) = llm.base_url {
        println!("  endpoint: {}", base_url);
    }
    println!(
        "  max_tokens: {}  temperature: {}",
        llm.max_tokens(),
        llm.temperature()
    );
    println!();

    let github = config.github();
    let token_set = std::env::var(github.token_env()).is_ok_and(|t| !t.is_empty());
    println!("GitHub:");
    println!("  org: {}", github.org());
    println!(
        "  token: {} {}",
        github.token_env(),
        if token_set { "✓" } else { "(not set)" }
    );
    println!();

    let audit = config.audit();
    if !audit.log_groups.is_empty() {
        println!("Audit log groups:");
        for group in &audit.log_groups {
            println!("  {}", group);
        }
        println!();
    }

    if !loaded.warnings.is_empty() {
        println!("Warnings:");
        for w in &loaded.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    if ctx.verbose {
        println!("---\nRaw config:\n");
        if let Ok(toml_str) = config.to_toml() {
            println!("{}", toml_str);
        }
    }

    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    println!("Config file search order (later overrides earlier):\n");

    for source in &ctx.loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not found"
        };
        println!("  {} {}", status, source.path.display());
    }

    println!();
    let loaded_count = ctx.loaded.loaded_from().len();
    if loaded_count == 0 {
        println!("No config files found. Run 'cirrus config init' to create one.");
    } else {
        println!("{} config file(s) loaded.", loaded_count);
    }

    Ok(())
}

fn cmd_set_secret(backend_str: &str) -> Result<()> {
    let backend = parse_backend(backend_str)?;

    println!("Enter credential for {}:", backend.display_name());

    let mut api_key = String::new();
    std::io::stdin().read_line(&mut api_key)?;
    let api_key = api_key.trim();

    if api_key.is_empty() {
        println!("No key provided, aborting.");
        return Ok(());
    }

    match cirrus_config::store_in_keyring(&backend, api_key) {
        Ok(()) => {
            println!(
                "✓ Credential stored in system keyring for {}",
                backend.display_name()
            );
        }
        Err(e) => {
            eprintln!("Failed to store in keyring: {}", e);
            eprintln!(
                "Fallback: set the {} environment variable instead.",
                backend.env_var()
            );
        }
    }

    Ok(())
}

fn cmd_init(local: bool) -> Result<()> {
    let path = if local {
        PathBuf::from("cirrus.toml")
    } else {
        cirrus_config::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
    };

    if cirrus_config::init_config(&path)? {
        println!("Created config file: {}", path.display());
    } else {
        println!("Config file already exists: {}", path.display());
    }
    Ok(())
}

fn cmd_path() -> Result<()> {
    match cirrus_config::user_config_path() {
        Some(path) => {
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("(file does not exist yet)");
            }
        }
        None => {
            eprintln!("Could not determine config directory");
        }
    }
    Ok(())
}

fn parse_backend(s: &str) -> Result<Backend> {
    Backend::from_name(s)
        .ok_or_else(|| anyhow::anyhow!("Unknown backend '{}'. Valid: bedrock, anthropic", s))
}

fn key_status_for(backend: &Backend, config_value: Option<&str>) -> String {
    match cirrus_config::resolve_api_key(backend, config_value) {
        Some(secret) => format!("(key: {})", secret.source),
        None => format!("(no key - set {})", backend.env_var()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!(parse_backend("Bedrock").unwrap(), Backend::Bedrock);
        assert_eq!(parse_backend("anthropic").unwrap(), Backend::Anthropic);
        let err = parse_backend("openai").unwrap_err();
        assert!(err.to_string().contains("Valid: bedrock, anthropic"));
    }

    #[test]
    fn test_key_status_from_config_value() {
        let status = key_status_for(&Backend::Anthropic, Some("sk-inline"));
        assert!(status.starts_with("(key: "));
    }
}
