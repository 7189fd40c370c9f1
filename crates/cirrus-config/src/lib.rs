//! Configuration system for Cirrus.
//!
//! Provides TOML-based configuration with:
//! - Provider access settings (`[aws]`: region, profile, CLI executable)
//! - Model settings (`[llm]`: backend, model, sampling defaults, retries)
//! - GitHub runner listing settings (`[github]`)
//! - Audit defaults (`[audit]`) and logging toggles (`[logging]`)
//! - Config file layering (user config dir + project-local overrides)
//! - Secret resolution (keyring → env var → config file)

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, init_config, load_config, load_config_file,
    load_config_with_options, save_config, user_config_dir, user_config_path,
};
pub use error::{ConfigError, Result};
pub use secrets::{ResolvedSecret, SecretSource, resolve_api_key, store_in_keyring};
pub use types::*;
