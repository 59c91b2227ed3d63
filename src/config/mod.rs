//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. Environment variables (`AGENTROOM_BASE_URL`, `AGENTROOM_TOKEN`,
//!    `AGENTROOM_TEAM_ID`, `AGENTROOM_USER_ID`, timeouts)
//! 2. TOML file specified via --config CLI flag
//! 3. ./agentroom.toml in the current directory
//! 4. $XDG_CONFIG_HOME/agentroom/agentroom.toml (or ~/.config/agentroom/agentroom.toml)
//! 5. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

mod defaults;
mod env;
mod sources;
mod types;

pub use sources::{config_root_dir, ConfigSource};
pub use types::{ApiConfig, Config, DisplayConfig, IdentityConfig, NetworkConfig};

/// Config plus the source it was read from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,
}

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from --config flag).
pub fn load_config(path_override: Option<&str>) -> Result<Config, ConfigError> {
    Ok(load_config_with_source(path_override)?.config)
}

/// Load configuration and report where it came from.
pub fn load_config_with_source(path_override: Option<&str>) -> Result<LoadedConfig, ConfigError> {
    load_config_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
    )
}

fn load_config_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&str>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<LoadedConfig, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let (text, source) =
        sources::read_config_text_with_sources(path_override, &read_file, &config_root)?;
    let mut config: Config = toml::from_str(&text)?;
    env::apply_runtime_env_overrides(&mut config, &env_lookup)?;
    normalize(&mut config)?;
    Ok(LoadedConfig { config, source })
}

fn normalize(config: &mut Config) -> Result<(), ConfigError> {
    // Clamp to at least 1 second to avoid "no-timeout" accidental behavior.
    config.network.api_timeout_secs = config.network.api_timeout_secs.max(1);
    config.network.connect_timeout_secs = config.network.connect_timeout_secs.max(1);
    config.api.base_url = config.api.base_url.trim().to_string();
    if config.api.base_url.is_empty() {
        return Err(ConfigError::Invalid(
            "api.base_url must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl NetworkConfig {
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
