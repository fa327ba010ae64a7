use std::path::{Path, PathBuf};

use bluedit_gateway::GatewayConfig;

use crate::error::CliError;

/// Placeholder printed instead of the JWT secret.
pub const REDACTED: &str = "********";

/// Locate the configuration file.
///
/// Discovery order:
/// 1. `--config <path>` or `BLUEDIT_CONFIG` (explicit)
/// 2. `./config.toml` (project-local)
/// 3. `$XDG_CONFIG_HOME/bluedit/config.toml`
/// 4. `~/.config/bluedit/config.toml`
pub fn find_config(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from("config.toml");
    if local.exists() {
        return Some(local);
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg).join("bluedit/config.toml");
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home).join(".config/bluedit/config.toml");
        if path.exists() {
            return Some(path);
        }
    }

    None
}

/// Load the gateway configuration: defaults, then the config file if one is
/// found, then the process environment.
pub fn load_config(explicit_path: Option<&Path>) -> Result<GatewayConfig, CliError> {
    let mut config = match find_config(explicit_path) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration file");
            load_config_from_path(&path)?
        }
        None => GatewayConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    // Fail early on bad security overrides.
    config.security_policy()?;
    Ok(config)
}

pub fn load_config_from_path(path: &Path) -> Result<GatewayConfig, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|e| CliError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_config(&contents).map_err(|e| CliError::Config {
        message: format!("failed to parse {}: {}", path.display(), e),
    })
}

pub fn parse_config(contents: &str) -> Result<GatewayConfig, toml::de::Error> {
    toml::from_str(contents)
}

/// A copy of `config` safe to print.
pub fn redacted(config: &GatewayConfig) -> GatewayConfig {
    let mut config = config.clone();
    config.auth.jwt_secret = REDACTED.to_string();
    config
}
