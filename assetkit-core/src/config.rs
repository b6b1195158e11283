// Client configuration loaded from TOML with environment overrides

use crate::error::{PropertyError, Result};
use crate::wire::Transport;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "ASSETKIT_CONFIG";
/// Environment variable overriding the transport
pub const TRANSPORT_ENV: &str = "ASSETKIT_TRANSPORT";
/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "assetkit.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Dialect used when writing wire objects
    pub transport: Transport,
    /// Refuse structured data that carries phantom nodes
    pub reject_phantoms: bool,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Rest,
            reject_phantoms: false,
            log_level: "warn".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| PropertyError::Config(format!("failed to parse config: {}", e)))
    }

    /// Load from `path`, else `$ASSETKIT_CONFIG`, else `assetkit.toml`
    ///
    /// An explicitly named file must exist; a missing default file falls
    /// back to defaults. `$ASSETKIT_TRANSPORT` overrides the file either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::resolve(
            path,
            std::env::var(CONFIG_ENV).ok(),
            std::env::var(TRANSPORT_ENV).ok(),
            Path::new(DEFAULT_CONFIG_FILE),
        )
    }

    fn resolve(
        path: Option<&Path>,
        config_env: Option<String>,
        transport_env: Option<String>,
        default_file: &Path,
    ) -> Result<Self> {
        let (config_path, explicit) = match (path, config_env) {
            (Some(p), _) => (p.to_path_buf(), true),
            (None, Some(p)) => (PathBuf::from(p), true),
            (None, None) => (default_file.to_path_buf(), false),
        };

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path).map_err(|e| {
                PropertyError::Config(format!("{}: {}", config_path.display(), e))
            })?;
            Self::from_toml_str(&content)?
        } else if explicit {
            return Err(PropertyError::Config(format!(
                "config file not found: {}",
                config_path.display()
            )));
        } else {
            warn!(
                "Config file {} not found, using defaults",
                config_path.display()
            );
            Self::default()
        };

        if let Some(transport) = transport_env {
            config.transport = transport.parse()?;
        }
        Ok(config)
    }
}
