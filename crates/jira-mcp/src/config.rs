//! Server configuration.
//!
//! Settings live in `<home>/config.yaml`. Every key is optional and a missing
//! file means defaults:
//!
//! ```yaml
//! server-name: jira-mcp
//! request-timeout-secs: 30
//! default-max-results: 50
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;

/// Configuration file name within the home directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Home directory name under the platform config directory.
pub const HOME_DIR_NAME: &str = "jira-mcp";

const DEFAULT_SERVER_NAME: &str = "jira-mcp";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RESULTS: u32 = 50;

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid YAML for this schema.
    #[error("Invalid configuration in {path}: {reason}")]
    Parse {
        /// The file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// No home directory was given and none could be derived.
    #[error("Could not determine a configuration directory; pass --home or set JIRA_MCP_HOME")]
    NoHome,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Name reported in the MCP handshake.
    pub server_name: String,

    /// HTTP request timeout for Jira calls.
    pub request_timeout_secs: u64,

    /// Result cap for searches when the caller gives none.
    pub default_max_results: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).await?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load `<home>/config.yaml`, falling back to defaults when it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_or_default(home: &Path) -> Result<Self, ConfigError> {
        let path = home.join(CONFIG_FILE_NAME);
        if !fs::try_exists(&path).await? {
            tracing::debug!(path = %path.display(), "No config file; using defaults");
            return Ok(Self::default());
        }
        Self::load(&path).await
    }

    /// HTTP request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Resolve the home directory: an explicit path wins, otherwise
/// `<platform config dir>/jira-mcp`.
///
/// # Errors
///
/// Returns [`ConfigError::NoHome`] if no explicit path is given and the
/// platform has no config directory.
pub fn resolve_home(explicit: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match explicit {
        Some(path) => Ok(path),
        None => dirs::config_dir()
            .map(|dir| dir.join(HOME_DIR_NAME))
            .ok_or(ConfigError::NoHome),
    }
}
