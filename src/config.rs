//! Application configuration from YAML

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file, or `:memory:`
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Table audit records are written to
    #[serde(default = "default_table")]
    pub table: String,

    /// Echo every stored record through the log
    #[serde(default = "default_echo")]
    pub echo: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            echo: default_echo(),
        }
    }
}

/// Static bearer tokens accepted by the bundled signup command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// token -> user name
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

impl AuthConfig {
    pub fn user_for(&self, token: &str) -> Option<&str> {
        self.tokens.get(token).map(String::as_str)
    }
}

/// `<data_local_dir>/volter/volter.db`, falling back to the working directory
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("volter")
        .join("volter.db")
}

fn default_table() -> String {
    "requests".to_string()
}

fn default_echo() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a mapping
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: AppConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        #[cfg(feature = "sqlite")]
        if !crate::persistence::store::is_valid_table_name(&self.monitor.table) {
            anyhow::bail!(
                "Invalid monitor table '{}': expected a plain SQL identifier",
                self.monitor.table
            );
        }

        if self.database.path.as_os_str().is_empty() {
            anyhow::bail!("Database path must not be empty");
        }

        for (token, user) in &self.auth.tokens {
            if token.trim().is_empty() {
                anyhow::bail!("Empty token configured for user '{}'", user);
            }
        }

        Ok(())
    }
}
