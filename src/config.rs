//! Application configuration

use crate::fetch::{FetcherConfig, DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT, FETCH_TIMEOUT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "page-analyzer.toml";

const DATABASE_FILE: &str = "page_analyzer.db";

/// Settings read from `page-analyzer.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite connection string (path, `sqlite://` URL, or `:memory:`)
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// User-agent sent when fetching pages
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Redirect hops followed before a fetch fails
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Response bytes kept for extraction
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_database_url() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("page-analyzer").join(DATABASE_FILE))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
        .to_string_lossy()
        .into_owned()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_max_redirects() -> usize {
    DEFAULT_MAX_REDIRECTS
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            user_agent: default_user_agent(),
            max_redirects: default_max_redirects(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or return defaults if it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: AppConfig = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Prefer an explicitly supplied connection string over the file value
    pub fn with_database_url(mut self, database_url: Option<String>) -> Self {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        self
    }

    /// Fetcher settings; the timeout is fixed
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            user_agent: self.user_agent.clone(),
            timeout: FETCH_TIMEOUT,
            max_redirects: self.max_redirects,
            max_body_bytes: self.max_body_bytes,
        }
    }

    /// Create the parent directory of a file-backed database
    pub fn ensure_database_dir(&self) -> Result<()> {
        let path = self
            .database_url
            .strip_prefix("sqlite://")
            .unwrap_or(&self.database_url);
        if path == ":memory:" {
            return Ok(());
        }

        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory {:?}", parent))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.database_url.ends_with(DATABASE_FILE));
        assert_eq!(config.max_redirects, DEFAULT_MAX_REDIRECTS);
        assert_eq!(config.fetcher_config().timeout, FETCH_TIMEOUT);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_and_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "user_agent = \"custom-bot/2.0\"\nmax_redirects = 3\n").unwrap();

        let config = AppConfig::load_or_default(&path)
            .unwrap()
            .with_database_url(Some("sqlite://override.db".into()));
        assert_eq!(config.user_agent, "custom-bot/2.0");
        assert_eq!(config.max_redirects, 3);
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(config.database_url, "sqlite://override.db");
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(DEFAULT_CONFIG_FILE);
        let config = AppConfig {
            database_url: "/tmp/x.db".into(),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load_or_default(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "max_redirects = \"many\"").unwrap();
        assert!(AppConfig::load_or_default(&path).is_err());
    }
}
