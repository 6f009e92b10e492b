//! Configuration management for duplex
//!
//! Handles the ~/.duplex/ directory and config.toml. Every section has
//! defaults, so a missing file or a partial file is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::RemoteConfig;
use crate::selection::DEFAULT_CAPACITY;
use crate::session::Theme;

/// Where catalog data comes from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSourceKind {
    #[default]
    Builtin,
    Remote,
}

impl std::fmt::Display for CatalogSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogSourceKind::Builtin => write!(f, "builtin"),
            CatalogSourceKind::Remote => write!(f, "remote"),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub editor: EditorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub source: CatalogSourceKind,
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub retry_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let remote = RemoteConfig::default();
        Self {
            source: CatalogSourceKind::default(),
            base_url: remote.base_url,
            api_key: None,
            timeout_ms: remote.timeout.as_millis() as u64,
            retry_attempts: remote.retry_attempts,
            backoff_ms: remote.backoff.as_millis() as u64,
        }
    }
}

impl CatalogConfig {
    pub fn to_remote_config(&self) -> RemoteConfig {
        RemoteConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
            retry_attempts: self.retry_attempts.max(1),
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub max_items: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub warning_interval_ms: u64,
    pub language: String,
    pub theme: Theme,
    pub line_numbers: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            warning_interval_ms: 2000,
            language: "javascript".to_string(),
            theme: Theme::Light,
            line_numbers: true,
        }
    }
}

impl EditorConfig {
    pub fn warning_interval(&self) -> Duration {
        Duration::from_millis(self.warning_interval_ms)
    }
}

/// Returns the path to the duplex home directory (~/.duplex)
pub fn duplex_home() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".duplex"))
}

pub struct DuplexPaths {
    pub root: PathBuf,
    pub config: PathBuf,
    pub exports: PathBuf,
}

impl DuplexPaths {
    pub fn new() -> Result<Self> {
        Ok(Self::at(duplex_home()?))
    }

    /// Layout rooted at an arbitrary directory
    pub fn at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config: root.join("config.toml"),
            exports: root.join("exports"),
            root,
        }
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.root).context("Failed to create duplex root")?;
        fs::create_dir_all(&self.exports).context("Failed to create exports directory")?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.config.exists()
    }
}

/// Load configuration from ~/.duplex/config.toml
pub fn load_config() -> Result<Config> {
    let paths = DuplexPaths::new()?;
    load_config_from(&paths.config)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path).context("Failed to read config.toml")?;
    toml::from_str(&content).context("Failed to parse config.toml")
}

/// Save configuration to ~/.duplex/config.toml
pub fn save_config(config: &Config) -> Result<()> {
    let paths = DuplexPaths::new()?;
    save_config_to(config, &paths.config)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, content).context("Failed to write config.toml")?;
    Ok(())
}
