use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SrpConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub compaction: CompactionConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// `"stdio"` or `"http"`.
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CompactionConfig {
    /// Retention policy name: `high_only`, `high_and_medium`, or `top_k`.
    pub policy: String,
    /// Items kept by `top_k`.
    pub capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 8787,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_srp_dir()
            .join("srp.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            policy: "high_only".into(),
            capacity: 20,
        }
    }
}

/// Returns `~/.srp/`, or `./.srp/` when no home directory is known.
pub fn default_srp_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".srp")
}

/// Returns the default config file path: `~/.srp/config.toml`
pub fn default_config_path() -> PathBuf {
    default_srp_dir().join("config.toml")
}

impl SrpConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            SrpConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (SRP_DB, SRP_LOG_LEVEL, SRP_TRANSPORT, SRP_COMPACTION_POLICY).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SRP_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("SRP_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("SRP_TRANSPORT") {
            self.server.transport = val;
        }
        if let Ok(val) = std::env::var("SRP_COMPACTION_POLICY") {
            self.compaction.policy = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
