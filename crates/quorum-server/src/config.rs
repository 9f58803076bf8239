use anyhow::{bail, Context, Result};
use quorum_core::PollServiceConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub polls: PollsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: String,
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            database_url: "sqlite://./data/quorum.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollsConfig {
    pub max_write_attempts: u32,
    pub store_timeout_ms: u64,
    pub retry_backoff_ms: u64,
    pub event_capacity: usize,
}

impl Default for PollsConfig {
    fn default() -> Self {
        Self {
            max_write_attempts: 5,
            store_timeout_ms: 5_000,
            retry_backoff_ms: 10,
            event_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
}

impl Config {
    /// Read `path`, falling back to defaults when it does not exist, then
    /// apply `QUORUM_*` environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {path}"))?;
            Self::parse(&content).with_context(|| format!("invalid config file {path}"))?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(bind) = lookup("QUORUM_BIND_ADDRESS").filter(|v| !v.is_empty()) {
            self.server.bind_address = bind;
        }
        if let Some(url) = lookup("QUORUM_DATABASE_URL").filter(|v| !v.is_empty()) {
            self.storage.database_url = url;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.polls.max_write_attempts == 0 {
            bail!("polls.max_write_attempts must be at least 1");
        }
        if self.polls.store_timeout_ms == 0 {
            bail!("polls.store_timeout_ms must be at least 1");
        }
        if self.storage.max_connections == 0 {
            bail!("storage.max_connections must be at least 1");
        }
        Ok(())
    }

    pub fn poll_service(&self) -> PollServiceConfig {
        PollServiceConfig {
            max_write_attempts: self.polls.max_write_attempts,
            store_timeout: Duration::from_millis(self.polls.store_timeout_ms),
            retry_backoff: Duration::from_millis(self.polls.retry_backoff_ms),
        }
    }
}
