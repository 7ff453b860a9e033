use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const UPDATE_TOKEN_ENV: &str = "DDNS_UPDATE_TOKEN";
pub const HOSTED_ZONE_ID_ENV: &str = "DDNS_HOSTED_ZONE_ID";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ddns: DdnsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Upper bound on the provider call, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Values the update handler needs. Either may be empty; the handler refuses
/// every request until both are set.
#[derive(Clone, Default, Deserialize)]
pub struct DdnsConfig {
    #[serde(default)]
    pub update_token: String,
    #[serde(default)]
    pub hosted_zone_id: String,
}

// Keep the shared secret out of logs.
impl std::fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = if self.update_token.is_empty() { "" } else { "<REDACTED>" };
        f.debug_struct("DdnsConfig")
            .field("update_token", &token)
            .field("hosted_zone_id", &self.hosted_zone_id)
            .finish()
    }
}

impl DdnsConfig {
    pub fn new(update_token: impl Into<String>, hosted_zone_id: impl Into<String>) -> Self {
        Self {
            update_token: update_token.into(),
            hosted_zone_id: hosted_zone_id.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.update_token.is_empty() && !self.hosted_zone_id.is_empty()
    }
}

impl Config {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Replace file values with non-empty values from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(token) = lookup(UPDATE_TOKEN_ENV) {
            self.ddns.update_token = token;
        }
        if let Some(zone) = lookup(HOSTED_ZONE_ID_ENV) {
            self.ddns.hosted_zone_id = zone;
        }
    }
}
