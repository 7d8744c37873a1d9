//! Connection Configuration
//!
//! Settings for reaching a TM1 / Planning Analytics server. Values come from
//! an optional YAML file (`TM1_CONFIG`) and are overridden by `TM1_*`
//! environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, Tm1Error};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_VALIDATION_CONCURRENCY: usize = 8;

#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Tm1Config {
    /// REST root, e.g. `https://host:8010/api/v1/`
    pub base_url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Max in-flight element membership checks during validation
    #[serde(default = "default_validation_concurrency")]
    pub validation_concurrency: usize,
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_validation_concurrency() -> usize {
    DEFAULT_VALIDATION_CONCURRENCY
}

impl std::fmt::Debug for Tm1Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tm1Config")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("verify_ssl", &self.verify_ssl)
            .field("timeout_secs", &self.timeout_secs)
            .field("validation_concurrency", &self.validation_concurrency)
            .finish()
    }
}

impl Tm1Config {
    pub fn new(base_url: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user: user.into(),
            password: password.into(),
            verify_ssl: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            validation_concurrency: DEFAULT_VALIDATION_CONCURRENCY,
        }
    }

    /// Load from `TM1_CONFIG` (if set) and then apply environment overrides.
    pub fn load() -> Result<Self> {
        let base = match env::var("TM1_CONFIG") {
            Ok(path) => Some(Self::from_yaml_file(path)?),
            Err(_) => None,
        };
        Self::from_lookup(base, |key| env::var(key).ok())
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Tm1Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Tm1Config = serde_yaml::from_str(content)
            .map_err(|e| Tm1Error::Config(format!("invalid YAML config: {}", e)))?;
        config.validated()
    }

    /// Apply `TM1_*` overrides from `lookup` on top of `base`.
    pub fn from_lookup<F>(base: Option<Self>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = base.unwrap_or_else(|| Self::new("", "", ""));

        if let Some(url) = lookup("TM1_BASE_URL") {
            config.base_url = url;
        }
        if let Some(user) = lookup("TM1_USER") {
            config.user = user;
        }
        if let Some(password) = lookup("TM1_PASSWORD") {
            config.password = password;
        }
        if let Some(verify) = lookup("TM1_VERIFY_SSL") {
            config.verify_ssl = parse_bool(&verify)
                .ok_or_else(|| Tm1Error::Config(format!("TM1_VERIFY_SSL must be true/false, got '{}'", verify)))?;
        }
        if let Some(timeout) = lookup("TM1_TIMEOUT_SECS") {
            config.timeout_secs = timeout
                .trim()
                .parse()
                .map_err(|_| Tm1Error::Config(format!("TM1_TIMEOUT_SECS must be an integer, got '{}'", timeout)))?;
        }
        if let Some(limit) = lookup("TM1_VALIDATION_CONCURRENCY") {
            config.validation_concurrency = limit.trim().parse().map_err(|_| {
                Tm1Error::Config(format!("TM1_VALIDATION_CONCURRENCY must be an integer, got '{}'", limit))
            })?;
        }

        config.validated()
    }

    fn validated(mut self) -> Result<Self> {
        if self.base_url.trim().is_empty() {
            return Err(Tm1Error::Config("base_url is required (set TM1_BASE_URL)".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Tm1Error::Config("timeout_secs must be positive".to_string()));
        }
        if self.validation_concurrency == 0 {
            self.validation_concurrency = 1;
        }
        if !self.base_url.ends_with('/') {
            self.base_url.push('/');
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
