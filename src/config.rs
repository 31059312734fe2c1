//! Layered configuration loaded with figment
//!
//! Sources, highest priority first:
//! 1. Environment variables with the `JWTGATE_` prefix (`JWTGATE_SECRET`, ...)
//! 2. An optional TOML file
//! 3. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::claims::VALIDITY_SECONDS;

pub const ENV_PREFIX: &str = "JWTGATE_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),
    #[error("'{0}': must not be blank.")]
    Blank(&'static str),
    #[error("'{0}': must be greater than zero.")]
    Zero(&'static str),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self { ConfigError::Figment(Box::new(e)) }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct Config {
    /// HMAC secret shared by issuer and verifier.
    pub secret: String,
    pub token_validity_secs: u64,
    /// Upper bound on one credential-store lookup.
    pub lookup_timeout_ms: u64,
    pub bind: String,
    pub db_path: PathBuf,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("secret", &"<redacted>")
            .field("token_validity_secs", &self.token_validity_secs)
            .field("lookup_timeout_ms", &self.lookup_timeout_ms)
            .field("bind", &self.bind)
            .field("db_path", &self.db_path)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            secret: String::new(),
            token_validity_secs: VALIDITY_SECONDS,
            lookup_timeout_ms: 2000,
            bind: "0.0.0.0:3000".into(),
            db_path: PathBuf::from("./data/jwtgate.mdb"),
        }
    }
}

impl Config {
    /// Defaults, then `file` if given, then `JWTGATE_*` variables.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut fig = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            fig = fig.merge(Toml::file(path));
        }
        fig.merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Config = Self::figment(file).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.trim().is_empty() { return Err(ConfigError::Blank("secret")); }
        if self.bind.trim().is_empty() { return Err(ConfigError::Blank("bind")); }
        if self.token_validity_secs == 0 { return Err(ConfigError::Zero("token_validity_secs")); }
        if self.lookup_timeout_ms == 0 { return Err(ConfigError::Zero("lookup_timeout_ms")); }
        Ok(())
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    /// Config with `secret` set and everything else default.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Config { secret: secret.into(), ..Config::default() }
    }
}
