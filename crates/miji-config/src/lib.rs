//! # miji-config
//!
//! Layered settings for the miji binary. Sources, lowest priority first:
//!
//! 1. built-in defaults
//! 2. an optional `miji.toml` in the working directory
//! 3. `MIJI_*` environment variables, sections split by `__`
//!    (e.g. `MIJI_DATABASE__URL`, `MIJI_LOG__JSON`)
//!
//! A `.env` file is loaded into the process environment first.

use std::time::Duration;

use config::{Config, Environment, File, Map};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Connection string; may embed credentials, so it is never printed.
    pub url: SecretString,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub statement_timeout_ms: u64,
}

impl DatabaseSettings {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.statement_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    pub json: bool,
}

impl Settings {
    /// Loads `.env`, `miji.toml` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::build(Environment::default(), true)
    }

    /// Same layering as [`Settings::load`], but reads variables from `vars`
    /// instead of the process environment and skips `miji.toml`.
    pub fn from_env_map(vars: Map<String, String>) -> Result<Self, ConfigError> {
        Self::build(Environment::default().source(Some(vars)), false)
    }

    fn build(env: Environment, read_file: bool) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("database.url", "sqlite://miji.db")?
            .set_default("database.max_connections", 5)?
            .set_default("database.acquire_timeout_secs", 5)?
            .set_default("database.statement_timeout_ms", 5000)?
            .set_default("log.filter", "info")?
            .set_default("log.json", false)?;

        if read_file {
            builder = builder.add_source(File::with_name("miji").required(false));
        }

        let settings: Settings = builder
            .add_source(
                env.prefix("MIJI")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".into(),
            ));
        }
        if self.database.statement_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "database.statement_timeout_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn vars(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_without_overrides() {
        let settings = Settings::from_env_map(Map::new()).unwrap();

        assert_eq!(settings.database.url.expose_secret(), "sqlite://miji.db");
        assert_eq!(settings.database.max_connections, 5);
        assert_eq!(settings.database.statement_timeout(), Duration::from_secs(5));
        assert_eq!(settings.log.filter, "info");
        assert!(!settings.log.json);
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::from_env_map(vars(&[
            ("MIJI_DATABASE__URL", "sqlite:///var/lib/miji/forum.db"),
            ("MIJI_DATABASE__MAX_CONNECTIONS", "16"),
            ("MIJI_DATABASE__ACQUIRE_TIMEOUT_SECS", "2"),
            ("MIJI_LOG__JSON", "true"),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();

        assert_eq!(
            settings.database.url.expose_secret(),
            "sqlite:///var/lib/miji/forum.db"
        );
        assert_eq!(settings.database.max_connections, 16);
        assert_eq!(settings.database.acquire_timeout(), Duration::from_secs(2));
        assert!(settings.log.json);
    }

    #[test]
    fn zero_connections_is_rejected() {
        let err = Settings::from_env_map(vars(&[("MIJI_DATABASE__MAX_CONNECTIONS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn database_url_is_redacted_in_debug_output() {
        let settings = Settings::from_env_map(vars(&[(
            "MIJI_DATABASE__URL",
            "postgres://admin:hunter2@db/miji",
        )]))
        .unwrap();

        assert!(!format!("{settings:?}").contains("hunter2"));
    }
}
