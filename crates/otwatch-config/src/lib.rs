//! Configuration for the otwatch console.
//!
//! A single TOML file merged with `OTWATCH_`-prefixed environment
//! variables. The admin password ships with a default and is overridable
//! through either layer; it never appears in logs thanks to `SecretString`.

use std::path::PathBuf;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The admin password shipped by default; override with
/// `admin_password` in config.toml or `OTWATCH_ADMIN_PASSWORD`.
pub const DEFAULT_ADMIN_PASSWORD: &str = "SecureAdmin2024!";

fn default_base_url() -> String {
    "http://127.0.0.1:8000".into()
}

fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.into()
}

fn default_request_timeout() -> u64 {
    5
}

fn default_probe_timeout() -> u64 {
    2
}

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config struct ───────────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Backend base URL for the PCAP and workflow endpoints.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Admin panel password. Compared after input sanitization.
    #[serde(default = "default_admin_password")]
    pub admin_password: String,

    /// Directory where exports are written. Defaults to the platform
    /// download directory, falling back to the current directory.
    #[serde(default)]
    pub export_dir: Option<PathBuf>,

    /// Regular REST call timeout, seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Health-probe timeout, seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            admin_password: default_admin_password(),
            export_dir: None,
            request_timeout: default_request_timeout(),
            probe_timeout: default_probe_timeout(),
        }
    }
}

impl Config {
    /// The backend base URL, validated.
    pub fn base_url(&self) -> Result<url::Url, ConfigError> {
        self.base_url.parse().map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {}", self.base_url),
        })
    }

    /// The admin password as a secret, so it cannot leak through Debug.
    pub fn admin_password(&self) -> SecretString {
        SecretString::from(self.admin_password.clone())
    }

    /// Resolve the export directory: configured value, else the user's
    /// download directory, else the working directory.
    pub fn export_dir(&self) -> PathBuf {
        if let Some(dir) = &self.export_dir {
            return dir.clone();
        }
        directories::UserDirs::new()
            .and_then(|d| d.download_dir().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "otwatch", "otwatch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("otwatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_from(Toml::file(config_path()))
}

fn load_from(toml: figment::providers::Data<figment::providers::Toml>) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(toml)
        .merge(Env::prefixed("OTWATCH_"));
    Ok(figment.extract()?)
}

/// Load config, returning defaults when the file does not exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_ship_the_stock_password() {
        let config = Config::default();
        assert_eq!(config.admin_password, "SecureAdmin2024!");
        assert_eq!(config.request_timeout, 5);
        assert_eq!(config.probe_timeout, 2);
        assert!(config.base_url().is_ok());
    }

    #[test]
    fn env_overrides_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                base_url = "http://backend.plant.local:8000"
                admin_password = "FromFile2024!"
                "#,
            )?;
            jail.set_env("OTWATCH_ADMIN_PASSWORD", "FromEnv2024!");

            let config = super::load_from(Toml::file("config.toml")).unwrap();
            assert_eq!(config.base_url, "http://backend.plant.local:8000");
            assert_eq!(config.admin_password, "FromEnv2024!");
            Ok(())
        });
    }

    #[test]
    fn invalid_base_url_is_a_validation_error() {
        let config = Config {
            base_url: "not a url".into(),
            ..Config::default()
        };
        assert!(matches!(
            config.base_url(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn explicit_export_dir_wins() {
        let config = Config {
            export_dir: Some(PathBuf::from("/tmp/exports")),
            ..Config::default()
        };
        assert_eq!(config.export_dir(), PathBuf::from("/tmp/exports"));
    }
}
