//! # Application Configuration
//!
//! Read once at startup from environment variables, optionally loaded from
//! a dotenv file first. Every setting has a development default except
//! `JWT_SECRET`, which production requires.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::auth::{EmailConfig, JwtConfig};
use crate::http_server::HttpServerConfig;
use crate::store::RetryPolicy;

/// Secret used outside production when `JWT_SECRET` is unset
const DEV_JWT_SECRET: &str = "bootcamp-api-development-secret";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to load env file {path}: {message}")]
    EnvFile { path: PathBuf, message: String },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    #[default]
    Development,
    Production,
}

impl AppEnv {
    pub fn is_production(self) -> bool {
        self == AppEnv::Production
    }
}

/// Which geocoding service resolves addresses and postal codes
#[derive(Debug, Clone, PartialEq)]
pub enum GeocoderSettings {
    MapQuest { api_key: String },
    /// Offline geocoder resolving every query to one point
    Static { longitude: f64, latitude: f64 },
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        // Boston
        GeocoderSettings::Static {
            longitude: -71.104,
            latitude: 42.350,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: AppEnv,
    pub server: HttpServerConfig,
    pub cloud_uri: String,
    pub offline_uri: Option<String>,
    pub retry: RetryPolicy,
    pub jwt: JwtConfig,
    pub cookie_days: i64,
    /// `None` sends no mail and logs instead
    pub email: Option<EmailConfig>,
    pub geocoder: GeocoderSettings,
    pub seed_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: AppEnv::Development,
            server: HttpServerConfig::default(),
            cloud_uri: "memory://cloud".to_string(),
            offline_uri: None,
            retry: RetryPolicy::default(),
            jwt: JwtConfig {
                secret: DEV_JWT_SECRET.to_string(),
                ..JwtConfig::default()
            },
            cookie_days: 30,
            email: None,
            geocoder: GeocoderSettings::default(),
            seed_dir: PathBuf::from("./_data"),
        }
    }
}

/// Load variables from `path`, or from `./.env` if present
pub fn load_env_file(path: Option<&Path>) -> ConfigResult<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            info!(path = %path.display(), "environment loaded");
        }
        None => {
            if let Ok(path) = dotenvy::dotenv() {
                info!(path = %path.display(), "environment loaded");
            }
        }
    }
    Ok(())
}

impl AppConfig {
    /// Read the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = AppConfig::default();

        let env = match var("APP_ENV").as_deref() {
            None | Some("development") => AppEnv::Development,
            Some("production") => AppEnv::Production,
            Some(other) => return Err(ConfigError::invalid("APP_ENV", other, "expected development or production")),
        };

        let server = HttpServerConfig {
            host: var("HOST").unwrap_or(defaults.server.host),
            port: parse_or("PORT", var("PORT"), defaults.server.port)?,
            cors_origins: var("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            upload_dir: var("FILE_UPLOAD_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.server.upload_dir),
            max_upload_bytes: parse_or("MAX_FILE_UPLOAD", var("MAX_FILE_UPLOAD"), defaults.server.max_upload_bytes)?,
        };

        let retry = RetryPolicy {
            max_attempts: parse_or(
                "STORE_CONNECT_ATTEMPTS",
                var("STORE_CONNECT_ATTEMPTS"),
                defaults.retry.max_attempts,
            )?
            .max(1),
            base_delay: Duration::from_millis(parse_or(
                "STORE_RETRY_BASE_MS",
                var("STORE_RETRY_BASE_MS"),
                defaults.retry.base_delay.as_millis() as u64,
            )?),
            max_delay: Duration::from_millis(parse_or(
                "STORE_RETRY_MAX_MS",
                var("STORE_RETRY_MAX_MS"),
                defaults.retry.max_delay.as_millis() as u64,
            )?),
        };

        let secret = match var("JWT_SECRET") {
            Some(secret) => secret,
            None if env.is_production() => return Err(ConfigError::Missing("JWT_SECRET")),
            None => {
                warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };
        let jwt = JwtConfig {
            secret,
            access_token_ttl: match var("JWT_EXPIRE") {
                Some(value) => parse_duration(&value)
                    .ok_or_else(|| ConfigError::invalid("JWT_EXPIRE", &value, "expected e.g. 30d, 12h, 15m or 3600"))?,
                None => defaults.jwt.access_token_ttl,
            },
        };

        let email = match var("SMTP_HOST") {
            Some(smtp_host) => {
                let fallback = EmailConfig::default();
                Some(EmailConfig {
                    smtp_host,
                    smtp_port: parse_or("SMTP_PORT", var("SMTP_PORT"), 587)?,
                    smtp_user: var("SMTP_EMAIL").unwrap_or_default(),
                    smtp_password: var("SMTP_PASSWORD").unwrap_or_default(),
                    from_email: var("SMTP_FROM_EMAIL").unwrap_or(fallback.from_email),
                    from_name: var("SMTP_FROM_NAME").unwrap_or(fallback.from_name),
                })
            }
            None => None,
        };

        let geocoder = match var("GEOCODER_PROVIDER").as_deref() {
            None | Some("static") => defaults.geocoder,
            Some("mapquest") => GeocoderSettings::MapQuest {
                api_key: var("GEOCODER_API_KEY").ok_or(ConfigError::Missing("GEOCODER_API_KEY"))?,
            },
            Some(other) => return Err(ConfigError::invalid("GEOCODER_PROVIDER", other, "expected mapquest or static")),
        };

        Ok(Self {
            env,
            server,
            cloud_uri: var("STORE_URI_CLOUD").unwrap_or(defaults.cloud_uri),
            offline_uri: var("STORE_URI_OFFLINE"),
            retry,
            jwt,
            cookie_days: parse_or("JWT_COOKIE_EXPIRE_DAYS", var("JWT_COOKIE_EXPIRE_DAYS"), defaults.cookie_days)?,
            email,
            geocoder,
            seed_dir: var("SEED_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.seed_dir),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, value: Option<String>, default: T) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::invalid(key, &v, e.to_string())),
        None => Ok(default),
    }
}

/// `30d`, `12h`, `15m`, `90s` or bare seconds
pub fn parse_duration(value: &str) -> Option<chrono::Duration> {
    let value = value.trim();
    let split = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let amount: i64 = digits.parse().ok()?;
    match unit {
        "" | "s" => Some(chrono::Duration::seconds(amount)),
        "m" => Some(chrono::Duration::minutes(amount)),
        "h" => Some(chrono::Duration::hours(amount)),
        "d" => Some(chrono::Duration::days(amount)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ConfigResult<AppConfig> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.env, AppEnv::Development);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.cloud_uri, "memory://cloud");
        assert!(config.offline_uri.is_none());
        assert!(config.email.is_none());
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.cookie_days, 30);
    }

    #[test]
    fn test_production_requires_secret() {
        assert_eq!(
            config(&[("APP_ENV", "production")]).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
        let config = config(&[("APP_ENV", "production"), ("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.jwt.secret, "s3cret");
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "8080"),
            ("STORE_URI_OFFLINE", "file:///tmp/offline.json"),
            ("STORE_CONNECT_ATTEMPTS", "3"),
            ("JWT_EXPIRE", "12h"),
            ("SMTP_HOST", "smtp.mailtrap.io"),
            ("SMTP_PORT", "2525"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.offline_uri.as_deref(), Some("file:///tmp/offline.json"));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.jwt.access_token_ttl, chrono::Duration::hours(12));
        assert_eq!(config.email.unwrap().smtp_port, 2525);
        assert_eq!(config.server.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_geocoder_selection() {
        assert_eq!(config(&[]).unwrap().geocoder, GeocoderSettings::default());
        assert_eq!(
            config(&[("GEOCODER_PROVIDER", "mapquest"), ("GEOCODER_API_KEY", "k")])
                .unwrap()
                .geocoder,
            GeocoderSettings::MapQuest {
                api_key: "k".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { key: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("GEOCODER_PROVIDER", "mapquest")]),
            Err(ConfigError::Missing("GEOCODER_API_KEY"))
        ));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30d"), Some(chrono::Duration::days(30)));
        assert_eq!(parse_duration("3600"), Some(chrono::Duration::seconds(3600)));
        assert_eq!(parse_duration("5w"), None);
        assert_eq!(parse_duration("d"), None);
    }
}
