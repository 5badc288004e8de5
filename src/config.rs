//! Configuration module
//!
//! `AppConfig` is read from a TOML file where every section and key is
//! optional, then overridden from the environment for secrets and
//! deployment-specific URLs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::DatabaseConfig;

pub const MIN_JWT_SECRET_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// `<config_dir>/identity-core/config.toml`, or `./config.toml` when the
/// platform has no config directory.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("identity-core").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub password_reset: PasswordResetConfig,
    pub email: EmailConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds allowed for in-flight requests after a shutdown signal
    pub shutdown_timeout: u64,
    /// Per-request deadline in seconds
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: 30,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub bcrypt_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "identity-core".to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 7,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordResetConfig {
    pub token_ttl_minutes: i64,
    /// Base of the link mailed to the user
    pub app_base_url: String,
}

impl Default for PasswordResetConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: crate::application::DEFAULT_RESET_TOKEN_TTL_MINUTES,
            app_base_url: "http://localhost:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    #[default]
    Log,
    Resend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub provider: EmailProvider,
    pub resend_api_key: Option<String>,
    pub from: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: EmailProvider::Log,
            resend_api_key: None,
            from: "Identity <no-reply@localhost>".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `identity_core=debug`
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `path` and apply environment overrides.
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is
    /// an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Override values from `DATABASE_URL`, `JWT_SECRET`, `RESEND_API_KEY`
    /// and `APP_BASE_URL`. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(secret) = get("JWT_SECRET") {
            self.security.jwt_secret = secret;
        }
        if let Some(key) = get("RESEND_API_KEY") {
            self.email.resend_api_key = Some(key);
        }
        if let Some(base) = get("APP_BASE_URL") {
            self.password_reset.app_base_url = base;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.security.jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::Invalid(format!(
                "security.jwt_secret must be at least {} bytes (set JWT_SECRET)",
                MIN_JWT_SECRET_BYTES
            )));
        }
        if self.security.jwt_issuer.trim().is_empty() {
            return invalid("security.jwt_issuer cannot be empty");
        }
        if self.security.access_token_ttl_minutes <= 0 {
            return invalid("security.access_token_ttl_minutes must be positive");
        }
        if self.security.refresh_token_ttl_days <= 0 {
            return invalid("security.refresh_token_ttl_days must be positive");
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return invalid("security.bcrypt_cost must be between 4 and 31");
        }
        if self.password_reset.token_ttl_minutes <= 0 {
            return invalid("password_reset.token_ttl_minutes must be positive");
        }
        if self.server.request_timeout_secs == 0 {
            return invalid("server.request_timeout_secs must be positive");
        }
        if self.database.url.trim().is_empty() {
            return invalid("database.url cannot be empty");
        }
        if self.email.provider == EmailProvider::Resend
            && self
                .email
                .resend_api_key
                .as_deref()
                .map_or(true, |k| k.trim().is_empty())
        {
            return invalid("email.provider = \"resend\" requires RESEND_API_KEY");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.security.jwt_secret = "x".repeat(MIN_JWT_SECRET_BYTES);
        config
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 9090

            [email]
            provider = "resend"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.email.provider, EmailProvider::Resend);
        assert_eq!(config.security.access_token_ttl_minutes, 15);
        assert_eq!(config.password_reset.token_ttl_minutes, 20);
        assert_eq!(config.database.max_connections, 10);
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "postgres://app@db/identity"),
            ("JWT_SECRET", "from-env"),
            ("RESEND_API_KEY", "re_123"),
            ("APP_BASE_URL", "   "),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.url, "postgres://app@db/identity");
        assert_eq!(config.security.jwt_secret, "from-env");
        assert_eq!(config.email.resend_api_key.as_deref(), Some("re_123"));
        assert_eq!(config.password_reset.app_base_url, "http://localhost:8080");
    }

    #[test]
    fn validate_accepts_defaults_with_secret() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_short_secret() {
        let mut config = valid();
        config.security.jwt_secret = "short".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_bad_lifetimes_and_cost() {
        let mut config = valid();
        config.security.access_token_ttl_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.password_reset.token_ttl_minutes = -1;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.security.bcrypt_cost = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn resend_requires_api_key() {
        let mut config = valid();
        config.email.provider = EmailProvider::Resend;
        assert!(config.validate().is_err());

        config.email.resend_api_key = Some("re_123".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir()
            .join(format!("identity-core-{}.toml", uuid::Uuid::new_v4()));
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let path = std::env::temp_dir()
            .join(format!("identity-core-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[server\nport = ").unwrap();
        let result = AppConfig::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
