//! Chirpy Configuration Management
//!
//! Handles configuration from environment variables and an optional TOML
//! file, with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Platform value that enables development defaults
pub const DEV_PLATFORM: &str = "dev";

/// Secret used only when running on the dev platform
pub const DEV_JWT_SECRET: &str = "development-secret-key-change-in-production";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database connection
    pub database: DatabaseConfig,

    /// Token signing and webhook credentials
    pub auth: AuthConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|message| ConfigError::ParseError { path, message })
    }

    fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load from `CHIRPY_CONFIG` if set, then override with environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("CHIRPY_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Whether the service runs on the development platform
    pub fn is_dev(&self) -> bool {
        self.server.platform == DEV_PLATFORM
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("API_PORT") {
            self.server.port = parse_var("API_PORT", port)?;
        }
        if let Ok(platform) = std::env::var("PLATFORM") {
            self.server.platform = platform;
        }

        // CORS origins from environment variable (comma-separated)
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // PostgreSQL
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = Some(url).filter(|u| !u.is_empty());
        }
        if let Ok(size) = std::env::var("DATABASE_POOL_SIZE") {
            self.database.pool_size = parse_var("DATABASE_POOL_SIZE", size)?;
        }

        // Auth
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(issuer) = std::env::var("JWT_ISSUER") {
            self.auth.jwt_issuer = issuer;
        }
        if let Ok(key) = std::env::var("POLKA_KEY") {
            self.auth.polka_key = Some(key).filter(|k| !k.is_empty());
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(json) = std::env::var("LOG_JSON") {
            self.logging.json_format = parse_var("LOG_JSON", json)?;
        }

        Ok(())
    }

    /// Fill development defaults and reject unusable settings
    fn validate(&mut self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            if !self.is_dev() {
                return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
            }
            self.auth.jwt_secret = DEV_JWT_SECRET.to_string();
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_POOL_SIZE".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Deployment platform (`dev` enables development defaults)
    pub platform: String,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            platform: "production".to_string(),
            // Empty by default for security - set via CORS_ORIGINS env var
            cors_origins: vec![],
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; the in-memory store is used when unset
    pub url: Option<String>,

    /// PostgreSQL connection pool size
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: 10,
        }
    }
}

/// Token signing configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for session tokens
    pub jwt_secret: String,

    /// `iss` claim written into and required from session tokens
    pub jwt_issuer: String,

    /// API key expected from the Polka payment webhook
    pub polka_key: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "chirpy".to_string(),
            polka_key: None,
        }
    }
}

// Secrets stay out of logs
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("polka_key", &self.polka_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.jwt_issuer, "chirpy");
        assert!(config.database.url.is_none());
        assert!(!config.is_dev());
    }

    #[test]
    fn test_missing_secret_outside_dev() {
        let mut config = AppConfig::default();
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::MissingRequired(key)) if key == "JWT_SECRET"));
    }

    #[test]
    fn test_dev_platform_gets_default_secret() {
        let mut config = AppConfig::default();
        config.server.platform = DEV_PLATFORM.to_string();
        config.validate().unwrap();
        assert_eq!(config.auth.jwt_secret, DEV_JWT_SECRET);
    }

    #[test]
    fn test_parse_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            [server]
            port = 9000

            [auth]
            jwt_secret = "s3cret"
            polka_key = "f271c81ff7084ee5b99a5091b42d486e"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.auth.jwt_issuer, "chirpy");
        assert!(config.auth.polka_key.is_some());
    }

    #[test]
    fn test_invalid_value() {
        let result: Result<u16, _> = parse_var("API_PORT", "not-a-port".to_string());
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let auth = AuthConfig {
            jwt_secret: "topsecret".to_string(),
            polka_key: Some("apikey".to_string()),
            ..Default::default()
        };
        let rendered = format!("{auth:?}");
        assert!(!rendered.contains("topsecret"));
        assert!(!rendered.contains("apikey"));
    }
}
