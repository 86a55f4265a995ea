//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::{net::IpAddr, path::PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub admin: AdminConfig,
    pub statuses: StatusesConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Public domain (e.g., "social.example.com")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Get the base URL for the instance
    ///
    /// # Returns
    /// Full URL like "https://social.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Admin account bootstrapped on startup
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Admin username (default: "admin")
    #[serde(default = "default_admin_username")]
    pub username: String,
    /// Admin display name (default: "Admin")
    #[serde(default = "default_admin_display_name")]
    pub display_name: String,
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_display_name() -> String {
    "Admin".to_string()
}

/// Status posting limits
#[derive(Debug, Clone, Deserialize)]
pub struct StatusesConfig {
    /// Maximum characters in a status (default: 500)
    #[serde(default = "default_max_characters")]
    pub max_characters: usize,
}

fn default_max_characters() -> usize {
    500
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl LoggingConfig {
    /// Filter directives used when `RUST_LOG` is unset
    pub fn default_filter(&self) -> String {
        let level = self.level.trim().to_ascii_lowercase();
        format!("localtoot={level},tower_http={level}")
    }

    pub fn is_json(&self) -> bool {
        self.format.trim().eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (LOCALTOOT__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.domain", "localhost")?
            .set_default("server.protocol", "http")?
            .set_default("database.path", "data/localtoot.db")?
            .set_default("admin.username", "admin")?
            .set_default("admin.display_name", "Admin")?
            .set_default("statuses.max_characters", 500)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (LOCALTOOT__*)
            .add_source(
                Environment::with_prefix("LOCALTOOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.statuses.max_characters == 0 {
            return Err(crate::error::AppError::Config(
                "statuses.max_characters must be greater than 0".to_string(),
            ));
        }

        if !matches!(
            self.logging.level.trim().to_ascii_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(crate::error::AppError::Config(format!(
                "logging.level must be one of trace, debug, info, warn, error (got {})",
                self.logging.level
            )));
        }

        if !matches!(
            self.logging.format.trim().to_ascii_lowercase().as_str(),
            "pretty" | "json"
        ) {
            return Err(crate::error::AppError::Config(format!(
                "logging.format must be pretty or json (got {})",
                self.logging.format
            )));
        }

        if self.admin.username.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "admin.username must not be empty".to_string(),
            ));
        }

        if is_local_server_domain(&self.server.domain) {
            if !self.server.protocol.eq_ignore_ascii_case("https") {
                let host = normalized_server_host(&self.server.domain);
                tracing::warn!(
                    host = %host,
                    protocol = %self.server.protocol,
                    "Serving over plain http for local development"
                );
            }
        } else if !self.server.protocol.eq_ignore_ascii_case("https") {
            return Err(crate::error::AppError::Config(
                "server.protocol must be https for non-local server domains".to_string(),
            ));
        }

        Ok(())
    }
}

fn normalized_server_host(domain: &str) -> String {
    let trimmed = domain.trim();
    let parsed_host = url::Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()));
    let host = parsed_host.unwrap_or_else(|| trimmed.to_string());
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_local_server_domain(domain: &str) -> bool {
    let host = normalized_server_host(domain);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/localtoot-test.db"),
            },
            admin: AdminConfig {
                username: "admin".to_string(),
                display_name: "Admin".to_string(),
            },
            statuses: StatusesConfig {
                max_characters: 500,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_http_on_localhost() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.base_url(), "http://localhost");
    }

    #[test]
    fn validate_accepts_http_on_loopback_ip() {
        let mut config = valid_config();
        config.server.domain = "127.0.0.1:3000".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_max_characters() {
        let mut config = valid_config();
        config.statuses.max_characters = 0;

        let error = config
            .validate()
            .expect_err("a zero character limit must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("statuses.max_characters")
        ));
    }

    #[test]
    fn logging_level_feeds_default_filter() {
        let mut config = valid_config();
        config.logging.level = "DEBUG".to_string();

        let directives = config.logging.default_filter();
        assert_eq!(directives, "localtoot=debug,tower_http=debug");
        assert!(tracing_subscriber::EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn logging_format_selects_json() {
        let mut config = valid_config();
        assert!(!config.logging.is_json());

        config.logging.format = "json".to_string();
        assert!(config.logging.is_json());
    }

    #[test]
    fn validate_rejects_unknown_logging_settings() {
        let mut config = valid_config();
        config.logging.level = "loud".to_string();
        assert!(matches!(
            config.validate(),
            Err(crate::error::AppError::Config(message)) if message.contains("logging.level")
        ));

        let mut config = valid_config();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            config.validate(),
            Err(crate::error::AppError::Config(message)) if message.contains("logging.format")
        ));
    }

    #[test]
    fn validate_rejects_blank_admin_username() {
        let mut config = valid_config();
        config.admin.username = "  ".to_string();

        let error = config
            .validate()
            .expect_err("a blank admin username must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message) if message.contains("admin.username")
        ));
    }

    #[test]
    fn validate_rejects_http_for_non_local_domain() {
        let mut config = valid_config();
        config.server.domain = "social.example.com".to_string();
        config.server.protocol = "http".to_string();

        let error = config
            .validate()
            .expect_err("public domains must require https");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("server.protocol must be https")
        ));
    }
}
