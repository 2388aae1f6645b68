use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while reading configuration at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub pool_size: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub requests: u32,
    pub window: Duration,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    pub create_limit: RateLimitRule,
    pub update_limit: RateLimitRule,
    pub global_limit: RateLimitRule,
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("NODE_ENV").as_deref() {
            Some("production") => Environment::Production,
            _ => Environment::Development,
        };

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Self::defaults(environment, jwt_secret).with_overrides(&lookup)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        self.server.port = parse_or(lookup, "PORT", self.server.port)?;

        // Database overrides
        if let Some(v) = lookup("DB_HOST") {
            self.database.host = v;
        }
        self.database.port = parse_or(lookup, "DB_PORT", self.database.port)?;
        if let Some(v) = lookup("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = lookup("DB_PASS") {
            self.database.password = v;
        }
        if let Some(v) = lookup("DB_NAME") {
            self.database.name = v;
        }
        self.database.pool_size = parse_or(lookup, "DB_POOL_SIZE", self.database.pool_size)?;
        self.database.acquire_timeout_secs =
            parse_or(lookup, "DB_ACQUIRE_TIMEOUT_SECS", self.database.acquire_timeout_secs)?;

        // API overrides
        self.api.enable_rate_limiting =
            parse_or(lookup, "RATE_LIMIT_ENABLED", self.api.enable_rate_limiting)?;
        self.api.create_limit.requests =
            parse_or(lookup, "RATE_LIMIT_CREATE_PER_MINUTE", self.api.create_limit.requests)?;
        self.api.update_limit.requests =
            parse_or(lookup, "RATE_LIMIT_UPDATE_PER_MINUTE", self.api.update_limit.requests)?;
        self.api.global_limit.requests =
            parse_or(lookup, "RATE_LIMIT_GLOBAL_PER_15_MINUTES", self.api.global_limit.requests)?;

        // Security overrides
        if let Some(v) = lookup("ALLOWED_ORIGINS") {
            self.security.cors_origins = split_origins(&v);
        }

        Ok(self)
    }

    fn defaults(environment: Environment, jwt_secret: String) -> Self {
        Self {
            environment,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8002,
            },
            database: DatabaseConfig {
                host: "mysql".to_string(),
                port: 3306,
                user: "root".to_string(),
                password: "password".to_string(),
                name: "task_manager".to_string(),
                pool_size: 5,
                acquire_timeout_secs: 30,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                create_limit: RateLimitRule {
                    requests: 20,
                    window: Duration::from_secs(60),
                },
                update_limit: RateLimitRule {
                    requests: 30,
                    window: Duration::from_secs(60),
                },
                global_limit: RateLimitRule {
                    requests: 100,
                    window: Duration::from_secs(15 * 60),
                },
            },
            security: SecurityConfig {
                jwt_secret,
                cors_origins: split_origins("http://localhost:5173,http://localhost:3000"),
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, current: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(current),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("pool_size", &self.pool_size)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let err = AppConfig::from_vars(vars(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));

        let err = AppConfig::from_vars(vars(&[("JWT_SECRET", "")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::from_vars(vars(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.server.port, 8002);
        assert_eq!(config.database.host, "mysql");
        assert_eq!(config.database.pool_size, 5);
        assert_eq!(config.api.create_limit.requests, 20);
        assert_eq!(config.api.update_limit.requests, 30);
        assert_eq!(config.api.global_limit.window, Duration::from_secs(900));
        assert_eq!(
            config.security.cors_origins,
            vec!["http://localhost:5173", "http://localhost:3000"]
        );
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_vars(vars(&[
            ("JWT_SECRET", "s3cret"),
            ("NODE_ENV", "production"),
            ("PORT", "9000"),
            ("DB_HOST", "db.internal"),
            ("DB_POOL_SIZE", "12"),
            ("ALLOWED_ORIGINS", "https://app.example.com, https://admin.example.com"),
        ]))
        .unwrap();

        assert!(config.is_production());
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.pool_size, 12);
        assert_eq!(
            config.security.cors_origins,
            vec!["https://app.example.com", "https://admin.example.com"]
        );
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = AppConfig::from_vars(vars(&[("JWT_SECRET", "s"), ("DB_POOL_SIZE", "five")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DB_POOL_SIZE", .. }));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AppConfig::from_vars(vars(&[("JWT_SECRET", "topsecretvalue")])).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("topsecretvalue"));
        assert!(!rendered.contains("\"password\""));
    }
}
