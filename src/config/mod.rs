use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// Allowed CORS origins. Empty means allow any origin (native apps send none).
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("SERVER_ENABLE_REQUEST_LOGGING") {
            self.server.enable_request_logging =
                v.parse().unwrap_or(self.server.enable_request_logging);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout_secs =
                v.parse().unwrap_or(self.database.connection_timeout_secs);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("CORS_ORIGIN") {
            self.security.cors_origins =
                v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000, enable_request_logging: true },
            database: DatabaseConfig { max_connections: 5, connection_timeout_secs: 10 },
            security: SecurityConfig {
                // Development-only fallback; production requires JWT_SECRET
                jwt_secret: "dev-secret-change-me".to_string(),
                jwt_expiry_hours: 24,
                cors_origins: Vec::new(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000, enable_request_logging: true },
            database: DatabaseConfig { max_connections: 10, connection_timeout_secs: 10 },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                cors_origins: Vec::new(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000, enable_request_logging: false },
            database: DatabaseConfig { max_connections: 20, connection_timeout_secs: 5 },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 12,
                cors_origins: Vec::new(),
            },
        }
    }
}

static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

/// Global configuration singleton, loaded once from the environment
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let cfg = AppConfig::development();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.security.jwt_expiry_hours, 24);
        assert!(cfg.security.cors_origins.is_empty());
    }

    #[test]
    fn production_requires_explicit_secret() {
        let cfg = AppConfig::production();
        assert!(cfg.security.jwt_secret.is_empty());
    }

    #[test]
    fn request_logging_follows_the_environment() {
        assert!(AppConfig::development().server.enable_request_logging);
        assert!(AppConfig::staging().server.enable_request_logging);
        assert!(!AppConfig::production().server.enable_request_logging);
    }
}
