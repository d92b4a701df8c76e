use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub oauth: OAuthConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory served under /app/json/
    pub json_dir: String,
    /// Directory holding the compiled client, served as the fallback at /
    pub pages_dir: String,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string, or `memory:` for the in-process store
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Gate every resource operation behind a session, not only the exercise listing
    pub require_session: bool,
    pub session_ttl_hours: u64,
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub callback_url: String,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    /// Client-side route the browser lands on after a successful login
    pub success_redirect: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("SERVER_JSON_DIR") {
            self.server.json_dir = v;
        }
        if let Ok(v) = env::var("SERVER_PAGES_DIR") {
            self.server.pages_dir = v;
        }
        if let Ok(v) = env::var("SERVER_MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes = v.parse().unwrap_or(self.server.max_request_size_bytes);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_REQUIRE_SESSION") {
            self.security.require_session = v.parse().unwrap_or(self.security.require_session);
        }
        if let Ok(v) = env::var("SECURITY_SESSION_TTL_HOURS") {
            self.security.session_ttl_hours = v.parse().unwrap_or(self.security.session_ttl_hours);
        }
        if let Ok(v) = env::var("SECURITY_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }

        // OAuth overrides
        if let Ok(v) = env::var("GOOGLE_CLIENT_ID") {
            self.oauth.client_id = v;
        }
        if let Ok(v) = env::var("GOOGLE_CLIENT_SECRET") {
            self.oauth.client_secret = v;
        }
        if let Ok(v) = env::var("GOOGLE_CALLBACK_URL") {
            self.oauth.callback_url = v;
        }
        if let Ok(v) = env::var("OAUTH_AUTHORIZE_URL") {
            self.oauth.authorize_url = v;
        }
        if let Ok(v) = env::var("OAUTH_TOKEN_URL") {
            self.oauth.token_url = v;
        }
        if let Ok(v) = env::var("OAUTH_USERINFO_URL") {
            self.oauth.userinfo_url = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 8080,
                json_dir: "app/json".to_string(),
                pages_dir: "pages".to_string(),
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                require_session: false,
                session_ttl_hours: 24 * 7, // 1 week
                secure_cookies: false,
            },
            oauth: OAuthConfig::google("http://localhost:8080/auth/google/callback"),
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 8080,
                json_dir: "app/json".to_string(),
                pages_dir: "pages".to_string(),
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                require_session: false,
                session_ttl_hours: 24,
                secure_cookies: true,
            },
            oauth: OAuthConfig::google("https://staging.example.com/auth/google/callback"),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8080,
                json_dir: "app/json".to_string(),
                pages_dir: "pages".to_string(),
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                require_session: false,
                session_ttl_hours: 24,
                secure_cookies: true,
            },
            oauth: OAuthConfig::google("https://app.example.com/auth/google/callback"),
        }
    }

    /// Development settings backed by the in-process store
    pub fn in_memory() -> Self {
        let mut config = Self::development();
        config.database.url = Some("memory:".to_string());
        config
    }
}

impl OAuthConfig {
    fn google(callback_url: &str) -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: callback_url.to_string(),
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            success_redirect: "/#/exercises".to_string(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 8080);
        assert!(!config.security.require_session);
        assert!(!config.security.secure_cookies);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.secure_cookies);
        assert_eq!(config.database.max_connections, 50);
        assert_eq!(config.oauth.success_redirect, "/#/exercises");
    }

    #[test]
    fn in_memory_config_selects_memory_store() {
        let config = AppConfig::in_memory();
        assert_eq!(config.database.url.as_deref(), Some("memory:"));
    }

    #[test]
    fn client_secret_is_not_serialized() {
        let mut config = AppConfig::development();
        config.oauth.client_secret = "hunter2".to_string();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
    }
}
