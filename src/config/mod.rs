use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize, Serializer};
use std::env;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub guard: GuardConfig,
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
    /// Built site served for every path no API route claims.
    pub static_dir: Option<String>,
}

/// Hosted backend endpoint and the two credential levels used against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    /// Elevated key, server-side handlers only.
    pub service_role_key: Secret,
    /// Restricted key, safe for the route guard and browsers.
    pub anon_key: Secret,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub allow_any_origin: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    pub protected_prefixes: Vec<String>,
    pub excluded_prefixes: Vec<String>,
    pub token_cookie: String,
    pub login_path: String,
}

/// Credential string whose value never reaches logs or serialized config.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Secret(<unset>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_empty() {
            serializer.serialize_str("")
        } else {
            serializer.serialize_str("***")
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid backend URL: {0}")]
    InvalidBackendUrl(String),

    #[error("Invalid guard path '{0}': must start with '/'")]
    InvalidGuardPath(String),
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
        if let Some(port) = env::var("TAXEDU_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("STATIC_DIR") {
            self.server.static_dir = Some(v).filter(|dir| !dir.trim().is_empty());
        }

        // Backend overrides
        if let Ok(v) = env::var("BACKEND_URL") {
            self.backend.url = v.trim().to_string();
        }
        if let Ok(v) = env::var("BACKEND_SERVICE_ROLE_KEY") {
            self.backend.service_role_key = Secret::new(v.trim());
        }
        if let Ok(v) = env::var("BACKEND_ANON_KEY") {
            self.backend.anon_key = Secret::new(v.trim());
        }
        if let Ok(v) = env::var("BACKEND_TIMEOUT_SECS") {
            self.backend.timeout_secs = v.parse().unwrap_or(self.backend.timeout_secs);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
            self.security.allow_any_origin = false;
        }

        // Guard overrides
        if let Ok(v) = env::var("GUARD_PROTECTED_PREFIXES") {
            self.guard.protected_prefixes = split_list(&v);
        }
        if let Ok(v) = env::var("GUARD_TOKEN_COOKIE") {
            self.guard.token_cookie = v.trim().to_string();
        }
        if let Ok(v) = env::var("GUARD_LOGIN_PATH") {
            self.guard.login_path = v.trim().to_string();
        }

        self
    }

    /// Startup check for values that have no usable default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.url.is_empty() {
            return Err(ConfigError::Missing("BACKEND_URL"));
        }
        match url::Url::parse(&self.backend.url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => return Err(ConfigError::InvalidBackendUrl(self.backend.url.clone())),
        }
        if self.backend.service_role_key.is_empty() {
            return Err(ConfigError::Missing("BACKEND_SERVICE_ROLE_KEY"));
        }
        if self.backend.anon_key.is_empty() {
            return Err(ConfigError::Missing("BACKEND_ANON_KEY"));
        }

        let guard_paths = self
            .guard
            .protected_prefixes
            .iter()
            .chain(self.guard.excluded_prefixes.iter())
            .chain(std::iter::once(&self.guard.login_path));
        for path in guard_paths {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidGuardPath(path.clone()));
            }
        }
        if self.guard.token_cookie.is_empty() {
            return Err(ConfigError::Missing("GUARD_TOKEN_COOKIE"));
        }

        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                static_dir: None,
            },
            backend: BackendConfig::unset(30),
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                allow_any_origin: true,
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
            guard: GuardConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 8080,
                static_dir: None,
            },
            backend: BackendConfig::unset(15),
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                allow_any_origin: false,
                cors_origins: vec!["https://staging.taxacademy.example".to_string()],
            },
            guard: GuardConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8080,
                static_dir: None,
            },
            backend: BackendConfig::unset(10),
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 64 * 1024,
            },
            security: SecurityConfig {
                allow_any_origin: false,
                cors_origins: vec!["https://taxacademy.example".to_string()],
            },
            guard: GuardConfig::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl BackendConfig {
    fn unset(timeout_secs: u64) -> Self {
        Self {
            url: String::new(),
            service_role_key: Secret::default(),
            anon_key: Secret::default(),
            timeout_secs,
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            protected_prefixes: vec![
                "/dashboard".to_string(),
                "/profile".to_string(),
                "/my-courses".to_string(),
                "/settings".to_string(),
            ],
            excluded_prefixes: vec![
                "/api".to_string(),
                "/_next/static".to_string(),
                "/_next/image".to_string(),
                "/favicon.ico".to_string(),
            ],
            token_cookie: "sb-access-token".to_string(),
            login_path: "/login".to_string(),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
