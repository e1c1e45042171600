use std::env;

/// Seven days, matching the lifetime of the `session_id` cookie.
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 60 * 60 * 24 * 7;

/// AppConfig
///
/// Holds the application's entire configuration state. It is loaded once at startup,
/// never mutated afterwards, and pulled into handlers and extractors via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` selects the in-memory stores (local only).
    pub database_url: Option<String>,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // The single browser origin allowed to make credentialed requests.
    pub allowed_origin: String,
    // Lifetime of a login session, both server-side and as cookie Max-Age.
    pub session_ttl_seconds: u64,
    // Whether the session cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
    // Runtime environment marker. Controls the dev bypass and the log format.
    pub env: Env,
}

/// Env
///
/// Runtime context: local development or hardened production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration for test setup: local mode, in-memory stores.
    fn default() -> Self {
        Self {
            database_url: None,
            bind_addr: "127.0.0.1:8080".to_string(),
            allowed_origin: "http://localhost:3000".to_string(),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            cookie_secure: false,
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables (call `dotenv` first).
    ///
    /// # Errors
    /// Fails fast in production when `DATABASE_URL` is missing, and in any environment
    /// when a numeric or boolean variable cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        // An unknown value must not fall back to Local: that enables the dev bypass.
        let env = match env::var("APP_ENV") {
            Ok(raw) => match raw.trim() {
                "production" => Env::Production,
                "local" | "" => Env::Local,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "APP_ENV",
                        value: raw,
                    });
                }
            },
            Err(_) => Env::Local,
        };

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        if env == Env::Production && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let session_ttl_seconds = match env::var("SESSION_TTL_SECONDS") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "SESSION_TTL_SECONDS",
                value: raw,
            })?,
            Err(_) => DEFAULT_SESSION_TTL_SECONDS,
        };

        let cookie_secure = match env::var("COOKIE_SECURE") {
            Ok(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid {
                name: "COOKIE_SECURE",
                value: raw,
            })?,
            Err(_) => env == Env::Production,
        };

        Ok(Self {
            database_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            allowed_origin: env::var("ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            session_ttl_seconds,
            cookie_secure,
            env,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
