//! Collab Gate configuration.
//!
//! Configuration is loaded from environment variables. The verification key
//! is held as a `SecretString` and redacted in Debug output.

use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use common::secret::SecretString;
use reqwest::Url;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3002;

/// Default listen host.
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Default namespace handed to the synchronization engine.
pub const DEFAULT_REDIS_PREFIX: &str = "y";

/// Default timeout for a single permission lookup in milliseconds.
pub const DEFAULT_PERM_CHECK_TIMEOUT_MS: u64 = 5_000;

/// Upper bound for the permission lookup timeout in milliseconds.
pub const MAX_PERM_CHECK_TIMEOUT_MS: u64 = 60_000;

/// Default shutdown drain window in seconds.
pub const DEFAULT_DRAIN_SECONDS: u64 = 5;

/// Which transport the process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Raw WebSocket, credential in the `yauth` query parameter.
    WebSocket,
    /// Socket.IO, credential in the `yauth` handshake query field.
    SocketIo,
}

impl TransportKind {
    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::WebSocket => "websocket",
            TransportKind::SocketIo => "socketio",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collab Gate configuration.
#[derive(Clone)]
pub struct Config {
    /// Verification key as JWK JSON (public components only are used).
    pub auth_public_key: SecretString,

    /// Base URL of the authorization service (`GET {base}/{room}/{user}`).
    pub perm_callback_url: String,

    /// Listen host (default: "0.0.0.0").
    pub bind_host: String,

    /// Listen port (default: 3002). Port 0 binds an ephemeral port.
    pub port: u16,

    /// Transport served by this process (default: websocket).
    pub transport: TransportKind,

    /// Opaque namespace for the synchronization engine (default: "y").
    pub redis_prefix: String,

    /// Timeout for a single permission lookup.
    pub perm_check_timeout: Duration,

    /// Leeway for `exp`/`nbf` and maximum future `iat`, in seconds.
    pub jwt_clock_skew_seconds: u64,

    /// How long `destroy()` waits for in-flight requests before aborting.
    pub drain_seconds: u64,

    /// Optional Prometheus exporter listen address.
    pub metrics_bind_address: Option<String>,
}

/// Custom Debug implementation that redacts the verification key.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("auth_public_key", &"[REDACTED]")
            .field("perm_callback_url", &self.perm_callback_url)
            .field("bind_host", &self.bind_host)
            .field("port", &self.port)
            .field("transport", &self.transport)
            .field("redis_prefix", &self.redis_prefix)
            .field("perm_check_timeout", &self.perm_check_timeout)
            .field("jwt_clock_skew_seconds", &self.jwt_clock_skew_seconds)
            .field("drain_seconds", &self.drain_seconds)
            .field("metrics_bind_address", &self.metrics_bind_address)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid port configuration: {0}")]
    InvalidPort(String),

    #[error("Invalid transport configuration: {0}")]
    InvalidTransport(String),

    #[error("Invalid permission callback URL: {0}")]
    InvalidPermCallbackUrl(String),

    #[error("Invalid permission check timeout configuration: {0}")]
    InvalidPermCheckTimeout(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid drain configuration: {0}")]
    InvalidDrainSeconds(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let auth_public_key = vars
            .get("AUTH_PUBLIC_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("AUTH_PUBLIC_KEY".to_string()))?;
        let auth_public_key = SecretString::from(auth_public_key.clone());

        let perm_callback_url = vars
            .get("AUTH_PERM_CALLBACK")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("AUTH_PERM_CALLBACK".to_string()))?
            .clone();
        validate_callback_url(&perm_callback_url)?;

        let bind_host = vars
            .get("BIND_HOST")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_HOST.to_string());

        let port = if let Some(value_str) = vars.get("PORT") {
            value_str.parse::<u16>().map_err(|e| {
                ConfigError::InvalidPort(format!(
                    "PORT must be an integer between 0 and 65535, got '{}': {}",
                    value_str, e
                ))
            })?
        } else {
            DEFAULT_PORT
        };

        let transport = match vars.get("TRANSPORT").map(|v| v.to_ascii_lowercase()) {
            None => TransportKind::WebSocket,
            Some(value) => match value.as_str() {
                "websocket" | "ws" => TransportKind::WebSocket,
                "socketio" | "socket.io" => TransportKind::SocketIo,
                other => {
                    return Err(ConfigError::InvalidTransport(format!(
                        "TRANSPORT must be 'websocket' or 'socketio', got '{}'",
                        other
                    )))
                }
            },
        };

        let redis_prefix = vars
            .get("REDIS_PREFIX")
            .cloned()
            .unwrap_or_else(|| DEFAULT_REDIS_PREFIX.to_string());

        let perm_check_timeout_ms = if let Some(value_str) = vars.get("PERM_CHECK_TIMEOUT_MS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidPermCheckTimeout(format!(
                    "PERM_CHECK_TIMEOUT_MS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidPermCheckTimeout(
                    "PERM_CHECK_TIMEOUT_MS must be greater than 0".to_string(),
                ));
            }

            if value > MAX_PERM_CHECK_TIMEOUT_MS {
                return Err(ConfigError::InvalidPermCheckTimeout(format!(
                    "PERM_CHECK_TIMEOUT_MS must not exceed {}, got {}",
                    MAX_PERM_CHECK_TIMEOUT_MS, value
                )));
            }

            value
        } else {
            DEFAULT_PERM_CHECK_TIMEOUT_MS
        };

        let jwt_clock_skew_seconds = if let Some(value_str) = vars.get("JWT_CLOCK_SKEW_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidJwtClockSkew(
                    "JWT_CLOCK_SKEW_SECONDS must be positive, got 0".to_string(),
                ));
            }

            if value > MAX_CLOCK_SKEW.as_secs() {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                    MAX_CLOCK_SKEW.as_secs(),
                    value
                )));
            }

            value
        } else {
            DEFAULT_CLOCK_SKEW.as_secs()
        };

        let drain_seconds = if let Some(value_str) = vars.get("DRAIN_SECONDS") {
            value_str.parse::<u64>().map_err(|e| {
                ConfigError::InvalidDrainSeconds(format!(
                    "DRAIN_SECONDS must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?
        } else {
            DEFAULT_DRAIN_SECONDS
        };

        let metrics_bind_address = vars
            .get("METRICS_BIND_ADDRESS")
            .filter(|v| !v.trim().is_empty())
            .cloned();

        Ok(Config {
            auth_public_key,
            perm_callback_url,
            bind_host,
            port,
            transport,
            redis_prefix,
            perm_check_timeout: Duration::from_millis(perm_check_timeout_ms),
            jwt_clock_skew_seconds,
            drain_seconds,
            metrics_bind_address,
        })
    }

    /// Clock skew tolerance as a `Duration`.
    pub fn jwt_clock_skew(&self) -> Duration {
        Duration::from_secs(self.jwt_clock_skew_seconds)
    }
}

/// The callback must be an absolute http(s) URL that can carry path segments.
fn validate_callback_url(value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| {
        ConfigError::InvalidPermCallbackUrl(format!(
            "AUTH_PERM_CALLBACK must be an absolute URL, got '{}': {}",
            value, e
        ))
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::InvalidPermCallbackUrl(format!(
            "AUTH_PERM_CALLBACK must use http or https, got '{}'",
            url.scheme()
        )));
    }

    Ok(())
}
