//! Configuration schema definitions.
//!
//! All sections are optional in the TOML file; missing values fall back to
//! their defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration of the client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URLs of the service. Empty means the built-in set for the
    /// configured authentication method.
    pub endpoints: Vec<String>,

    /// `User-Agent` override; an empty string omits the header.
    pub user_agent: Option<String>,

    pub auth: AuthConfig,

    pub timeouts: TimeoutConfig,

    pub polling: PollingConfig,

    pub observability: ObservabilityConfig,
}

/// How requests are authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    #[default]
    Basic,
    Bearer,
    ClientCertificate,
}

/// Credentials.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    pub method: AuthMethod,

    /// Username for `basic` and `bearer`.
    pub username: Option<String>,

    /// Password for `basic` and `bearer`. Prefer `EMAILVERIFY_PASSWORD`.
    pub password: Option<String>,

    /// PKCS#12 archive for `client_certificate`.
    pub pkcs12_path: Option<PathBuf>,

    /// Passphrase of the PKCS#12 archive. Prefer `EMAILVERIFY_PASSPHRASE`.
    pub passphrase: Option<String>,
}

/// Transport timeouts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Whole request timeout in seconds. Must exceed the poll wait time,
    /// since the service may hold poll responses that long.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            request_secs: 60,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

/// Job completion polling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// How long the service may hold the submission response.
    pub submission_wait_secs: u64,
    /// How long the service may hold each poll response.
    pub poll_wait_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 500,
            max_delay_ms: 30_000,
            submission_wait_secs: 30,
            poll_wait_secs: 30,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
