//! Configuration management for Doorman.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::auth::Role;

/// Main configuration for the Doorman service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoormanConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Admission control configuration
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for DoormanConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            admission: AdmissionConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server address
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
        }
    }
}

fn default_http_addr() -> SocketAddr {
    "127.0.0.1:8000".parse().unwrap()
}

/// Admission control configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Maximum admitted requests per client per window
    #[serde(default = "default_capacity")]
    pub capacity: u32,

    /// Window duration in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Interval between idle-client sweeps in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            window_secs: default_window_secs(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_capacity() -> u32 {
    100
}

fn default_window_secs() -> u64 {
    60
}

fn default_sweep_interval() -> u64 {
    60
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Token signing secret; overridden by `DOORMAN_SECRET_KEY` when set
    #[serde(default = "default_secret_key")]
    pub secret_key: String,

    /// Access token lifetime in minutes
    #[serde(default = "default_access_ttl_minutes")]
    pub access_ttl_minutes: u64,

    /// Refresh token lifetime in days
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_ttl_days: u64,

    /// Accounts seeded into the in-memory identity store at startup
    #[serde(default)]
    pub demo_accounts: Vec<DemoAccount>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: default_secret_key(),
            access_ttl_minutes: default_access_ttl_minutes(),
            refresh_ttl_days: default_refresh_ttl_days(),
            demo_accounts: Vec::new(),
        }
    }
}

fn default_secret_key() -> String {
    "change-me-in-production".to_string()
}

fn default_access_ttl_minutes() -> u64 {
    30
}

fn default_refresh_ttl_days() -> u64 {
    7
}

/// A seeded account for demonstration and local development.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoAccount {
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl AuthConfig {
    /// Resolve the signing secret, preferring the environment over the file.
    pub fn resolve_secret(&self) -> String {
        std::env::var("DOORMAN_SECRET_KEY").unwrap_or_else(|_| self.secret_key.clone())
    }
}

impl DoormanConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: DoormanConfig = serde_yaml::from_str(&contents)
            .map_err(|e| crate::error::DoormanError::Config(e.to_string()))?;
        Ok(config)
    }
}
