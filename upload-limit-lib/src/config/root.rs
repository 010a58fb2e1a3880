use serde::Deserialize;
use std::net::SocketAddr;

use super::backend::{Backend, BackendPoolConfig, Route};
use super::telemetry::{LoggingConfig, TelemetryConfig};
use super::timeout::TimeoutConfig;
use super::upload_limit::{ThrottleConfig, UploadLimitSettings};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address and port to listen on
    /// Example: "0.0.0.0:7000" or "127.0.0.1:8080"
    pub listen: SocketAddr,
    /// List of backend servers
    /// At least one backend is required
    pub backends: Vec<Backend>,
    /// Path-based routing rules
    /// If no routes match, requests return 404
    #[serde(default)]
    pub routes: Vec<Route>,
    /// Global upload limit, inherited by every route
    #[serde(default)]
    pub upload_limit: UploadLimitSettings,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Timeout configuration
    #[serde(default)]
    pub timeout: TimeoutConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Backend connection pool configuration
    #[serde(default)]
    pub backend_pool: BackendPoolConfig,
}

impl Config {
    /// Effective upload limit for a route after inheriting from the global table.
    pub fn throttle_for(&self, route: &Route) -> ThrottleConfig {
        ThrottleConfig::resolve(route.upload_limit.as_ref(), &self.upload_limit)
    }
}
