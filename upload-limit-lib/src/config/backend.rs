use serde::Deserialize;

use super::upload_limit::UploadLimitSettings;

/// Backend server configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Backend {
    /// Backend server address (host:port format)
    /// Example: "storage-1:9000" or "192.168.1.10:8080"
    pub address: String,
}

/// Route configuration for path-based routing
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Route {
    /// URL path prefix to match (e.g., "/upload", "/api")
    /// Routes are matched in order, first match wins
    pub prefix: String,
    /// Backend address to route matching requests to
    /// Must match one of the backend addresses defined in `backends`
    pub backend: String,
    /// Path that will be used to replace the "prefix" part of incoming url
    /// Example: prefix = "/upload", replace_path = "/v1/objects"
    ///   Request: /upload/a.bin → Backend: /v1/objects/a.bin
    pub replace_path: Option<String>,
    /// Upload limit overrides for this route (optional)
    /// Unset fields inherit from the global `[upload_limit]` table
    #[serde(default)]
    pub upload_limit: Option<UploadLimitSettings>,
    /// Request header whose value overrides the upload rate for a single request
    /// The value uses size syntax ("256k"); invalid values are logged and ignored
    /// Default: None (no per-request override)
    #[serde(default)]
    pub rate_header: Option<String>,
}

/// Configuration for backend connection pool
///
/// Connection pooling reuses TCP connections to backends between requests.
#[derive(Clone, Debug, Deserialize)]
pub struct BackendPoolConfig {
    /// Idle timeout in seconds for pooled connections
    /// Default: 90 seconds
    #[serde(default = "default_backend_pool_idle_timeout")]
    pub idle_timeout: u64,

    /// Maximum number of idle connections to maintain per host
    /// 0 = unlimited (hyper default)
    /// Default: 0 (unlimited)
    #[serde(default)]
    pub pool_max_idle_per_host: usize,
}

impl Default for BackendPoolConfig {
    fn default() -> Self {
        Self { idle_timeout: default_backend_pool_idle_timeout(), pool_max_idle_per_host: 0 }
    }
}

fn default_backend_pool_idle_timeout() -> u64 {
    90
}
