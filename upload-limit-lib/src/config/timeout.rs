use serde::Deserialize;

/// Timeout configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TimeoutConfig {
    /// Graceful shutdown timeout in seconds
    /// Default: 30
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_secs: u64,
    /// Total connection handling timeout in seconds
    /// Upload throttling stretches request bodies, so keep this well above
    /// the largest expected body divided by the slowest configured rate
    /// Default: 3600 seconds (1 hour)
    #[serde(default = "default_connection_handling_timeout")]
    pub connection_handling_secs: u64,
    /// TCP keep-alive for backend connections in seconds
    /// Default: 60
    #[serde(default = "default_keep_alive_timeout")]
    pub keep_alive_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            shutdown_secs: default_shutdown_timeout(),
            connection_handling_secs: default_connection_handling_timeout(),
            keep_alive_secs: default_keep_alive_timeout(),
        }
    }
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_connection_handling_timeout() -> u64 {
    3600
}

fn default_keep_alive_timeout() -> u64 {
    60
}
