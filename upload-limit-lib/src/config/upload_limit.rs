use serde::Deserialize;

use super::size::ByteSize;

/// Verbosity used when the throttle reports a pause
///
/// Diagnostic only; the level never changes throttling behaviour.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThrottleLogLevel {
    Info,
    Notice,
    Warn,
    #[default]
    Error,
}

/// Upload limit tunables as written at one configuration tier
///
/// Used both for the global `[upload_limit]` table and for a route's
/// `upload_limit` table. Unset fields fall back to the next tier.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct UploadLimitSettings {
    /// Maximum request body rate in bytes per second
    /// Accepts an integer or a size string ("512k", "1m")
    /// 0 disables throttling
    /// Default: 0
    #[serde(default)]
    pub rate: Option<ByteSize>,
    /// Bytes accepted before throttling starts
    /// Default: 0
    #[serde(default)]
    pub rate_after: Option<ByteSize>,
    /// Level at which pauses are logged: "info", "notice", "warn", "error"
    /// Default: "error"
    #[serde(default)]
    pub log_level: Option<ThrottleLogLevel>,
}

/// Ordered fallback: the child value wins, then the parent, then the default.
pub fn resolve<T>(child: Option<T>, parent: Option<T>, default: T) -> T {
    child.or(parent).unwrap_or(default)
}

/// Resolved, immutable upload limit for one route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThrottleConfig {
    /// Bytes per second; 0 means unlimited
    pub rate_limit: u64,
    /// Free allowance before the rate applies
    pub rate_limit_after: u64,
    pub log_level: ThrottleLogLevel,
}

impl ThrottleConfig {
    pub fn new(rate_limit: u64, rate_limit_after: u64) -> Self {
        Self { rate_limit, rate_limit_after, log_level: ThrottleLogLevel::default() }
    }

    /// Resolve each field independently: route, then global, then built-in default.
    pub fn resolve(route: Option<&UploadLimitSettings>, global: &UploadLimitSettings) -> Self {
        let route = route.cloned().unwrap_or_default();
        Self {
            rate_limit: resolve(route.rate, global.rate, ByteSize(0)).bytes(),
            rate_limit_after: resolve(route.rate_after, global.rate_after, ByteSize(0)).bytes(),
            log_level: resolve(route.log_level, global.log_level, ThrottleLogLevel::Error),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.rate_limit > 0
    }
}
