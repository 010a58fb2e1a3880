use tracing::error;

use super::context::ThrottleContext;
use crate::config::{parse_size, ThrottleConfig};

/// Name of the request-scoped upload rate variable
pub const RATE_VARIABLE: &str = "limit_upload_rate";

/// Read/write access to a stream's effective upload rate
pub struct RateVariable;

impl RateVariable {
    /// Decimal rate in bytes per second, falling back to the configured rate
    /// until the stream has one of its own.
    pub fn get<H>(ctx: Option<&ThrottleContext<H>>, config: &ThrottleConfig) -> String {
        ctx.and_then(|c| c.effective_rate())
            .unwrap_or(config.rate_limit)
            .to_string()
    }

    /// Parse `value` as a size and make it the stream's rate.
    ///
    /// Invalid input is logged and leaves the current rate in place. Returns
    /// whether the rate was updated.
    pub fn set<H>(ctx: &mut ThrottleContext<H>, value: &str) -> bool {
        match parse_size(value) {
            Ok(rate) => {
                ctx.set_rate(rate);
                true
            }
            Err(e) => {
                error!(variable = RATE_VARIABLE, ctx = ctx.id(), error = %e, "invalid size");
                false
            }
        }
    }
}
