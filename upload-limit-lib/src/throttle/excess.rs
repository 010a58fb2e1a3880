//! Rate arithmetic for the upload throttle.
//!
//! The allowance is cumulative: a stream may have consumed
//! `rate_after + rate * elapsed` bytes by `elapsed` seconds. Anything above
//! that is excess and is paid back as a pause of `excess / rate` seconds.

use std::time::Duration;

/// Seconds since the stream started, plus one.
///
/// The extra second lets a stream take `rate` bytes immediately and keeps the
/// first interval from being empty.
pub fn elapsed_secs(start_secs: u64, now_secs: u64) -> u64 {
    now_secs.saturating_sub(start_secs).saturating_add(1)
}

/// Bytes received beyond the allowance for `elapsed` seconds.
///
/// Positive means the stream is ahead of its rate.
pub fn excess(received: u64, rate_after: u64, rate: u64, elapsed: u64) -> i128 {
    let allowance = i128::from(rate).saturating_mul(i128::from(elapsed));
    i128::from(received)
        .saturating_sub(i128::from(rate_after))
        .saturating_sub(allowance)
}

/// Pause needed to pay back `excess` bytes at `rate` bytes per second.
///
/// Milliseconds are truncated toward zero, so pauses err on the short side.
pub fn delay_for(excess: i128, rate: u64) -> Duration {
    if excess <= 0 || rate == 0 {
        return Duration::ZERO;
    }
    let millis = excess.saturating_mul(1000) / i128::from(rate);
    Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
}
