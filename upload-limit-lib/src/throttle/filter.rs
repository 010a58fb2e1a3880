use bytes::Bytes;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::excess::{delay_for, elapsed_secs, excess};
use super::stream::EventStream;
use crate::config::{ThrottleConfig, ThrottleLogLevel};
use crate::error::ThrottleError;
use crate::pipeline::{BodyFilter, ChunkOutcome};

/// Request body stage that holds a stream to its configured upload rate
///
/// Chunks are always forwarded first; the throttle only decides whether the
/// host may ask for the next chunk right away or must wait.
#[derive(Debug, Clone)]
pub struct UploadThrottle<N> {
    config: ThrottleConfig,
    next: N,
}

impl<N> UploadThrottle<N> {
    pub fn new(config: ThrottleConfig, next: N) -> Self {
        Self { config, next }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }
}

impl<S, N> BodyFilter<S> for UploadThrottle<N>
where
    S: EventStream,
    N: BodyFilter<S>,
{
    fn on_chunk(&mut self, stream: &mut S, chunk: &Bytes) -> Result<ChunkOutcome, ThrottleError> {
        let downstream = self.next.on_chunk(stream, chunk)?;

        let period = elapsed_secs(stream.start_secs(), stream.now_secs());
        let ctx = stream.throttle_context();
        ctx.record(chunk.len() as u64);

        let rate = ctx.rate_or(self.config.rate_limit);
        if rate == 0 || ctx.is_terminated() {
            return Ok(downstream);
        }

        let id = ctx.id();
        let received = ctx.received();
        let excess = excess(received, self.config.rate_limit_after, rate, period);

        debug!(ctx = id, received, excess, limit_rate = rate, period, "limit upload");

        if excess <= 0 {
            return Ok(downstream);
        }

        let delay = delay_for(excess, rate);
        // a later stage asking for a longer wait keeps its own timer
        if let ChunkOutcome::Defer(requested) = downstream {
            if requested >= delay {
                return Ok(downstream);
            }
        }

        debug!(delay_ms = delay.as_millis() as u64, "limit upload: delay");
        suspend(stream, delay)?;
        report_pause(self.config.log_level, id, received, rate, delay);
        Ok(ChunkOutcome::Defer(delay))
    }
}

/// Pause `stream` for `delay`.
///
/// Read interest is re-registered, the write timer armed, and only then are
/// the handlers swapped, so a failure leaves the stream flowing. On a stream
/// that is already paused the timer is re-armed and the saved pair kept.
pub fn suspend<S: EventStream>(stream: &mut S, delay: Duration) -> Result<(), ThrottleError> {
    stream.watch_read()?;
    stream.arm_write_timer(delay)?;

    if stream.throttle_context().is_paused() {
        return Ok(());
    }

    let paused = stream.paused_handlers();
    let saved = stream.replace_handlers(paused);
    stream.throttle_context().pause(saved);
    Ok(())
}

fn report_pause(level: ThrottleLogLevel, ctx: u64, received: u64, rate: u64, delay: Duration) {
    let delay_ms = delay.as_millis() as u64;
    match level {
        ThrottleLogLevel::Info | ThrottleLogLevel::Notice => {
            info!(ctx, received, limit_rate = rate, delay_ms, "limiting upload rate")
        }
        ThrottleLogLevel::Warn => {
            warn!(ctx, received, limit_rate = rate, delay_ms, "limiting upload rate")
        }
        ThrottleLogLevel::Error => {
            error!(ctx, received, limit_rate = rate, delay_ms, "limiting upload rate")
        }
    }
}
