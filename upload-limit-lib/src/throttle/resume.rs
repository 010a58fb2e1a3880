use tracing::debug;

use super::stream::EventStream;
use crate::error::ThrottleError;

/// Result of a write-side wake on a throttled stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// Woken before the timer expired; the pause continues
    Waiting,
    /// Timer expired; handlers restored and the read handler invoked
    Resumed,
    /// The stream was not paused
    Idle,
}

/// Write handler installed while a stream is paused.
///
/// Only an expired write timer lifts the pause. A write-readiness wake before
/// the deadline just re-registers write interest. An error means the stream
/// can no longer make progress and the request must be aborted.
pub fn on_write_event<S: EventStream>(stream: &mut S) -> Result<ResumeOutcome, ThrottleError> {
    let ctx = stream.throttle_context();
    debug!(ctx = ctx.id(), "limit upload delay");

    if !ctx.is_paused() {
        return Ok(ResumeOutcome::Idle);
    }

    if !stream.write_timed_out() {
        stream.watch_write()?;
        return Ok(ResumeOutcome::Waiting);
    }

    stream.clear_write_timeout();
    stream.watch_read()?;

    let Some(saved) = stream.throttle_context().take_saved() else {
        return Ok(ResumeOutcome::Idle);
    };
    stream.replace_handlers(saved);
    stream.run_read_handler();

    Ok(ResumeOutcome::Resumed)
}
