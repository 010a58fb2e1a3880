use std::time::Duration;

use super::context::{HandlerPair, ThrottleContext};
use crate::error::ThrottleError;

/// Event-loop capabilities of a stream whose body is being throttled
///
/// The host owns the I/O loop; the throttle only swaps the stream's handler
/// slots, asks for readiness notifications and arms a one-shot write timer.
/// All calls for one stream are serialized by the host.
pub trait EventStream {
    /// Callback type stored in the read and write handler slots
    type Handler;

    /// Second at which the request started
    fn start_secs(&self) -> u64;

    /// Current time in whole seconds, on the same clock as `start_secs`
    fn now_secs(&self) -> u64;

    /// Throttle state for this stream, created on first access
    fn throttle_context(&mut self) -> &mut ThrottleContext<Self::Handler>;

    /// Install `handlers` and return the pair they replace.
    fn replace_handlers(
        &mut self,
        handlers: HandlerPair<Self::Handler>,
    ) -> HandlerPair<Self::Handler>;

    /// Handlers active while paused: a reading-only read handler and the
    /// resume callback as write handler.
    fn paused_handlers(&self) -> HandlerPair<Self::Handler>;

    /// Keep the read side registered without re-arming read progress.
    fn watch_read(&mut self) -> Result<(), ThrottleError>;

    /// Re-register interest in write readiness.
    fn watch_write(&mut self) -> Result<(), ThrottleError>;

    /// Arm the one-shot timer on the write side.
    fn arm_write_timer(&mut self, delay: Duration) -> Result<(), ThrottleError>;

    /// Whether the write timer has expired since it was last cleared
    fn write_timed_out(&self) -> bool;

    fn clear_write_timeout(&mut self);

    /// Invoke the current read handler once.
    fn run_read_handler(&mut self);
}
