//! Upload rate throttling for request bodies.
//!
//! [`UploadThrottle`] watches every body chunk. Once a stream is ahead of
//! `rate_after + rate * (elapsed + 1)` bytes it swaps the stream's handlers
//! for a paused pair and arms a write timer sized to the excess.
//! [`resume::on_write_event`] restores the handlers when that timer fires.
//!
//! The host supplies the event loop through [`EventStream`]; nothing here
//! blocks or spawns.

mod context;
pub mod excess;
mod filter;
pub mod resume;
mod stream;
mod variable;

pub use context::{HandlerPair, StreamState, ThrottleContext};
pub use filter::{suspend, UploadThrottle};
pub use resume::ResumeOutcome;
pub use stream::EventStream;
pub use variable::{RateVariable, RATE_VARIABLE};
