//! Request body wrapper that runs chunks through the upload throttle.
//!
//! [`ThrottledBody`] plays the event loop for one request: its `poll_frame`
//! dispatches to whichever handler currently sits in the stream's read and
//! write slots, so pausing a body is nothing more than swapping those slots.

mod stream;
mod throttled;

pub use stream::{BodyHandler, BodyStream};
pub use throttled::{BodyError, ThrottledBody};
