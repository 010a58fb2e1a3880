use std::mem;
use std::pin::Pin;
use std::task::Waker;
use std::time::Duration;
use tokio::time::{Instant, Sleep};

use crate::error::ThrottleError;
use crate::throttle::{EventStream, HandlerPair, ThrottleContext};

/// Callbacks a [`ThrottledBody`](super::ThrottledBody) can dispatch to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyHandler {
    /// Pull the next frame from the client
    Read,
    /// Keep the connection registered but pull nothing
    TestReading,
    /// Wait for the write timer, then resume
    Delay,
    /// No-op
    Idle,
}

impl BodyHandler {
    pub fn flowing() -> HandlerPair<BodyHandler> {
        HandlerPair::new(BodyHandler::Read, BodyHandler::Idle)
    }
}

/// Event-loop state of one request body
pub struct BodyStream {
    started: Instant,
    context: Option<ThrottleContext<BodyHandler>>,
    handlers: HandlerPair<BodyHandler>,
    timer: Option<Pin<Box<Sleep>>>,
    timed_out: bool,
    read_waker: Option<Waker>,
    read_runs: u64,
}

impl Default for BodyStream {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyStream {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            context: None,
            handlers: BodyHandler::flowing(),
            timer: None,
            timed_out: false,
            read_waker: None,
            read_runs: 0,
        }
    }

    pub fn handlers(&self) -> &HandlerPair<BodyHandler> {
        &self.handlers
    }

    /// Throttle state, if the throttle has touched this stream yet
    pub fn context(&self) -> Option<&ThrottleContext<BodyHandler>> {
        self.context.as_ref()
    }

    /// Times the read handler was re-invoked after a pause
    pub fn read_runs(&self) -> u64 {
        self.read_runs
    }

    pub(super) fn timer_mut(&mut self) -> Option<Pin<&mut Sleep>> {
        self.timer.as_mut().map(|t| t.as_mut())
    }

    pub(super) fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// Record that the write timer fired.
    pub(super) fn expire_timer(&mut self) {
        self.timer = None;
        self.timed_out = true;
    }

    pub(super) fn park_reader(&mut self, waker: &Waker) {
        match &self.read_waker {
            Some(current) if current.will_wake(waker) => {}
            _ => self.read_waker = Some(waker.clone()),
        }
    }

    pub(super) fn reset_handlers(&mut self) {
        self.handlers = BodyHandler::flowing();
    }
}

impl EventStream for BodyStream {
    type Handler = BodyHandler;

    fn start_secs(&self) -> u64 {
        0
    }

    fn now_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    fn throttle_context(&mut self) -> &mut ThrottleContext<BodyHandler> {
        self.context.get_or_insert_with(ThrottleContext::new)
    }

    fn replace_handlers(&mut self, handlers: HandlerPair<BodyHandler>) -> HandlerPair<BodyHandler> {
        mem::replace(&mut self.handlers, handlers)
    }

    fn paused_handlers(&self) -> HandlerPair<BodyHandler> {
        HandlerPair::new(BodyHandler::TestReading, BodyHandler::Delay)
    }

    // Readiness is implied by the next poll; hyper keeps the connection registered.
    fn watch_read(&mut self) -> Result<(), ThrottleError> {
        Ok(())
    }

    fn watch_write(&mut self) -> Result<(), ThrottleError> {
        if self.timer.is_none() && !self.timed_out {
            return Err(ThrottleError::WriteEvent("no write timer armed".into()));
        }
        Ok(())
    }

    fn arm_write_timer(&mut self, delay: Duration) -> Result<(), ThrottleError> {
        let deadline = Instant::now()
            .checked_add(delay)
            .ok_or_else(|| ThrottleError::ArmTimer(format!("delay {delay:?} out of range")))?;

        match self.timer.as_mut() {
            Some(timer) => timer.as_mut().reset(deadline),
            None => self.timer = Some(Box::pin(tokio::time::sleep_until(deadline))),
        }
        self.timed_out = false;
        Ok(())
    }

    fn write_timed_out(&self) -> bool {
        self.timed_out
    }

    fn clear_write_timeout(&mut self) {
        self.timed_out = false;
    }

    fn run_read_handler(&mut self) {
        self.read_runs += 1;
        if let Some(waker) = self.read_waker.take() {
            waker.wake();
        }
    }
}
