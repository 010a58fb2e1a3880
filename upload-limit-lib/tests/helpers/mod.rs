//! Shared test helpers

#![allow(dead_code)]

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::time::Duration;

use upload_limit_lib::throttle::{EventStream, HandlerPair, ThrottleContext};
use upload_limit_lib::ThrottleError;

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub const CONSUMER_READ: &str = "consumer_read";
pub const CONSUMER_WRITE: &str = "consumer_write";
pub const TEST_READING: &str = "test_reading";
pub const DELAY: &str = "delay";

pub fn pick_free_port() -> TestResult<SocketAddr> {
    let listener = StdTcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// In-memory stream with a hand-driven clock and injectable failures
pub struct FakeStream {
    pub start: u64,
    pub now: u64,
    pub ctx: ThrottleContext<&'static str>,
    pub handlers: HandlerPair<&'static str>,
    pub timer: Option<Duration>,
    pub timer_arms: u32,
    pub timed_out: bool,
    pub read_watches: u32,
    pub write_watches: u32,
    pub read_runs: u32,
    pub fail_read: bool,
    pub fail_write: bool,
    pub fail_timer: bool,
}

impl Default for FakeStream {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeStream {
    pub fn new() -> Self {
        Self {
            start: 0,
            now: 0,
            ctx: ThrottleContext::new(),
            handlers: HandlerPair::new(CONSUMER_READ, CONSUMER_WRITE),
            timer: None,
            timer_arms: 0,
            timed_out: false,
            read_watches: 0,
            write_watches: 0,
            read_runs: 0,
            fail_read: false,
            fail_write: false,
            fail_timer: false,
        }
    }

    /// Let the armed write timer expire.
    pub fn fire_timer(&mut self) {
        if self.timer.take().is_some() {
            self.timed_out = true;
        }
    }
}

impl EventStream for FakeStream {
    type Handler = &'static str;

    fn start_secs(&self) -> u64 {
        self.start
    }

    fn now_secs(&self) -> u64 {
        self.now
    }

    fn throttle_context(&mut self) -> &mut ThrottleContext<&'static str> {
        &mut self.ctx
    }

    fn replace_handlers(
        &mut self,
        handlers: HandlerPair<&'static str>,
    ) -> HandlerPair<&'static str> {
        std::mem::replace(&mut self.handlers, handlers)
    }

    fn paused_handlers(&self) -> HandlerPair<&'static str> {
        HandlerPair::new(TEST_READING, DELAY)
    }

    fn watch_read(&mut self) -> Result<(), ThrottleError> {
        if self.fail_read {
            return Err(ThrottleError::ReadEvent("injected".into()));
        }
        self.read_watches += 1;
        Ok(())
    }

    fn watch_write(&mut self) -> Result<(), ThrottleError> {
        if self.fail_write {
            return Err(ThrottleError::WriteEvent("injected".into()));
        }
        self.write_watches += 1;
        Ok(())
    }

    fn arm_write_timer(&mut self, delay: Duration) -> Result<(), ThrottleError> {
        if self.fail_timer {
            return Err(ThrottleError::ArmTimer("injected".into()));
        }
        self.timer = Some(delay);
        self.timer_arms += 1;
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
    }
}
