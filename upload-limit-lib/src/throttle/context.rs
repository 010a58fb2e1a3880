use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// The read and write handlers of a stream, always moved as one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerPair<H> {
    pub read: H,
    pub write: H,
}

impl<H> HandlerPair<H> {
    pub fn new(read: H, write: H) -> Self {
        Self { read, write }
    }
}

/// Lifecycle of a throttled stream
///
/// The consumer's handlers are held only while `Paused`, so a saved pair
/// exists exactly when the stream is paused.
#[derive(Debug)]
pub enum StreamState<H> {
    Flowing,
    Paused(HandlerPair<H>),
    Terminated,
}

/// Per-stream throttle state, owned by the stream for its whole lifetime
#[derive(Debug)]
pub struct ThrottleContext<H> {
    id: u64,
    received: u64,
    rate: Option<u64>,
    state: StreamState<H>,
}

impl<H> Default for ThrottleContext<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> ThrottleContext<H> {
    pub fn new() -> Self {
        Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            received: 0,
            rate: None,
            state: StreamState::Flowing,
        }
    }

    /// Identity used in diagnostics
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Body bytes observed so far
    pub fn received(&self) -> u64 {
        self.received
    }

    pub(crate) fn record(&mut self, bytes: u64) {
        self.received = self.received.saturating_add(bytes);
    }

    /// Rate applied to this stream, if one has been set or derived yet
    pub fn effective_rate(&self) -> Option<u64> {
        self.rate
    }

    /// Override the rate for this stream; it is never re-derived from config afterwards.
    pub fn set_rate(&mut self, rate: u64) {
        self.rate = Some(rate);
    }

    /// Effective rate, taking `default` on first use.
    pub fn rate_or(&mut self, default: u64) -> u64 {
        *self.rate.get_or_insert(default)
    }

    pub fn state(&self) -> &StreamState<H> {
        &self.state
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, StreamState::Paused(_))
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, StreamState::Terminated)
    }

    /// Saved handlers, present only while paused
    pub fn saved_handlers(&self) -> Option<&HandlerPair<H>> {
        match &self.state {
            StreamState::Paused(saved) => Some(saved),
            _ => None,
        }
    }

    pub(crate) fn pause(&mut self, saved: HandlerPair<H>) {
        self.state = StreamState::Paused(saved);
    }

    /// Leave the paused state, handing back the handlers captured when it began.
    pub(crate) fn take_saved(&mut self) -> Option<HandlerPair<H>> {
        match std::mem::replace(&mut self.state, StreamState::Flowing) {
            StreamState::Paused(saved) => Some(saved),
            other => {
                self.state = other;
                None
            }
        }
    }

    pub fn terminate(&mut self) {
        self.state = StreamState::Terminated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_saved_returns_pair_and_resumes_flowing() {
        let mut ctx = ThrottleContext::new();
        ctx.pause(HandlerPair::new("read", "write"));

        assert_eq!(ctx.take_saved(), Some(HandlerPair::new("read", "write")));
        assert!(matches!(ctx.state(), StreamState::Flowing));
        assert_eq!(ctx.take_saved(), None);
    }

    #[test]
    fn take_saved_keeps_terminated_state() {
        let mut ctx = ThrottleContext::<&str>::new();
        ctx.terminate();

        assert_eq!(ctx.take_saved(), None);
        assert!(ctx.is_terminated());
    }
}
