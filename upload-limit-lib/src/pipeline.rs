//! Ordered chain of request body stages.
//!
//! Each stage owns the next one and forwards every chunk to it before doing
//! its own work, so a chain reads outermost-first:
//! `UploadThrottle<ByteCounter<Passthrough>>`.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ThrottleError;
use crate::telemetry::Metrics;

/// What the host should do after a chunk has been handed downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Keep reading immediately
    Continue,
    /// Reading is suspended; it resumes once the delay has elapsed
    Defer(Duration),
}

impl ChunkOutcome {
    pub fn is_deferred(&self) -> bool {
        matches!(self, ChunkOutcome::Defer(_))
    }
}

/// One stage of the body processing chain
pub trait BodyFilter<S: ?Sized> {
    fn on_chunk(&mut self, stream: &mut S, chunk: &Bytes) -> Result<ChunkOutcome, ThrottleError>;
}

impl<S: ?Sized, F: BodyFilter<S> + ?Sized> BodyFilter<S> for Box<F> {
    fn on_chunk(&mut self, stream: &mut S, chunk: &Bytes) -> Result<ChunkOutcome, ThrottleError> {
        (**self).on_chunk(stream, chunk)
    }
}

/// Terminal stage
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl<S: ?Sized> BodyFilter<S> for Passthrough {
    fn on_chunk(&mut self, _stream: &mut S, _chunk: &Bytes) -> Result<ChunkOutcome, ThrottleError> {
        Ok(ChunkOutcome::Continue)
    }
}

/// Counts body bytes per route into the metrics registry
pub struct ByteCounter<N> {
    metrics: Option<Arc<Metrics>>,
    route: String,
    next: N,
}

impl<N> ByteCounter<N> {
    pub fn new(metrics: Option<Arc<Metrics>>, route: impl Into<String>, next: N) -> Self {
        Self { metrics, route: route.into(), next }
    }
}

impl<S: ?Sized, N: BodyFilter<S>> BodyFilter<S> for ByteCounter<N> {
    fn on_chunk(&mut self, stream: &mut S, chunk: &Bytes) -> Result<ChunkOutcome, ThrottleError> {
        let outcome = self.next.on_chunk(stream, chunk)?;
        if let Some(m) = &self.metrics {
            m.record_upload_bytes(chunk.len() as u64, &self.route);
        }
        Ok(outcome)
    }
}
