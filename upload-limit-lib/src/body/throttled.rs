use bytes::Bytes;
use hyper::body::{Body, Frame, SizeHint};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tracing::{debug, warn};

use super::stream::{BodyHandler, BodyStream};
use crate::config::ThrottleConfig;
use crate::error::ThrottleError;
use crate::pipeline::{BodyFilter, ByteCounter, ChunkOutcome, Passthrough};
use crate::telemetry::Metrics;
use crate::throttle::{resume, suspend, EventStream, RateVariable, ResumeOutcome, UploadThrottle};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced while reading a throttled body
#[derive(Error, Debug)]
pub enum BodyError {
    #[error("request body error: {0}")]
    Inner(BoxError),

    #[error("upload throttle: {0}")]
    Throttle(#[from] ThrottleError),
}

/// Request body whose data frames pass through an upload throttle chain
pub struct ThrottledBody<B> {
    inner: B,
    stream: BodyStream,
    filter: Box<dyn BodyFilter<BodyStream> + Send>,
    config: ThrottleConfig,
    metrics: Option<Arc<Metrics>>,
    route: String,
    done: bool,
}

impl<B> ThrottledBody<B> {
    pub fn new(inner: B, config: ThrottleConfig) -> Self {
        Self::with_metrics(inner, config, None, String::new())
    }

    /// Throttle plus a per-route byte counter
    pub fn with_metrics(
        inner: B,
        config: ThrottleConfig,
        metrics: Option<Arc<Metrics>>,
        route: impl Into<String>,
    ) -> Self {
        let route = route.into();
        let chain = UploadThrottle::new(
            config,
            ByteCounter::new(metrics.clone(), route.clone(), Passthrough),
        );
        let mut body = Self::with_filter(inner, config, Box::new(chain));
        body.metrics = metrics;
        body.route = route;
        body
    }

    pub fn with_filter(
        inner: B,
        config: ThrottleConfig,
        filter: Box<dyn BodyFilter<BodyStream> + Send>,
    ) -> Self {
        Self {
            inner,
            stream: BodyStream::new(),
            filter,
            config,
            metrics: None,
            route: String::new(),
            done: false,
        }
    }

    /// Current value of the rate variable
    pub fn rate(&self) -> String {
        RateVariable::get(self.stream.context(), &self.config)
    }

    /// Override the upload rate for this body. See [`RateVariable::set`].
    pub fn set_rate(&mut self, value: &str) -> bool {
        RateVariable::set(self.stream.throttle_context(), value)
    }

    pub fn received(&self) -> u64 {
        self.stream.context().map_or(0, |ctx| ctx.received())
    }

    pub fn is_paused(&self) -> bool {
        self.stream.context().is_some_and(|ctx| ctx.is_paused())
    }

    pub fn stream(&self) -> &BodyStream {
        &self.stream
    }

    fn finish(&mut self) {
        self.done = true;
        self.stream.throttle_context().terminate();
    }

    fn fail(&mut self, error: ThrottleError) -> BodyError {
        warn!(route = %self.route, error = %error, "upload throttle failed, aborting request body");
        if let Some(m) = &self.metrics {
            m.record_throttle_failure(&self.route);
        }
        self.finish();
        BodyError::Throttle(error)
    }

    /// Drive the write slot while it holds the delay handler.
    fn poll_delay(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), ThrottleError>> {
        let fired = self
            .stream
            .timer_mut()
            .is_some_and(|timer| timer.poll(cx).is_ready());
        if fired {
            self.stream.expire_timer();
        }

        self.stream.park_reader(cx.waker());
        match resume::on_write_event(&mut self.stream)? {
            ResumeOutcome::Waiting => Poll::Pending,
            ResumeOutcome::Resumed => Poll::Ready(Ok(())),
            ResumeOutcome::Idle => {
                self.stream.reset_handlers();
                Poll::Ready(Ok(()))
            }
        }
    }
}

impl<B> Body for ThrottledBody<B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = BodyError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        loop {
            if this.done {
                return Poll::Ready(None);
            }

            if this.stream.handlers().write == BodyHandler::Delay {
                match this.poll_delay(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Ok(())) => continue,
                    Poll::Ready(Err(e)) => return Poll::Ready(Some(Err(this.fail(e)))),
                }
            }

            match this.stream.handlers().read {
                BodyHandler::Read => {}
                BodyHandler::TestReading => {
                    // paused without a delay handler: nothing can wake us but the timer
                    if !this.stream.has_timer() {
                        this.stream.reset_handlers();
                        continue;
                    }
                    this.stream.park_reader(cx.waker());
                    return Poll::Pending;
                }
                BodyHandler::Delay | BodyHandler::Idle => return Poll::Pending,
            }

            let frame = match Pin::new(&mut this.inner).poll_frame(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => {
                    debug!(received = this.received(), "request body complete");
                    this.finish();
                    return Poll::Ready(None);
                }
                Poll::Ready(Some(Err(e))) => {
                    this.finish();
                    return Poll::Ready(Some(Err(BodyError::Inner(e.into()))));
                }
                Poll::Ready(Some(Ok(frame))) => frame,
            };

            let Some(chunk) = frame.data_ref() else {
                return Poll::Ready(Some(Ok(frame)));
            };

            match this.filter.on_chunk(&mut this.stream, chunk) {
                Ok(ChunkOutcome::Continue) => {}
                Ok(ChunkOutcome::Defer(delay)) => {
                    // a stage may defer without pausing the stream itself
                    if !this.is_paused() {
                        if let Err(e) = suspend(&mut this.stream, delay) {
                            return Poll::Ready(Some(Err(this.fail(e))));
                        }
                    }
                    if let Some(m) = &this.metrics {
                        m.record_throttle_pause(&this.route, delay.as_secs_f64());
                    }
                }
                Err(e) => return Poll::Ready(Some(Err(this.fail(e)))),
            }

            return Poll::Ready(Some(Ok(frame)));
        }
    }

    fn is_end_stream(&self) -> bool {
        self.done || (!self.is_paused() && self.inner.is_end_stream())
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
