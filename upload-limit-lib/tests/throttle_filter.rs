mod helpers;

use bytes::Bytes;
use std::time::Duration;

use helpers::{FakeStream, CONSUMER_READ, CONSUMER_WRITE, DELAY, TEST_READING};
use upload_limit_lib::config::ThrottleConfig;
use upload_limit_lib::pipeline::{BodyFilter, ChunkOutcome, Passthrough};
use upload_limit_lib::throttle::{resume, HandlerPair, ResumeOutcome, UploadThrottle};
use upload_limit_lib::ThrottleError;

fn chunk(len: usize) -> Bytes {
    Bytes::from(vec![0u8; len])
}

fn throttle(rate: u64, after: u64) -> UploadThrottle<Passthrough> {
    UploadThrottle::new(ThrottleConfig::new(rate, after), Passthrough)
}

/// Downstream stage that always asks for a fixed pause
struct AlwaysDefer(Duration);

impl BodyFilter<FakeStream> for AlwaysDefer {
    fn on_chunk(
        &mut self,
        _stream: &mut FakeStream,
        _chunk: &Bytes,
    ) -> Result<ChunkOutcome, ThrottleError> {
        Ok(ChunkOutcome::Defer(self.0))
    }
}

#[test]
fn received_is_the_sum_of_chunks() -> Result<(), ThrottleError> {
    let mut stream = FakeStream::new();
    let mut filter = throttle(1_000_000, 0);

    let mut total = 0u64;
    for len in [10usize, 0, 4096, 1, 700] {
        filter.on_chunk(&mut stream, &chunk(len))?;
        total += len as u64;
        assert_eq!(stream.ctx.received(), total);
    }
    Ok(())
}

#[test]
fn zero_rate_never_pauses() -> Result<(), ThrottleError> {
    let mut stream = FakeStream::new();
    let mut filter = throttle(0, 0);

    for _ in 0..8 {
        assert_eq!(filter.on_chunk(&mut stream, &chunk(1 << 20))?, ChunkOutcome::Continue);
    }

    assert_eq!(stream.ctx.received(), 8 << 20);
    assert!(!stream.ctx.is_paused());
    assert_eq!(stream.handlers, HandlerPair::new(CONSUMER_READ, CONSUMER_WRITE));
    assert_eq!(stream.timer_arms, 0);
    assert_eq!(stream.read_watches, 0);
    Ok(())
}

#[test]
fn pause_starts_one_byte_past_the_allowance() -> Result<(), ThrottleError> {
    let mut stream = FakeStream::new();
    let mut filter = throttle(1000, 0);

    // elapsed counts the current second, so 1000 bytes at t=0 are on budget
    assert_eq!(filter.on_chunk(&mut stream, &chunk(1000))?, ChunkOutcome::Continue);
    assert!(!stream.ctx.is_paused());

    assert_eq!(
        filter.on_chunk(&mut stream, &chunk(1))?,
        ChunkOutcome::Defer(Duration::from_millis(1))
    );
    assert!(stream.ctx.is_paused());
    Ok(())
}

#[test]
fn free_allowance_is_not_throttled() -> Result<(), ThrottleError> {
    let mut stream = FakeStream::new();
    let mut filter = throttle(100, 10_000);

    assert_eq!(filter.on_chunk(&mut stream, &chunk(10_100))?, ChunkOutcome::Continue);
    assert_eq!(
        filter.on_chunk(&mut stream, &chunk(50))?,
        ChunkOutcome::Defer(Duration::from_millis(500))
    );
    Ok(())
}

#[test]
fn burst_is_paused_then_measured_against_new_elapsed_time() -> Result<(), ThrottleError> {
    let mut stream = FakeStream::new();
    let mut filter = throttle(1000, 0);

    let outcome = filter.on_chunk(&mut stream, &chunk(2500))?;
    assert_eq!(outcome, ChunkOutcome::Defer(Duration::from_millis(1500)));
    assert_eq!(stream.timer, Some(Duration::from_millis(1500)));
    assert_eq!(stream.handlers, HandlerPair::new(TEST_READING, DELAY));

    stream.now = 1;
    stream.fire_timer();
    assert_eq!(resume::on_write_event(&mut stream)?, ResumeOutcome::Resumed);
    assert_eq!(stream.handlers, HandlerPair::new(CONSUMER_READ, CONSUMER_WRITE));
    assert_eq!(stream.read_runs, 1);

    // 2600 received against 1000 * 2; the first 1500 ms pause is not counted again
    let outcome = filter.on_chunk(&mut stream, &chunk(100))?;
    assert_eq!(stream.ctx.received(), 2600);
    assert_eq!(outcome, ChunkOutcome::Defer(Duration::from_millis(600)));
    Ok(())
}

#[test]
fn pausing_saves_both_consumer_handlers() -> Result<(), ThrottleError> {
    let mut stream = FakeStream::new();
    let mut filter = throttle(10, 0);

    filter.on_chunk(&mut stream, &chunk(100))?;

    assert_eq!(
        stream.ctx.saved_handlers(),
        Some(&HandlerPair::new(CONSUMER_READ, CONSUMER_WRITE))
    );
    assert_eq!(stream.handlers, HandlerPair::new(TEST_READING, DELAY));
    assert_eq!(stream.read_watches, 1);
    Ok(())
}

#[test]
fn chunk_while_paused_rearms_timer_and_keeps_saved_pair() -> Result<(), ThrottleError> {
    let mut stream = FakeStream::new();
    let mut filter = throttle(1000, 0);

    filter.on_chunk(&mut stream, &chunk(2000))?;
    let outcome = filter.on_chunk(&mut stream, &chunk(500))?;

    assert_eq!(outcome, ChunkOutcome::Defer(Duration::from_millis(1500)));
    assert_eq!(stream.timer_arms, 2);
    assert_eq!(
        stream.ctx.saved_handlers(),
        Some(&HandlerPair::new(CONSUMER_READ, CONSUMER_WRITE))
    );
    Ok(())
}

#[test]
fn timer_failure_leaves_stream_flowing() {
    let mut stream = FakeStream::new();
    stream.fail_timer = true;
    let mut filter = throttle(1000, 0);

    let result = filter.on_chunk(&mut stream, &chunk(5000));

    assert!(matches!(result, Err(ThrottleError::ArmTimer(_))));
    assert!(!stream.ctx.is_paused());
    assert_eq!(stream.ctx.saved_handlers(), None);
    assert_eq!(stream.handlers, HandlerPair::new(CONSUMER_READ, CONSUMER_WRITE));
    assert_eq!(stream.ctx.received(), 5000);
}

#[test]
fn read_registration_failure_is_fatal() {
    let mut stream = FakeStream::new();
    stream.fail_read = true;
    let mut filter = throttle(1000, 0);

    let err = filter.on_chunk(&mut stream, &chunk(5000)).err();

    assert!(matches!(err, Some(ThrottleError::ReadEvent(_))));
    assert!(err.is_some_and(|e| e.is_fatal()));
    assert_eq!(stream.timer_arms, 0);
}

#[test]
fn own_delay_wins_over_shorter_downstream_pause() -> Result<(), ThrottleError> {
    let mut stream = FakeStream::new();
    let mut filter = UploadThrottle::new(
        ThrottleConfig::new(1000, 0),
        AlwaysDefer(Duration::from_millis(5)),
    );

    let outcome = filter.on_chunk(&mut stream, &chunk(2500))?;

    assert_eq!(outcome, ChunkOutcome::Defer(Duration::from_millis(1500)));
    assert_eq!(stream.ctx.received(), 2500);
    assert!(stream.ctx.is_paused());
    assert_eq!(stream.timer, Some(Duration::from_millis(1500)));
    assert_eq!(stream.handlers, HandlerPair::new(TEST_READING, DELAY));
    Ok(())
}

#[test]
fn longer_downstream_pause_is_returned_and_bytes_still_counted() -> Result<(), ThrottleError> {
    let mut stream = FakeStream::new();
    let mut filter = UploadThrottle::new(
        ThrottleConfig::new(1000, 0),
        AlwaysDefer(Duration::from_secs(2)),
    );

    let outcome = filter.on_chunk(&mut stream, &chunk(1500))?;

    assert_eq!(outcome, ChunkOutcome::Defer(Duration::from_secs(2)));
    assert_eq!(stream.ctx.received(), 1500);
    assert!(!stream.ctx.is_paused());
    assert_eq!(stream.timer_arms, 0);
    Ok(())
}

#[test]
fn downstream_pause_passes_through_when_unlimited() -> Result<(), ThrottleError> {
    let mut stream = FakeStream::new();
    let mut filter = UploadThrottle::new(
        ThrottleConfig::new(0, 0),
        AlwaysDefer(Duration::from_millis(5)),
    );

    let outcome = filter.on_chunk(&mut stream, &chunk(4096))?;

    assert_eq!(outcome, ChunkOutcome::Defer(Duration::from_millis(5)));
    assert_eq!(stream.ctx.received(), 4096);
    Ok(())
}

#[test]
fn terminated_stream_is_not_paused() -> Result<(), ThrottleError> {
    let mut stream = FakeStream::new();
    stream.ctx.terminate();
    let mut filter = throttle(1, 0);

    assert_eq!(filter.on_chunk(&mut stream, &chunk(10_000))?, ChunkOutcome::Continue);
    assert_eq!(stream.timer_arms, 0);
    Ok(())
}

#[test]
fn rate_is_fixed_on_first_chunk() -> Result<(), ThrottleError> {
    let mut stream = FakeStream::new();
    let mut filter = throttle(500, 0);

    filter.on_chunk(&mut stream, &chunk(1))?;
    assert_eq!(stream.ctx.effective_rate(), Some(500));

    let mut other = throttle(5, 0);
    other.on_chunk(&mut stream, &chunk(1))?;
    assert_eq!(stream.ctx.effective_rate(), Some(500));
    Ok(())
}

#[test]
fn clock_before_start_counts_as_first_second() -> Result<(), ThrottleError> {
    let mut stream = FakeStream::new();
    stream.start = 100;
    stream.now = 90;
    let mut filter = throttle(1000, 0);

    assert_eq!(filter.on_chunk(&mut stream, &chunk(1000))?, ChunkOutcome::Continue);
    Ok(())
}
