use std::sync::Arc;

use super::control::{StreamControl, StreamHandle};
use super::notify::PeriodWaker;
use super::ring::RingBufferWriter;
use super::stats::{IngestCounters, IngestStats};
use super::sync::{StreamSynchronizer, SyncOutcome};
use crate::config::CaptureConfig;
use crate::error::Result;
use crate::ratelimit::{LogRateLimiter, ratelimited};

/// What happened to one delivered chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The stream is not running; nothing was touched
    Discarded,
    /// Alignment was lost and no marker was found; the chunk was dropped
    Dropped,
    /// Bytes were copied into the ring
    Written { bytes: usize, sync: SyncOutcome },
}

/// Observable channel state, for diagnostics and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelState {
    pub running: bool,
    pub chunk_count: u64,
    pub sync_offset: u8,
    pub write_cursor: usize,
    pub period_elapsed: bool,
}

/// One open capture stream
///
/// Owned by the thread that receives transport chunks. Everything except
/// the running flag is touched only through `&mut self` on that thread; the
/// control side goes through the [`StreamHandle`] returned by
/// [`CaptureChannel::open`].
pub struct CaptureChannel {
    config: CaptureConfig,
    control: Arc<StreamControl>,
    sync: StreamSynchronizer,
    ring: RingBufferWriter,
    seen_generation: u64,
    waker: Option<PeriodWaker>,
    length_log: LogRateLimiter,
    sync_log: LogRateLimiter,
}

impl CaptureChannel {
    /// Validate `config` and allocate the ring.
    pub fn open(config: &CaptureConfig) -> Result<(Self, StreamHandle)> {
        config.validate()?;
        Ok(Self::open_unchecked(config))
    }

    /// Open without checking the config against the reference hardware.
    ///
    /// For alternative layouts whose caller has already validated them with
    /// [`CaptureConfig::validate_for`].
    pub fn open_unchecked(config: &CaptureConfig) -> (Self, StreamHandle) {
        log::info!(
            "Allocating {} byte capture buffer ({} x {} byte periods)",
            config.buffer_bytes(),
            config.periods_per_buffer,
            config.period_bytes
        );

        let control = Arc::new(StreamControl::new(config.frame_bytes()));
        let channel = Self {
            config: config.clone(),
            control: Arc::clone(&control),
            sync: StreamSynchronizer::new(config.sync_check_interval),
            ring: RingBufferWriter::new(config.buffer_bytes()),
            seen_generation: 0,
            waker: None,
            length_log: LogRateLimiter::default(),
            sync_log: LogRateLimiter::default(),
        };
        (channel, StreamHandle { control })
    }

    /// Another handle to this stream's controls.
    pub fn handle(&self) -> StreamHandle {
        StreamHandle {
            control: Arc::clone(&self.control),
        }
    }

    /// Wake the given notifier after every write.
    pub fn attach_waker(&mut self, waker: PeriodWaker) {
        self.waker = Some(waker);
    }

    /// Transport delivery entry point: validate alignment and copy the
    /// chunk into the ring.
    ///
    /// Never blocks. Chunks that arrive while the stream is stopped leave
    /// every field untouched.
    pub fn ingest(&mut self, chunk: &[u8]) -> IngestOutcome {
        if !self.control.is_running() {
            return IngestOutcome::Discarded;
        }

        let generation = self.control.start_generation();
        if generation != self.seen_generation {
            self.seen_generation = generation;
            self.restart();
        }

        let counters = &self.control.counters;
        IngestCounters::bump(&counters.chunks, 1);

        if chunk.len() != self.config.expected_chunk_len {
            IngestCounters::bump(&counters.unexpected_lengths, 1);
            ratelimited!(
                self.length_log,
                log::Level::Info,
                "Unexpected chunk length: {} (expected {})",
                chunk.len(),
                self.config.expected_chunk_len
            );
        }

        let sync = self.sync.check_and_resync(chunk, &mut self.ring);
        match sync {
            SyncOutcome::Unchecked => {}
            SyncOutcome::Confirmed => IngestCounters::bump(&counters.sync_checks, 1),
            SyncOutcome::Resynced { offset, marker_index } => {
                IngestCounters::bump(&counters.sync_checks, 1);
                IngestCounters::bump(&counters.sync_losses, 1);
                self.control.publish_offset(offset);
                ratelimited!(
                    self.sync_log,
                    log::Level::Warn,
                    "Lost sync, marker found at byte {} (offset {})",
                    marker_index,
                    offset
                );
            }
            SyncOutcome::SearchFailed => {
                IngestCounters::bump(&counters.sync_checks, 1);
                IngestCounters::bump(&counters.sync_losses, 1);
                IngestCounters::bump(&counters.search_failures, 1);
                ratelimited!(
                    self.sync_log,
                    log::Level::Warn,
                    "Lost sync, no marker in {} byte chunk",
                    chunk.len()
                );
            }
        }
        if !sync.is_usable() {
            return IngestOutcome::Dropped;
        }

        let bytes = self.ring.write(&chunk[sync.copy_start()..]);
        IngestCounters::bump(&counters.bytes_written, bytes as u64);

        self.control.publish_cursor(self.ring.write_cursor());
        self.control.raise_period();
        if let Some(waker) = &self.waker {
            waker.wake();
        }

        IngestOutcome::Written { bytes, sync }
    }

    fn restart(&mut self) {
        log::debug!("Resetting ingestion state for new stream start");
        self.sync.reset();
        self.ring.reset();
        self.control.publish_cursor(0);
    }

    /// A start was triggered that ingestion has not applied yet.
    fn restart_pending(&self) -> bool {
        self.control.start_generation() != self.seen_generation
    }

    /// Current state as seen by the control side. A pending start already
    /// reads as reset.
    pub fn state(&self) -> ChannelState {
        let pending = self.restart_pending();
        ChannelState {
            running: self.control.is_running(),
            chunk_count: if pending { 0 } else { self.sync.chunk_count() },
            sync_offset: self.sync.offset(),
            write_cursor: if pending { 0 } else { self.ring.write_cursor() },
            period_elapsed: self.control.period_elapsed(),
        }
    }

    /// Position of the write cursor in frames.
    pub fn position_frames(&self) -> usize {
        self.state().write_cursor / self.config.frame_bytes()
    }

    pub fn ring(&self) -> &RingBufferWriter {
        &self.ring
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Stop the stream and release the ring, returning the final counters.
    pub fn close(self) -> IngestStats {
        self.control.set_running(false);
        let stats = self.control.counters.snapshot();
        log::info!(
            "Capture stream closed after {} chunks ({} sync losses)",
            stats.chunks,
            stats.sync_losses
        );
        stats
    }
}
