use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use audio_thread_priority::RtPriorityHandle;

use super::ChunkSource;
use crate::capture::CaptureChannel;
use crate::error::{CaptureError, Result};

/// How the transport thread feeds its channel
#[derive(Debug, Clone, Copy, Default)]
pub struct DriverOptions {
    /// Deliver chunks at the stream's real byte rate instead of as fast as
    /// the source produces them
    pub paced: bool,
    /// Try to run the delivery thread at real-time priority
    pub realtime_priority: bool,
    /// Stop the stream once the source is exhausted
    pub stop_at_end: bool,
}

/// Thread that plays the role of the isochronous transport: pulls chunks
/// from a source and hands each one to the channel's ingestion path.
pub struct TransportDriver {
    cancel: Arc<AtomicBool>,
    thread: JoinHandle<anyhow::Result<CaptureChannel>>,
}

impl TransportDriver {
    pub fn spawn(
        mut source: Box<dyn ChunkSource>,
        mut channel: CaptureChannel,
        options: DriverOptions,
    ) -> Result<Self> {
        let cancel = Arc::new(AtomicBool::new(false));
        let thread_cancel = Arc::clone(&cancel);

        let thread = thread::Builder::new()
            .name("capsync-transport".into())
            .spawn(move || {
                deliver(&mut *source, &mut channel, options, &thread_cancel)?;
                Ok(channel)
            })
            .map_err(|e| CaptureError::Transport(format!("failed to spawn transport: {}", e)))?;

        Ok(Self { cancel, thread })
    }

    /// Ask the thread to stop after the chunk it is delivering.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the source to run dry (or the driver to be cancelled) and
    /// take the channel back.
    pub fn join(self) -> anyhow::Result<CaptureChannel> {
        self.thread
            .join()
            .map_err(|_| anyhow::anyhow!("transport thread panicked"))?
    }
}

fn deliver(
    source: &mut dyn ChunkSource,
    channel: &mut CaptureChannel,
    options: DriverOptions,
    cancel: &AtomicBool,
) -> anyhow::Result<()> {
    let config = channel.config().clone();
    let _rt_handle = if options.realtime_priority {
        promote(config.expected_chunk_len / config.frame_bytes(), config.sample_rate)
    } else {
        None
    };

    let byte_rate = config.bytes_per_second() as f64;
    let started = Instant::now();
    let mut delivered: u64 = 0;
    let mut chunks: u64 = 0;

    while !cancel.load(Ordering::Relaxed) {
        let Some(chunk) = source.next_chunk()? else {
            break;
        };

        channel.ingest(&chunk);
        chunks += 1;
        delivered += chunk.len() as u64;

        if options.paced {
            let due = started + Duration::from_secs_f64(delivered as f64 / byte_rate);
            let now = Instant::now();
            if due > now {
                thread::sleep(due - now);
            }
        }
    }

    log::info!("Transport delivered {} chunks ({} bytes)", chunks, delivered);

    if options.stop_at_end {
        channel.handle().stop();
    }
    Ok(())
}

fn promote(frames_per_chunk: usize, sample_rate: u32) -> Option<RtPriorityHandle> {
    match audio_thread_priority::promote_current_thread_to_real_time(
        frames_per_chunk as u32,
        sample_rate,
    ) {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("Could not set real-time priority: {}", e);
            None
        }
    }
}
