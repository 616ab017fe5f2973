use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::stats::{IngestCounters, IngestStats};

/// State shared between the control side and the ingestion thread
///
/// Only the running flag is written under a lock. The ingestion thread reads
/// its atomic mirror without locking, so a chunk that races with `stop` may
/// or may not be processed.
#[derive(Debug)]
pub(crate) struct StreamControl {
    lock: Mutex<()>,
    running: AtomicBool,
    start_generation: AtomicU64,
    published_cursor: AtomicUsize,
    published_offset: AtomicU8,
    period_elapsed: AtomicBool,
    frame_bytes: usize,
    pub counters: IngestCounters,
}

impl StreamControl {
    pub fn new(frame_bytes: usize) -> Self {
        Self {
            lock: Mutex::new(()),
            running: AtomicBool::new(false),
            start_generation: AtomicU64::new(0),
            published_cursor: AtomicUsize::new(0),
            published_offset: AtomicU8::new(0),
            period_elapsed: AtomicBool::new(false),
            frame_bytes,
            counters: IngestCounters::default(),
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    #[inline]
    pub fn start_generation(&self) -> u64 {
        self.start_generation.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        let _guard = self.lock.lock();
        if running {
            self.start_generation.fetch_add(1, Ordering::AcqRel);
            self.published_cursor.store(0, Ordering::Relaxed);
            self.period_elapsed.store(false, Ordering::Relaxed);
        }
        self.running.store(running, Ordering::Release);
    }

    #[inline]
    pub fn publish_cursor(&self, cursor: usize) {
        self.published_cursor.store(cursor, Ordering::Relaxed);
    }

    pub fn publish_offset(&self, offset: u8) {
        self.published_offset.store(offset, Ordering::Relaxed);
    }

    pub fn sync_offset(&self) -> u8 {
        self.published_offset.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn raise_period(&self) {
        self.period_elapsed.store(true, Ordering::Release);
    }

    pub fn period_elapsed(&self) -> bool {
        self.period_elapsed.load(Ordering::Acquire)
    }

    pub fn position_frames(&self) -> usize {
        self.published_cursor.load(Ordering::Relaxed) / self.frame_bytes
    }

    pub fn take_period(&self) -> bool {
        self.period_elapsed.swap(false, Ordering::AcqRel)
    }
}

/// Control surface for an open capture stream
///
/// Cheap to clone and safe to use from any thread. None of its methods block
/// on the ingestion path.
#[derive(Debug, Clone)]
pub struct StreamHandle {
    pub(crate) control: Arc<StreamControl>,
}

impl StreamHandle {
    /// Begin accepting chunks. Ingestion resets its chunk count, write cursor
    /// and period flag on the first chunk after this call.
    pub fn start(&self) {
        self.control.set_running(true);
        log::info!("Capture stream started");
    }

    /// Stop accepting chunks from the next delivery on.
    pub fn stop(&self) {
        self.control.set_running(false);
        log::info!("Capture stream stopped");
    }

    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    /// Current write position in frames.
    ///
    /// A best-effort snapshot of the ingestion cursor: it may trail the ring
    /// by one chunk while ingestion is mid-write.
    pub fn position_frames(&self) -> usize {
        self.control.position_frames()
    }

    /// Marker offset from the most recent resync.
    pub fn sync_offset(&self) -> u8 {
        self.control.sync_offset()
    }

    /// Whether data has been written since the last notification.
    pub fn period_elapsed(&self) -> bool {
        self.control.period_elapsed()
    }

    /// Invoke `on_period` if data arrived since the last call, clearing the
    /// flag. Returns whether the callback ran.
    ///
    /// Level-triggered: calling it again without new data does nothing.
    pub fn notify_if_elapsed<F: FnOnce()>(&self, on_period: F) -> bool {
        if !self.control.take_period() {
            return false;
        }
        on_period();
        IngestCounters::bump(&self.control.counters.periods_notified, 1);
        true
    }

    pub fn stats(&self) -> IngestStats {
        self.control.counters.snapshot()
    }
}
