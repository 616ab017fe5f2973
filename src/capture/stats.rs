use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Ingestion counters, written by the ingestion thread and read by anyone
#[derive(Debug, Default)]
pub(crate) struct IngestCounters {
    pub chunks: AtomicU64,
    pub bytes_written: AtomicU64,
    pub sync_checks: AtomicU64,
    pub sync_losses: AtomicU64,
    pub search_failures: AtomicU64,
    pub unexpected_lengths: AtomicU64,
    pub periods_notified: AtomicU64,
}

impl IngestCounters {
    #[inline]
    pub fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> IngestStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        IngestStats {
            chunks: load(&self.chunks),
            bytes_written: load(&self.bytes_written),
            sync_checks: load(&self.sync_checks),
            sync_losses: load(&self.sync_losses),
            search_failures: load(&self.search_failures),
            unexpected_lengths: load(&self.unexpected_lengths),
            periods_notified: load(&self.periods_notified),
        }
    }
}

/// Point-in-time copy of the ingestion counters
///
/// Counters accumulate across start/stop cycles for the lifetime of the
/// channel. Individual fields are read independently, so a snapshot taken
/// while ingestion runs is not guaranteed to be mutually consistent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Chunks accepted while running
    pub chunks: u64,
    /// Bytes copied into the ring
    pub bytes_written: u64,
    /// Alignment checks performed
    pub sync_checks: u64,
    /// Checks that found the stream misaligned
    pub sync_losses: u64,
    /// Misaligned chunks with no marker byte at all
    pub search_failures: u64,
    /// Chunks whose length differed from the configured one
    pub unexpected_lengths: u64,
    /// Consumer notifications delivered
    pub periods_notified: u64,
}
