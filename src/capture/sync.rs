use super::ring::RingBufferWriter;
use crate::constants::{SYNC_MARKER, SYNC_WARMUP_BYTES, WORD_BYTES};

/// Result of the per-chunk alignment step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Not a check chunk, or the ring has not warmed up yet
    Unchecked,
    /// The byte at the current offset is the marker
    Confirmed,
    /// Alignment was lost and the marker was found again
    Resynced {
        /// New offset of the marker within a word
        offset: u8,
        /// Position of the first marker byte in the chunk
        marker_index: usize,
    },
    /// Alignment was lost and the chunk contains no marker byte
    SearchFailed,
}

impl SyncOutcome {
    /// Whether the chunk should be copied into the ring.
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::SearchFailed)
    }

    /// First byte of the chunk that belongs in the ring.
    pub fn copy_start(&self) -> usize {
        match *self {
            Self::Resynced { marker_index, .. } => marker_index,
            _ => 0,
        }
    }
}

/// Tracks word alignment of the incoming byte stream
///
/// Every sample word ends in a zero byte. Once every `interval` chunks the
/// synchronizer looks at the byte where it expects that zero. If it isn't
/// there, the chunk is scanned for the first zero byte and the offset is
/// recomputed from its position.
#[derive(Debug, Clone)]
pub struct StreamSynchronizer {
    interval: u64,
    chunk_count: u64,
    offset: u8,
}

impl StreamSynchronizer {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            chunk_count: 0,
            offset: 0,
        }
    }

    /// Count a chunk and, if a check is due, validate or restore alignment.
    ///
    /// A resync moves the ring's write cursor back to the start, since the
    /// data already written no longer lines up with the new offset.
    pub fn check_and_resync(
        &mut self,
        chunk: &[u8],
        ring: &mut RingBufferWriter,
    ) -> SyncOutcome {
        self.chunk_count = self.chunk_count.wrapping_add(1);

        if self.chunk_count % self.interval != 0 || ring.write_cursor() <= SYNC_WARMUP_BYTES {
            return SyncOutcome::Unchecked;
        }

        if chunk.get(self.offset as usize) == Some(&SYNC_MARKER) {
            return SyncOutcome::Confirmed;
        }

        match chunk.iter().position(|&b| b == SYNC_MARKER) {
            Some(marker_index) => {
                self.offset = (marker_index % WORD_BYTES) as u8;
                ring.reset();
                SyncOutcome::Resynced {
                    offset: self.offset,
                    marker_index,
                }
            }
            None => SyncOutcome::SearchFailed,
        }
    }

    /// Current marker offset within a word, always below 4.
    pub fn offset(&self) -> u8 {
        self.offset
    }

    /// Chunks counted since the last reset.
    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }

    /// Restart the check cadence. The offset is a property of the stream and
    /// survives.
    pub fn reset(&mut self) {
        self.chunk_count = 0;
    }
}
