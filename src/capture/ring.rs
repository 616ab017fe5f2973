/// Fixed-capacity byte ring written by the ingestion path
///
/// The ring never grows. A write that would run off the end is split: the
/// first part fills the tail and the remainder continues at the head. The
/// write cursor always stays below the capacity.
#[derive(Debug)]
pub struct RingBufferWriter {
    buffer: Box<[u8]>,
    write_cursor: usize,
}

impl RingBufferWriter {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be positive");
        Self {
            buffer: vec![0u8; capacity].into_boxed_slice(),
            write_cursor: 0,
        }
    }

    /// Copy `chunk` into the ring at the write cursor.
    ///
    /// A chunk longer than the whole ring keeps only its last `capacity`
    /// bytes, in the positions they would have landed in. Returns the number
    /// of bytes stored.
    pub fn write(&mut self, chunk: &[u8]) -> usize {
        let capacity = self.buffer.len();
        let len = chunk.len();
        if len == 0 {
            return 0;
        }

        let (start, data) = if len > capacity {
            let skipped = len - capacity;
            ((self.write_cursor + skipped) % capacity, &chunk[skipped..])
        } else {
            (self.write_cursor, chunk)
        };

        if start + data.len() < capacity {
            self.buffer[start..start + data.len()].copy_from_slice(data);
            self.write_cursor = start + data.len();
        } else {
            let first = capacity - start;
            self.buffer[start..].copy_from_slice(&data[..first]);
            let rest = data.len() - first;
            self.buffer[..rest].copy_from_slice(&data[first..]);
            self.write_cursor = rest;
        }

        data.len()
    }

    /// Next byte position that will be written.
    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Raw ring contents in storage order.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Read `len` bytes in logical order starting at `start`, following the
    /// wrap back to the head.
    pub fn read_from(&self, start: usize, len: usize) -> Vec<u8> {
        let capacity = self.buffer.len();
        let len = len.min(capacity);
        let start = start % capacity;

        let mut out = Vec::with_capacity(len);
        let first = len.min(capacity - start);
        out.extend_from_slice(&self.buffer[start..start + first]);
        out.extend_from_slice(&self.buffer[..len - first]);
        out
    }

    /// Move the cursor back to the head. Contents are left in place.
    pub fn reset(&mut self) {
        self.write_cursor = 0;
    }
}
