//! Fixed properties of the capture hardware stream
//!
//! The device delivers signed 32-bit little-endian samples whose least
//! significant byte is always zero. That zero byte is the only framing
//! information in the stream.

/// Value of the least significant byte of every sample word.
pub const SYNC_MARKER: u8 = 0x00;

/// Bytes per sample word.
pub const WORD_BYTES: usize = 4;

/// Interleaved channels per frame.
pub const CHANNELS: u16 = 2;

/// Bytes per stereo frame.
pub const FRAME_BYTES: usize = WORD_BYTES * CHANNELS as usize;

/// Payload size of one isochronous packet from the reference hardware.
pub const EXPECTED_CHUNK_LEN: usize = 1020;

/// Packets per consumer period.
pub const PACKETS_PER_PERIOD: usize = 32;

/// Consumer period in bytes (1020 bytes * 32 packets).
pub const PERIOD_BYTES: usize = EXPECTED_CHUNK_LEN * PACKETS_PER_PERIOD;

/// Periods held by the ring buffer.
pub const PERIODS_PER_BUFFER: usize = 2;

/// Alignment is validated once every this many chunks.
pub const SYNC_CHECK_INTERVAL: u64 = 32;

/// The write cursor must be past this many bytes before alignment is checked.
pub const SYNC_WARMUP_BYTES: usize = 4;

/// Sample rate the hardware runs at.
pub const SAMPLE_RATE: u32 = 48_000;
