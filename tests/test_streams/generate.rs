use capsync::config::{CaptureConfig, PcmHardware};

/// One device word with the marker in the low byte and a non-zero payload.
pub fn word(index: usize) -> [u8; 4] {
    let n = index as u32;
    [
        0x00,
        0x10 | (n & 0x0F) as u8,
        0x20 | ((n >> 4) & 0x0F) as u8,
        0x40 | ((n >> 8) & 0x0F) as u8,
    ]
}

/// `len` bytes of correctly framed words.
pub fn aligned_stream(len: usize) -> Vec<u8> {
    let mut stream: Vec<u8> = (0..len.div_ceil(4)).flat_map(word).collect();
    stream.truncate(len);
    stream
}

/// A framed stream with bytes removed at the given positions.
///
/// Each `(position, count)` drops `count` bytes starting at that byte
/// position of the framed stream.
pub fn slipped_stream(len: usize, slips: &[(usize, usize)]) -> Vec<u8> {
    let lost: usize = slips.iter().map(|&(_, n)| n).sum();
    let framed = aligned_stream(len + lost);
    framed
        .iter()
        .enumerate()
        .filter(|&(i, _)| !slips.iter().any(|&(at, n)| i >= at && i < at + n))
        .map(|(_, &b)| b)
        .collect()
}

pub fn chunked(stream: &[u8], chunk_len: usize) -> Vec<Vec<u8>> {
    stream.chunks(chunk_len).map(|c| c.to_vec()).collect()
}

/// 64 byte ring of two 32 byte periods fed 20 byte chunks.
pub fn small_layout(check_interval: u64) -> CaptureConfig {
    let config = CaptureConfig {
        expected_chunk_len: 20,
        sync_check_interval: check_interval,
        period_bytes: 32,
        ..Default::default()
    };
    let hw = PcmHardware {
        buffer_bytes_max: 64,
        period_bytes_min: 16,
        period_bytes_max: 64,
        ..PcmHardware::REFERENCE
    };
    config
        .validate_for(&hw)
        .expect("small layout should fit small hardware");
    config
}
