use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use hound::WavReader;

use crate::constants::WORD_BYTES;

/// Something that delivers transport chunks, one at a time
pub trait ChunkSource: Send {
    /// Next chunk, or `None` once the transport has nothing more to deliver.
    fn next_chunk(&mut self) -> anyhow::Result<Option<Vec<u8>>>;
}

impl ChunkSource for VecDeque<Vec<u8>> {
    fn next_chunk(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.pop_front())
    }
}

/// Pack a sample into the device word format: left-justified in 32 bits with
/// the low byte cleared, little-endian.
pub fn pack_word(sample: i32, bits: u16) -> [u8; WORD_BYTES] {
    let word = if bits >= 32 {
        sample
    } else {
        sample << (32 - bits as u32)
    };
    (word & !0xFF).to_le_bytes()
}

/// Replays a stereo WAV file as the capture device would deliver it
pub struct WavChunkSource {
    stream: Vec<u8>,
    position: usize,
    chunk_len: usize,
    sample_rate: u32,
}

impl WavChunkSource {
    pub fn new<P: AsRef<Path>>(path: P, chunk_len: usize) -> anyhow::Result<Self> {
        if chunk_len == 0 {
            anyhow::bail!("chunk length must be positive");
        }

        let reader = WavReader::open(path.as_ref())?;
        let spec = reader.spec();

        if spec.channels != 2 {
            anyhow::bail!("Expected stereo WAV file, got {} channels", spec.channels);
        }

        let sample_rate = spec.sample_rate;
        let stream = Self::read_words(reader, &spec)?;
        log::info!(
            "Loaded {} frames at {} Hz from {}",
            stream.len() / (2 * WORD_BYTES),
            sample_rate,
            path.as_ref().display()
        );

        Ok(Self {
            stream,
            position: 0,
            chunk_len,
            sample_rate,
        })
    }

    /// Drop the first `bytes` of the stream, as a device that starts
    /// transmitting mid-word would.
    pub fn with_skew(mut self, bytes: usize) -> Self {
        self.position = bytes.min(self.stream.len());
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_words(
        mut reader: WavReader<BufReader<File>>,
        spec: &hound::WavSpec,
    ) -> anyhow::Result<Vec<u8>> {
        let mut stream = Vec::with_capacity(reader.len() as usize * WORD_BYTES);
        match spec.sample_format {
            hound::SampleFormat::Float => {
                for sample in reader.samples::<f32>() {
                    let scaled = (sample?.clamp(-1.0, 1.0) * 8_388_607.0) as i32;
                    stream.extend_from_slice(&pack_word(scaled, 24));
                }
            }
            hound::SampleFormat::Int => {
                let bits = spec.bits_per_sample;
                for sample in reader.samples::<i32>() {
                    stream.extend_from_slice(&pack_word(sample?, bits));
                }
            }
        }
        Ok(stream)
    }
}

impl ChunkSource for WavChunkSource {
    fn next_chunk(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        if self.position >= self.stream.len() {
            return Ok(None);
        }

        let end = (self.position + self.chunk_len).min(self.stream.len());
        let chunk = self.stream[self.position..end].to_vec();
        self.position = end;

        Ok(Some(chunk))
    }
}
