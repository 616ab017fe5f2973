use std::collections::VecDeque;
use std::f32::consts::PI;

use rand::RngExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::constants::WORD_BYTES;
use crate::transport::{ChunkSource, pack_word};

/// Random byte slips injected into the synthetic stream
#[derive(Clone, Debug, serde::Deserialize)]
pub struct SlipConfig {
    pub seed: Option<u64>,
    /// Chance per chunk that 1 to 3 bytes go missing before it
    pub probability: f32,
}

impl Default for SlipConfig {
    fn default() -> Self {
        Self {
            seed: None,
            probability: 0.0,
        }
    }
}

/// Test transport that emits a stereo tone in device word format
///
/// Left and right carry the same tone a quarter cycle apart. Payload bytes
/// are kept non-zero so the only zero byte in each word is the marker.
pub struct SyntheticChunkSource {
    rng: ChaCha8Rng,
    chunk_len: usize,
    remaining: Option<u64>,
    pending: VecDeque<u8>,
    phase: f32,
    phase_step: f32,
    amplitude: f32,
    slip_probability: f32,
    slips: u64,
    slipped_bytes: u64,
}

impl SyntheticChunkSource {
    pub fn new(tone_hz: f32, sample_rate: u32, chunk_len: usize) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(0),
            chunk_len: chunk_len.max(1),
            remaining: None,
            pending: VecDeque::new(),
            phase: 0.0,
            phase_step: 2.0 * PI * tone_hz / sample_rate as f32,
            amplitude: 0.5,
            slip_probability: 0.0,
            slips: 0,
            slipped_bytes: 0,
        }
    }

    /// Stop after `chunks` deliveries.
    pub fn with_limit(mut self, chunks: u64) -> Self {
        self.remaining = Some(chunks);
        self
    }

    pub fn with_slips(mut self, slips: &SlipConfig) -> Self {
        self.rng = create_rng(slips.seed);
        self.slip_probability = slips.probability.clamp(0.0, 1.0);
        self
    }

    /// Number of slip events so far.
    pub fn slips(&self) -> u64 {
        self.slips
    }

    pub fn slipped_bytes(&self) -> u64 {
        self.slipped_bytes
    }

    fn push_frame(&mut self) {
        let left = (self.phase.sin() * self.amplitude * 8_388_607.0) as i32;
        let right = ((self.phase + PI / 2.0).sin() * self.amplitude * 8_388_607.0) as i32;
        self.phase = (self.phase + self.phase_step) % (2.0 * PI);

        for sample in [left, right] {
            let mut word = pack_word(sample, 24);
            for b in &mut word[1..] {
                if *b == 0 {
                    *b = 1;
                }
            }
            self.pending.extend(word);
        }
    }
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

impl ChunkSource for SyntheticChunkSource {
    fn next_chunk(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Ok(None);
            }
            *remaining -= 1;
        }

        while self.pending.len() < self.chunk_len + WORD_BYTES {
            self.push_frame();
        }

        if self.slip_probability > 0.0 && self.rng.random::<f32>() < self.slip_probability {
            let lost = 1 + (self.rng.random::<u32>() % 3) as usize;
            self.pending.drain(..lost);
            self.slips += 1;
            self.slipped_bytes += lost as u64;
            log::debug!("Injected {} byte slip", lost);
        }

        Ok(Some(self.pending.drain(..self.chunk_len).collect()))
    }
}
