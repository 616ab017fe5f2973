//! Configuration for the capture ingestion engine.
//!
//! Every value here is fixed when the stream is opened. A config file only
//! needs to name the fields it changes:
//!
//! ```toml
//! sync_check_interval = 16
//! expected_chunk_len = 1020
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::constants::{
    CHANNELS, EXPECTED_CHUNK_LEN, PERIOD_BYTES, PERIODS_PER_BUFFER, SAMPLE_RATE,
    SYNC_CHECK_INTERVAL, WORD_BYTES,
};
use crate::error::{CaptureError, Result};

/// Capabilities of the capture device
///
/// Mirrors what the device advertises to the audio subsystem: one sample
/// format, one rate, fixed stereo, and at most two periods of 32 packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmHardware {
    /// Bits per sample word (signed, little-endian)
    pub sample_bits: u16,
    pub rate_min: u32,
    pub rate_max: u32,
    pub channels_min: u16,
    pub channels_max: u16,
    pub buffer_bytes_max: usize,
    pub period_bytes_min: usize,
    pub period_bytes_max: usize,
    pub periods_min: usize,
    pub periods_max: usize,
}

impl PcmHardware {
    /// The reference capture device (S32_LE, 48 kHz, stereo).
    pub const REFERENCE: Self = Self {
        sample_bits: 32,
        rate_min: SAMPLE_RATE,
        rate_max: SAMPLE_RATE,
        channels_min: CHANNELS,
        channels_max: CHANNELS,
        buffer_bytes_max: PERIOD_BYTES * PERIODS_PER_BUFFER,
        period_bytes_min: PERIOD_BYTES,
        period_bytes_max: PERIOD_BYTES * PERIODS_PER_BUFFER,
        periods_min: 1,
        periods_max: PERIODS_PER_BUFFER,
    };
}

impl Default for PcmHardware {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Capture stream configuration
///
/// Use `CaptureConfig::default()` for the reference hardware.
///
/// # Example
/// ```
/// use capsync::config::CaptureConfig;
///
/// let config: CaptureConfig = "sync_check_interval = 8".parse().unwrap();
/// assert_eq!(config.sync_check_interval, 8);
/// assert_eq!(config.buffer_bytes(), 65280);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Payload bytes per transport delivery
    pub expected_chunk_len: usize,
    /// Validate alignment once every this many chunks
    pub sync_check_interval: u64,
    /// Consumer period in bytes
    pub period_bytes: usize,
    /// Ring buffer capacity as a multiple of the period
    pub periods_per_buffer: usize,
    /// Bytes per sample word
    pub word_bytes: usize,
    /// Interleaved channels
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Fallback poll interval of the period notifier in milliseconds
    pub notify_poll_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            expected_chunk_len: EXPECTED_CHUNK_LEN,
            sync_check_interval: SYNC_CHECK_INTERVAL,
            period_bytes: PERIOD_BYTES,
            periods_per_buffer: PERIODS_PER_BUFFER,
            word_bytes: WORD_BYTES,
            channels: CHANNELS,
            sample_rate: SAMPLE_RATE,
            notify_poll_ms: 10,
        }
    }
}

impl CaptureConfig {
    /// Parse a TOML document; missing fields keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| CaptureError::Config(e.to_string()))
    }

    /// Load a TOML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CaptureError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Total ring buffer size in bytes.
    pub fn buffer_bytes(&self) -> usize {
        self.period_bytes * self.periods_per_buffer
    }

    /// Bytes per interleaved frame.
    pub fn frame_bytes(&self) -> usize {
        self.word_bytes * self.channels as usize
    }

    /// Byte rate of the stream, used for pacing simulated transports.
    pub fn bytes_per_second(&self) -> usize {
        self.frame_bytes() * self.sample_rate as usize
    }

    /// Check the config against the reference hardware.
    pub fn validate(&self) -> Result<()> {
        self.validate_for(&PcmHardware::REFERENCE)
    }

    /// Check the config against a hardware description.
    ///
    /// Capacity violations (`buffer < period` or `period < chunk`) are caught
    /// here so that ingestion never has to check them per chunk.
    pub fn validate_for(&self, hw: &PcmHardware) -> Result<()> {
        let err = |msg: String| Err(CaptureError::Config(msg));

        if self.word_bytes != WORD_BYTES || self.word_bytes * 8 != hw.sample_bits as usize {
            return err(format!(
                "word size must be {} bytes, got {}",
                hw.sample_bits / 8,
                self.word_bytes
            ));
        }
        if !(hw.channels_min..=hw.channels_max).contains(&self.channels) {
            return err(format!("unsupported channel count: {}", self.channels));
        }
        if !(hw.rate_min..=hw.rate_max).contains(&self.sample_rate) {
            return err(format!("unsupported sample rate: {}", self.sample_rate));
        }
        if self.sync_check_interval == 0 {
            return err("sync check interval must be at least 1".to_string());
        }
        if self.expected_chunk_len == 0 {
            return err("expected chunk length must be positive".to_string());
        }
        if self.notify_poll_ms == 0 {
            return err("notifier poll interval must be positive".to_string());
        }
        if !(hw.periods_min..=hw.periods_max).contains(&self.periods_per_buffer) {
            return err(format!(
                "periods per buffer must be within {}..={}, got {}",
                hw.periods_min, hw.periods_max, self.periods_per_buffer
            ));
        }
        if !(hw.period_bytes_min..=hw.period_bytes_max).contains(&self.period_bytes) {
            return err(format!(
                "period of {} bytes outside {}..={}",
                self.period_bytes, hw.period_bytes_min, hw.period_bytes_max
            ));
        }
        if self.period_bytes % self.frame_bytes() != 0 {
            return err(format!(
                "period of {} bytes is not a whole number of {}-byte frames",
                self.period_bytes,
                self.frame_bytes()
            ));
        }
        if self.buffer_bytes() > hw.buffer_bytes_max {
            return err(format!(
                "buffer of {} bytes exceeds hardware maximum {}",
                self.buffer_bytes(),
                hw.buffer_bytes_max
            ));
        }
        if self.period_bytes < self.expected_chunk_len {
            return err(format!(
                "period of {} bytes is smaller than a {}-byte chunk",
                self.period_bytes, self.expected_chunk_len
            ));
        }
        Ok(())
    }
}

impl std::str::FromStr for CaptureConfig {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_toml_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_hardware() -> PcmHardware {
        PcmHardware {
            buffer_bytes_max: 64,
            period_bytes_min: 16,
            period_bytes_max: 64,
            ..PcmHardware::REFERENCE
        }
    }

    #[test]
    fn test_default_matches_reference_hardware() {
        let config = CaptureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buffer_bytes(), 65280);
        assert_eq!(config.frame_bytes(), crate::constants::FRAME_BYTES);
        assert_eq!(config.buffer_bytes() % config.period_bytes, 0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CaptureConfig::from_toml_str("sync_check_interval = 4\n").unwrap();
        assert_eq!(config.sync_check_interval, 4);
        assert_eq!(config.expected_chunk_len, 1020);
        assert_eq!(config.periods_per_buffer, 2);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(CaptureConfig::from_toml_str("chunk_size = 12\n").is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = CaptureConfig {
            sync_check_interval: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_period_smaller_than_chunk_rejected() {
        let config = CaptureConfig {
            expected_chunk_len: 40,
            period_bytes: 32,
            ..Default::default()
        };
        assert!(config.validate_for(&small_hardware()).is_err());
    }

    #[test]
    fn test_small_layout_on_small_hardware() {
        let config = CaptureConfig {
            expected_chunk_len: 20,
            period_bytes: 32,
            ..Default::default()
        };
        assert!(config.validate_for(&small_hardware()).is_ok());
        assert_eq!(config.buffer_bytes(), 64);
    }

    #[test]
    fn test_oversized_buffer_rejected() {
        let config = CaptureConfig {
            periods_per_buffer: 3,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_format_rejected() {
        let mono = CaptureConfig {
            channels: 1,
            ..Default::default()
        };
        assert!(mono.validate().is_err());

        let s16 = CaptureConfig {
            word_bytes: 2,
            ..Default::default()
        };
        assert!(s16.validate().is_err());

        let rate = CaptureConfig {
            sample_rate: 44_100,
            ..Default::default()
        };
        assert!(rate.validate().is_err());
    }
}
