pub mod capture;
pub mod config;
pub mod constants;
pub mod error;
pub mod output;
pub mod ratelimit;
pub mod transport;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use capture::{CaptureChannel, IngestOutcome, PeriodNotifier, StreamHandle};
pub use config::CaptureConfig;
pub use error::{CaptureError, Result};
