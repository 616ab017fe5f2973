mod json;
mod text;

use chrono::Utc;
use serde::Serialize;

use crate::capture::IngestStats;

pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One status report of a running capture stream
#[derive(Debug, Clone, Serialize)]
pub struct StatusOutput {
    pub running: bool,
    pub position_frames: usize,
    pub sync_offset: u8,
    #[serde(flatten)]
    pub stats: IngestStats,
}

pub trait Formatter: Send {
    fn format(&self, output: &StatusOutput) -> String;
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

pub fn iso8601_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
