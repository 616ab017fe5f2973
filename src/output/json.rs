use serde::Serialize;

use super::{Formatter, StatusOutput, iso8601_timestamp};

pub struct JsonFormatter;

#[derive(Serialize)]
struct Record<'a> {
    ts: String,
    #[serde(flatten)]
    status: &'a StatusOutput,
}

impl Formatter for JsonFormatter {
    fn format(&self, output: &StatusOutput) -> String {
        let record = Record {
            ts: iso8601_timestamp(),
            status: output,
        };
        serde_json::to_string(&record).unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::IngestStats;

    #[test]
    fn test_json_fields_are_flat() {
        let output = StatusOutput {
            running: true,
            position_frames: 12,
            sync_offset: 3,
            stats: IngestStats {
                chunks: 5,
                sync_losses: 1,
                ..Default::default()
            },
        };

        let line = JsonFormatter.format(&output);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["position_frames"], 12);
        assert_eq!(value["sync_offset"], 3);
        assert_eq!(value["chunks"], 5);
        assert_eq!(value["sync_losses"], 1);
        assert!(value["ts"].is_string());
    }
}
