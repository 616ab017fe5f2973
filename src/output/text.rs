use super::{Formatter, StatusOutput};

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, output: &StatusOutput) -> String {
        let state = if output.running { "running" } else { "stopped" };
        let stats = &output.stats;
        if self.verbose {
            format!(
                "[{}] pos: {:>6} frames, offset: {} [chunks: {}, bytes: {}, checks: {}, losses: {}, no-marker: {}, odd-length: {}, periods: {}]",
                state,
                output.position_frames,
                output.sync_offset,
                stats.chunks,
                stats.bytes_written,
                stats.sync_checks,
                stats.sync_losses,
                stats.search_failures,
                stats.unexpected_lengths,
                stats.periods_notified
            )
        } else {
            format!(
                "[{}] pos: {:>6} frames, chunks: {}, sync losses: {}",
                state, output.position_frames, stats.chunks, stats.sync_losses
            )
        }
    }
}
