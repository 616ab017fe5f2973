use std::time::{Duration, Instant};

/// Burst-per-window limiter for log messages emitted from the ingestion path
///
/// Allows up to `burst` messages per `window`. Messages past the burst are
/// counted, and the count is handed back by [`LogRateLimiter::allow`] the
/// first time a new window opens so the caller can report it.
#[derive(Debug)]
pub struct LogRateLimiter {
    window: Duration,
    burst: u32,
    window_start: Option<Instant>,
    emitted: u32,
    suppressed: u64,
}

impl LogRateLimiter {
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5);
    pub const DEFAULT_BURST: u32 = 10;

    pub fn new(window: Duration, burst: u32) -> Self {
        Self {
            window,
            burst,
            window_start: None,
            emitted: 0,
            suppressed: 0,
        }
    }

    /// Returns `Some(suppressed)` when a message may be logged, where
    /// `suppressed` is the number dropped since the last allowed message.
    pub fn allow(&mut self) -> Option<u64> {
        self.allow_at(Instant::now())
    }

    fn allow_at(&mut self, now: Instant) -> Option<u64> {
        let expired = self
            .window_start
            .is_none_or(|start| now.duration_since(start) >= self.window);
        if expired {
            self.window_start = Some(now);
            self.emitted = 0;
        }

        if self.emitted < self.burst {
            self.emitted += 1;
            Some(std::mem::take(&mut self.suppressed))
        } else {
            self.suppressed += 1;
            None
        }
    }
}

impl Default for LogRateLimiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW, Self::DEFAULT_BURST)
    }
}

/// Log through a [`LogRateLimiter`], noting how many messages were dropped.
macro_rules! ratelimited {
    ($limiter:expr, $level:expr, $($arg:tt)+) => {
        if let Some(suppressed) = $limiter.allow() {
            if suppressed > 0 {
                log::log!($level, "{} messages suppressed", suppressed);
            }
            log::log!($level, $($arg)+);
        }
    };
}

pub(crate) use ratelimited;
