use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, never, select, tick};

use super::control::StreamHandle;
use crate::error::{CaptureError, Result};

/// Non-blocking wakeup sent from the ingestion path to the notifier
///
/// Holds a single-slot channel. A wake that finds the slot full is dropped,
/// which is fine because the notifier checks a level, not a count.
#[derive(Debug, Clone)]
pub struct PeriodWaker {
    tx: Sender<()>,
}

impl PeriodWaker {
    #[inline]
    pub fn wake(&self) {
        match self.tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => {
                log::trace!("Period notifier has shut down");
            }
        }
    }
}

/// Background thread that tells the consumer data is ready
///
/// Wakes on every [`PeriodWaker::wake`] and on a fallback timer, then runs
/// the callback through [`StreamHandle::notify_if_elapsed`]. The callback
/// receives the current position in frames.
pub struct PeriodNotifier {
    shutdown_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl PeriodNotifier {
    pub fn spawn<F>(
        handle: StreamHandle,
        poll: Duration,
        on_period: F,
    ) -> Result<(Self, PeriodWaker)>
    where
        F: FnMut(usize) + Send + 'static,
    {
        let (wake_tx, wake_rx) = bounded(1);
        let (shutdown_tx, shutdown_rx) = bounded(0);

        let thread = thread::Builder::new()
            .name("capsync-notify".into())
            .spawn(move || run(handle, poll, wake_rx, shutdown_rx, on_period))
            .map_err(|e| CaptureError::Stream(format!("failed to spawn notifier: {}", e)))?;

        Ok((
            Self {
                shutdown_tx: Some(shutdown_tx),
                thread: Some(thread),
            },
            PeriodWaker { tx: wake_tx },
        ))
    }

    /// Stop the thread after one last level check.
    pub fn shutdown(mut self) {
        self.join();
    }

    fn join(&mut self) {
        drop(self.shutdown_tx.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Period notifier thread panicked");
            }
        }
    }
}

impl Drop for PeriodNotifier {
    fn drop(&mut self) {
        self.join();
    }
}

fn run<F>(
    handle: StreamHandle,
    poll: Duration,
    mut wake_rx: Receiver<()>,
    shutdown_rx: Receiver<()>,
    mut on_period: F,
) where
    F: FnMut(usize),
{
    let ticker = tick(poll);
    log::debug!("Period notifier running (poll {:?})", poll);

    loop {
        let keep_running = select! {
            recv(wake_rx) -> msg => {
                if msg.is_err() {
                    // Every waker is gone; fall back to the ticker alone
                    log::debug!("Period wakers dropped, polling only");
                    wake_rx = never();
                }
                true
            }
            recv(ticker) -> _ => true,
            recv(shutdown_rx) -> _ => false,
        };
        if !keep_running {
            break;
        }
        handle.notify_if_elapsed(|| on_period(handle.position_frames()));
    }

    handle.notify_if_elapsed(|| on_period(handle.position_frames()));
    log::debug!("Period notifier exiting");
}
