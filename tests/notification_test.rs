mod test_streams;

use std::thread;
use std::time::Duration;

use capsync::capture::{CaptureChannel, IngestOutcome, PeriodNotifier};
use capsync::config::CaptureConfig;
use test_streams::{aligned_stream, chunked, small_layout};

#[test]
fn test_notification_is_idempotent() {
    let (mut channel, handle) = CaptureChannel::open_unchecked(&small_layout(1000));
    handle.start();
    channel.ingest(&aligned_stream(20));

    let mut calls = 0;
    assert!(handle.notify_if_elapsed(|| calls += 1));
    assert!(!handle.notify_if_elapsed(|| calls += 1));
    assert!(!handle.notify_if_elapsed(|| calls += 1));
    assert_eq!(calls, 1);

    channel.ingest(&aligned_stream(20));
    assert!(handle.notify_if_elapsed(|| calls += 1));
    assert_eq!(calls, 2);
    assert_eq!(handle.stats().periods_notified, 2);
}

#[test]
fn test_notifier_thread_reports_position() {
    let (mut channel, handle) = CaptureChannel::open(&CaptureConfig::default()).unwrap();
    let (tx, rx) = crossbeam_channel::unbounded();

    let (notifier, waker) = PeriodNotifier::spawn(
        handle.clone(),
        Duration::from_millis(5),
        move |position| {
            let _ = tx.send(position);
        },
    )
    .unwrap();
    channel.attach_waker(waker);
    handle.start();

    for chunk in chunked(&aligned_stream(1020 * 4), 1020) {
        channel.ingest(&chunk);
    }

    let position = rx
        .recv_timeout(Duration::from_secs(2))
        .expect("notifier should report a period");
    assert!(position <= 4 * 1020 / 8);

    // Drain anything queued, then confirm nothing more arrives without data
    thread::sleep(Duration::from_millis(30));
    while rx.try_recv().is_ok() {}
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

    notifier.shutdown();
    assert!(!handle.period_elapsed());
}

#[test]
fn test_stop_from_control_thread() {
    let (mut channel, handle) = CaptureChannel::open_unchecked(&small_layout(1000));
    handle.start();
    assert!(matches!(
        channel.ingest(&aligned_stream(20)),
        IngestOutcome::Written { .. }
    ));

    let control = handle.clone();
    thread::spawn(move || control.stop()).join().unwrap();

    assert!(!handle.is_running());
    assert_eq!(channel.ingest(&aligned_stream(20)), IngestOutcome::Discarded);
    assert_eq!(channel.state().write_cursor, 20);
}

#[test]
fn test_restart_performs_full_reset() {
    let (mut channel, handle) = CaptureChannel::open_unchecked(&small_layout(1000));
    handle.start();
    for chunk in chunked(&aligned_stream(60), 20) {
        channel.ingest(&chunk);
    }
    assert_eq!(handle.position_frames(), 7);

    handle.stop();
    handle.start();
    assert_eq!(handle.position_frames(), 0);
    assert!(!handle.period_elapsed());

    channel.ingest(&aligned_stream(20));
    let state = channel.state();
    assert_eq!(state.chunk_count, 1);
    assert_eq!(state.write_cursor, 20);
    assert!(state.period_elapsed);
}

#[test]
fn test_position_query_tracks_frames() {
    let (mut channel, handle) = CaptureChannel::open_unchecked(&small_layout(1000));
    handle.start();

    let mut expected_cursor = 0;
    for chunk in chunked(&aligned_stream(20 * 10), 20) {
        channel.ingest(&chunk);
        expected_cursor = (expected_cursor + 20) % 64;
        assert_eq!(handle.position_frames(), expected_cursor / 8);
        assert_eq!(channel.position_frames(), expected_cursor / 8);
    }
}
