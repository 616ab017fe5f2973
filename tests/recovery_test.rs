mod test_streams;

use std::collections::VecDeque;

use capsync::capture::{CaptureChannel, IngestOutcome, SyncOutcome};
use capsync::config::CaptureConfig;
use capsync::simulation::{SlipConfig, SyntheticChunkSource};
use capsync::transport::{ChunkSource, DriverOptions, TransportDriver, WavChunkSource};
use test_streams::{aligned_stream, chunked};

fn expected_offset(slipped_bytes: u64) -> u8 {
    ((4 - slipped_bytes % 4) % 4) as u8
}

#[test]
fn test_resync_tracks_injected_slips() {
    let config = CaptureConfig {
        sync_check_interval: 4,
        ..Default::default()
    };
    let (mut channel, handle) = CaptureChannel::open(&config).unwrap();
    handle.start();

    let mut source = SyntheticChunkSource::new(1000.0, 48000, 1020)
        .with_limit(600)
        .with_slips(&SlipConfig {
            seed: Some(42),
            probability: 0.02,
        });

    let mut resyncs = 0;
    while let Some(chunk) = source.next_chunk().unwrap() {
        let outcome = channel.ingest(&chunk);
        if let IngestOutcome::Written {
            sync: SyncOutcome::Resynced { offset, .. },
            ..
        } = outcome
        {
            resyncs += 1;
            assert_eq!(offset, expected_offset(source.slipped_bytes()));
        }
        if let IngestOutcome::Written {
            sync: SyncOutcome::Confirmed,
            ..
        } = outcome
        {
            assert_eq!(
                channel.state().sync_offset,
                expected_offset(source.slipped_bytes())
            );
        }
        assert!(channel.state().write_cursor < config.buffer_bytes());
    }

    let stats = handle.stats();
    assert!(source.slips() > 0);
    assert!(resyncs > 0);
    assert_eq!(stats.sync_losses, resyncs);
    assert_eq!(stats.search_failures, 0);
}

#[test]
fn test_slip_that_preserves_alignment_is_invisible() {
    // Losing a whole word keeps every marker where it was
    let mut stream = aligned_stream(1020 * 40);
    stream.drain(2040..2044);
    let chunks: VecDeque<Vec<u8>> = chunked(&stream, 1020).into();

    let config = CaptureConfig {
        sync_check_interval: 1,
        ..Default::default()
    };
    let (channel, handle) = CaptureChannel::open(&config).unwrap();
    handle.start();

    let driver =
        TransportDriver::spawn(Box::new(chunks), channel, DriverOptions::default()).unwrap();
    let channel = driver.join().unwrap();

    assert_eq!(handle.stats().sync_losses, 0);
    assert_eq!(channel.state().sync_offset, 0);
    assert!(handle.is_running());
}

#[test]
fn test_skewed_wav_resyncs_after_warmup() {
    let path = std::env::temp_dir().join(format!("capsync_skew_{}.wav", std::process::id()));
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 48000,
        bits_per_sample: 24,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..48_000i32 {
        // Keep all three payload bytes non-zero
        writer.write_sample(0x010101 + (i % 0x7F) * 0x010101).unwrap();
    }
    writer.finalize().unwrap();

    let source = WavChunkSource::new(&path, 1020).unwrap().with_skew(1);
    let config = CaptureConfig {
        sync_check_interval: 2,
        ..Default::default()
    };
    let (channel, handle) = CaptureChannel::open(&config).unwrap();
    handle.start();

    let driver = TransportDriver::spawn(
        Box::new(source),
        channel,
        DriverOptions {
            stop_at_end: true,
            ..Default::default()
        },
    )
    .unwrap();
    let channel = driver.join().unwrap();
    std::fs::remove_file(&path).ok();

    let stats = handle.stats();
    assert_eq!(stats.sync_losses, 1);
    assert_eq!(channel.state().sync_offset, 3);
    assert_eq!(handle.sync_offset(), 3);
    assert!(!handle.is_running());

    let final_stats = channel.close();
    assert_eq!(final_stats.chunks, stats.chunks);
}
