use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;

use capsync::capture::{CaptureChannel, PeriodNotifier, StreamHandle};
use capsync::config::CaptureConfig;
use capsync::output::{Formatter, OutputFormat, StatusOutput, create_formatter};
use capsync::transport::{ChunkSource, DriverOptions, TransportDriver, WavChunkSource};

#[derive(Parser, Debug)]
#[command(name = "capsync")]
#[command(about = "Replay a capture transport through the sync-and-ring ingestion engine")]
struct Args {
    /// Stereo WAV file to replay as transport chunks
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// TOML capture configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Alignment check interval in chunks (overrides config)
    #[arg(long)]
    check_interval: Option<u64>,

    /// Transport chunk length in bytes (overrides config)
    #[arg(long)]
    chunk_len: Option<usize>,

    /// Bytes dropped from the start of the input, to start out of alignment
    #[arg(long, default_value_t = 0)]
    skew: usize,

    /// Deliver chunks at the real stream rate
    #[arg(long)]
    realtime: bool,

    /// Status output format
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Seconds between status lines
    #[arg(long, default_value_t = 1.0)]
    status_interval: f32,

    /// Increase output verbosity
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Generate a test tone instead of reading a file
    #[cfg(feature = "simulation")]
    #[arg(long, conflicts_with = "input")]
    synthetic: bool,

    /// Tone frequency in Hz for --synthetic
    #[cfg(feature = "simulation")]
    #[arg(long, default_value_t = 1000.0)]
    tone_hz: f32,

    /// Number of chunks to generate with --synthetic
    #[cfg(feature = "simulation")]
    #[arg(long, default_value_t = 2000)]
    chunks: u64,

    /// Per-chunk probability of a byte slip with --synthetic
    #[cfg(feature = "simulation")]
    #[arg(long, default_value_t = 0.0)]
    slip_rate: f32,

    /// Seed for slip injection
    #[cfg(feature = "simulation")]
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = load_config(&args)?;

    println!("=== capsync ===");
    println!(
        "Chunk: {} bytes, period: {} bytes x {}, check every {} chunks",
        config.expected_chunk_len,
        config.period_bytes,
        config.periods_per_buffer,
        config.sync_check_interval
    );
    println!();

    let source = build_source(&args, &config)?;

    let (mut channel, handle) = CaptureChannel::open(&config)?;

    let (notifier, waker) = PeriodNotifier::spawn(
        handle.clone(),
        Duration::from_millis(config.notify_poll_ms),
        |position| log::trace!("Period elapsed at frame {}", position),
    )?;
    channel.attach_waker(waker);

    handle.start();

    let driver = TransportDriver::spawn(
        source,
        channel,
        DriverOptions {
            paced: args.realtime,
            realtime_priority: args.realtime,
            stop_at_end: true,
        },
    )?;

    let formatter = create_formatter(args.format, args.verbose);
    let interval = Duration::from_secs_f32(args.status_interval.max(0.05));
    let mut last_status = Instant::now();

    while !driver.is_finished() {
        thread::sleep(Duration::from_millis(20));
        if last_status.elapsed() >= interval {
            print_status(formatter.as_ref(), &handle);
            last_status = Instant::now();
        }
    }

    let channel = driver.join()?;
    notifier.shutdown();
    print_status(formatter.as_ref(), &handle);

    let stats = channel.close();
    println!();
    println!(
        "Done: {} chunks, {} bytes, {} sync losses ({} without marker), {} notifications",
        stats.chunks,
        stats.bytes_written,
        stats.sync_losses,
        stats.search_failures,
        stats.periods_notified
    );

    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<CaptureConfig> {
    let mut config = match &args.config {
        Some(path) => CaptureConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CaptureConfig::default(),
    };

    if let Some(interval) = args.check_interval {
        config.sync_check_interval = interval;
    }
    if let Some(len) = args.chunk_len {
        config.expected_chunk_len = len;
    }

    config.validate()?;
    Ok(config)
}

fn build_source(args: &Args, config: &CaptureConfig) -> anyhow::Result<Box<dyn ChunkSource>> {
    if let Some(source) = synthetic_source(args, config) {
        return Ok(source);
    }

    let Some(path) = &args.input else {
        anyhow::bail!("no input given (use --input <file.wav>)");
    };

    let source = WavChunkSource::new(path, config.expected_chunk_len)
        .with_context(|| format!("opening {}", path.display()))?;
    if source.sample_rate() != config.sample_rate {
        log::warn!(
            "Input is {} Hz, stream is configured for {} Hz; replaying unconverted",
            source.sample_rate(),
            config.sample_rate
        );
    }
    Ok(Box::new(source.with_skew(args.skew)))
}

#[cfg(feature = "simulation")]
fn synthetic_source(args: &Args, config: &CaptureConfig) -> Option<Box<dyn ChunkSource>> {
    use capsync::simulation::{SlipConfig, SyntheticChunkSource};

    if !args.synthetic {
        return None;
    }
    let source = SyntheticChunkSource::new(
        args.tone_hz,
        config.sample_rate,
        config.expected_chunk_len,
    )
    .with_limit(args.chunks)
    .with_slips(&SlipConfig {
        seed: args.seed,
        probability: args.slip_rate,
    });
    Some(Box::new(source))
}

#[cfg(not(feature = "simulation"))]
fn synthetic_source(_args: &Args, _config: &CaptureConfig) -> Option<Box<dyn ChunkSource>> {
    None
}

fn print_status(formatter: &dyn Formatter, handle: &StreamHandle) {
    let status = StatusOutput {
        running: handle.is_running(),
        position_frames: handle.position_frames(),
        sync_offset: handle.sync_offset(),
        stats: handle.stats(),
    };
    println!("{}", formatter.format(&status));
}
