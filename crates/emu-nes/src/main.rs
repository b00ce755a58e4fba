//! NES emulator binary.
//!
//! Loads a ROM and runs it headless for a number of frames, optionally
//! writing the audio to a WAV file or playing it live.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use emu_nes::audio::AudioOutput;
use emu_nes::capture::WavCapture;
use emu_nes::{CPU_CYCLES_PER_FRAME, Nes, NesConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Headless NES runner
#[derive(Parser, Debug)]
#[command(name = "emu-nes", version, about, long_about = None)]
struct Args {
    /// Path to the iNES ROM file
    #[arg(short, long)]
    rom: PathBuf,

    /// Number of frames to run
    #[arg(short, long, default_value_t = 60)]
    frames: u32,

    /// Write audio to a 16-bit mono WAV file
    #[arg(long, conflicts_with = "play")]
    wav: Option<PathBuf>,

    /// Play audio on the default output device
    #[arg(long)]
    play: bool,

    /// Pace frames at the NTSC frame rate
    #[arg(long)]
    realtime: bool,

    /// Log filter, e.g. "info" or "mos_6502=trace" (overrides RUST_LOG)
    #[arg(long)]
    log: Option<String>,
}

fn init_tracing(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives).context("invalid --log filter")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    let rom_data =
        fs::read(&args.rom).with_context(|| format!("reading {}", args.rom.display()))?;
    let config = NesConfig::new(rom_data);
    let mut nes = Nes::new(&config).context("loading cartridge")?;

    let sample_rate = config.audio.sample_rate as u32;
    let frame_time = CPU_CYCLES_PER_FRAME as f64 / config.audio.cpu_hz;

    let _output = if args.play {
        let output = nes
            .take_audio_consumer()
            .and_then(|consumer| AudioOutput::new(consumer, sample_rate));
        if output.is_none() {
            warn!("no audio device available, continuing silently");
        }
        output
    } else {
        None
    };

    let mut wav = args
        .wav
        .as_deref()
        .map(|path| {
            WavCapture::create(path, sample_rate, 1.0 / frame_time)
                .with_context(|| format!("creating {}", path.display()))
        })
        .transpose()?;

    let pace = args.realtime || args.play;
    let frame_duration = Duration::from_secs_f64(frame_time);
    let mut deadline = Instant::now();

    let mut frames_run = 0;
    while frames_run < args.frames {
        nes.run_frame().context("emulation stopped")?;
        frames_run += 1;

        if let Some(capture) = wav.as_mut() {
            capture.capture_frame(&mut nes).context("writing WAV")?;
        }
        if !nes.is_running() {
            info!(frames = frames_run, "CPU halted");
            break;
        }
        if pace {
            deadline += frame_duration;
            if let Some(wait) = deadline.checked_duration_since(Instant::now()) {
                thread::sleep(wait);
            }
        }
    }

    if let Some(capture) = wav {
        let samples = capture.len();
        capture.finish().context("finalizing WAV")?;
        if let Some(path) = &args.wav {
            info!(samples, path = %path.display(), "audio written");
        }
    }

    let stats = nes.audio_stats();
    info!(
        frames = frames_run,
        cycles = nes.total_cycles(),
        overruns = stats.overruns,
        underruns = stats.underruns,
        divisor = stats.divisor,
        "done"
    );
    Ok(())
}
