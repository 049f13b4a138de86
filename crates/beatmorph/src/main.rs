//! beatmorph - headless host for the choreography engine
//!
//! Drives a [`Session`] from a synthetic kick-and-pad spectrum and reports
//! the resulting choreography through the log.

#![warn(missing_docs)]

mod logging_setup;
mod synth;
mod telemetry;

use anyhow::{bail, Context, Result};
use beatmorph_core::{EngineConfig, Session};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use synth::SyntheticSpectrum;
use telemetry::TelemetrySink;
use tracing::info;

const USAGE: &str =
    "Usage: beatmorph [config.json] [--seconds N] [--seed S] [--realtime] [--bpm B]";

/// Fixed simulation step
const STEP: f32 = 1.0 / 60.0;

/// Command line options
#[derive(Debug, Clone, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    seconds: f64,
    seed: Option<u64>,
    realtime: bool,
    bpm: f32,
    help: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: None,
            seconds: 60.0,
            seed: None,
            realtime: false,
            bpm: 128.0,
            help: false,
        }
    }
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .with_context(|| format!("{} needs a value", flag))
            };
            match arg.as_str() {
                "--seconds" => {
                    let v = value("--seconds")?;
                    parsed.seconds = v
                        .parse()
                        .with_context(|| format!("Invalid --seconds value: {}", v))?;
                    if !(parsed.seconds.is_finite() && parsed.seconds >= 0.0) {
                        bail!("--seconds must be a non-negative number");
                    }
                }
                "--seed" => {
                    let v = value("--seed")?;
                    parsed.seed = Some(
                        v.parse()
                            .with_context(|| format!("Invalid --seed value: {}", v))?,
                    );
                }
                "--bpm" => {
                    let v = value("--bpm")?;
                    parsed.bpm = v
                        .parse()
                        .with_context(|| format!("Invalid --bpm value: {}", v))?;
                    if !(parsed.bpm.is_finite() && parsed.bpm > 0.0) {
                        bail!("--bpm must be positive");
                    }
                }
                "--realtime" => parsed.realtime = true,
                "-h" | "--help" => parsed.help = true,
                flag if flag.starts_with("--") => bail!("Unknown option {}\n{}", flag, USAGE),
                path => {
                    if parsed.config.is_some() {
                        bail!("Only one config file may be given\n{}", USAGE);
                    }
                    parsed.config = Some(PathBuf::from(path));
                }
            }
        }

        Ok(parsed)
    }
}

/// Application entry point
fn main() -> Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => EngineConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let _log_guard = logging_setup::init(&config.log)?;

    info!("==========================================");
    info!("===      beatmorph Session Started     ===");
    info!("==========================================");
    if let Some(path) = &args.config {
        info!("Config: {:?}", path);
    }
    info!(
        "Running {:.0}s at {} BPM ({})",
        args.seconds,
        args.bpm,
        if args.realtime { "realtime" } else { "fixed step" }
    );

    // The pad texture must not consume the session's random stream
    let source_seed = config.seed.map(|seed| seed.rotate_left(17) ^ 0x5eed);
    let mut source = SyntheticSpectrum::new(args.bpm, source_seed);
    let mut sink = TelemetrySink::new();
    let mut session = Session::new(config).context("Failed to start session")?;

    let started = Instant::now();
    if args.realtime {
        let frame = Duration::from_secs_f32(STEP);
        let mut last = Instant::now();
        while session.elapsed() < args.seconds {
            let now = Instant::now();
            let dt = now.duration_since(last).as_secs_f32();
            last = now;
            session.tick(dt, &mut source, &mut sink);

            let busy = now.elapsed();
            if busy < frame {
                std::thread::sleep(frame - busy);
            }
        }
    } else {
        let ticks = (args.seconds * f64::from(STEP.recip())).ceil() as u64;
        for _ in 0..ticks {
            session.tick(STEP, &mut source, &mut sink);
        }
    }

    let features = session.features();
    info!(
        "Session finished: {} frames ({:.1}s simulated) in {:.2?}, {} beats, epoch {}, temperature {:.2}",
        sink.frames(),
        session.elapsed(),
        started.elapsed(),
        features.beat_count,
        features.scene_epoch,
        session.temperature()
    );

    Ok(())
}
