//! Synthetic spectrum for running without an audio device
//!
//! A kick drum at a fixed tempo over a pad whose loudness follows a
//! 64-second build / drop / recover arc.

use beatmorph_core::{SpectrumFrame, SpectrumSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Bins per spectrum, matching a 2048-point FFT
pub const SPECTRUM_BINS: usize = 1024;

/// Length of one build / drop / recover arc, seconds
pub const CYCLE_SECONDS: f64 = 64.0;

/// Highest bass bin the kick lands in
const KICK_BINS: usize = 7;
/// First bin of the pad
const PAD_START: usize = 8;

/// Pad loudness in [0, 1] at session time `t`
pub fn intensity(t: f64) -> f32 {
    let phase = (t.rem_euclid(CYCLE_SECONDS) / CYCLE_SECONDS) as f32;
    if phase < 0.5 {
        // build
        0.2 + 0.8 * (phase / 0.5)
    } else if phase < 0.625 {
        // breakdown
        0.1
    } else {
        // recover
        0.4 + 0.5 * ((phase - 0.625) / 0.375)
    }
}

/// Kick drum plus pad, sampled on demand
pub struct SyntheticSpectrum {
    bins: Vec<u8>,
    beat_period: f64,
    rng: StdRng,
}

impl SyntheticSpectrum {
    /// Create a source kicking at `bpm`. `seed` only shapes the pad texture.
    pub fn new(bpm: f32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            bins: vec![0; SPECTRUM_BINS],
            beat_period: 60.0 / bpm.clamp(30.0, 300.0) as f64,
            rng,
        }
    }

    /// Seconds between kicks
    pub fn beat_period(&self) -> f64 {
        self.beat_period
    }

    fn render(&mut self, now: f64) {
        let level = intensity(now);

        let since_kick = now.rem_euclid(self.beat_period) as f32;
        let accent = if level < 0.15 { 0.35 } else { 0.6 + 0.4 * level };
        let kick = (-since_kick * 10.0).exp() * accent;
        let kick = (kick * 255.0).round() as u8;
        self.bins[..KICK_BINS].fill(kick);
        self.bins[KICK_BINS] = 0;

        let span = (SPECTRUM_BINS - PAD_START) as f32;
        for (i, bin) in self.bins[PAD_START..].iter_mut().enumerate() {
            // Gentle high-frequency roll-off
            let tilt = 1.0 - 0.5 * (i as f32 / span);
            let texture = self.rng.random_range(-0.08f32..0.08);
            let value = (level * tilt + texture * level).clamp(0.0, 1.0);
            *bin = (value * 255.0).round() as u8;
        }
    }
}

impl SpectrumSource for SyntheticSpectrum {
    fn read_spectrum(&mut self, now: f64) -> Option<SpectrumFrame<'_>> {
        self.render(now);
        Some(SpectrumFrame::new(&self.bins, now))
    }
}
