//! Feature Extractor - onset detection and band smoothing
//!
//! Spectral-flux kick detection on the bass band with an adaptive threshold
//! and a debounce window, plus exponentially smoothed band energies and a
//! beat/epoch clock derived from the onsets.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Inclusive range of spectrum bins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinRange {
    /// First bin
    pub start: usize,
    /// Last bin (inclusive)
    pub end: usize,
}

impl BinRange {
    /// Create an inclusive range
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Mean magnitude over the bins present in `bins`, normalized by `scale`.
    ///
    /// A spectrum shorter than the range only contributes the bins it has;
    /// no overlap at all yields 0.
    pub fn mean(&self, bins: &[u8], scale: f32) -> f32 {
        if self.start > self.end || self.start >= bins.len() {
            return 0.0;
        }
        let end = self.end.min(bins.len() - 1);
        let slice = &bins[self.start..=end];
        let sum: u32 = slice.iter().map(|&b| b as u32).sum();
        (sum as f32 / slice.len() as f32 / scale).clamp(0.0, 1.0)
    }
}

/// Per-tick audio features
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioFeatures {
    /// Smoothed bass energy (0.0 - 1.0)
    pub bass: f32,
    /// Smoothed mid energy (0.0 - 1.0)
    pub mid: f32,
    /// Smoothed high energy (0.0 - 1.0)
    pub high: f32,
    /// Smoothed overall energy (0.0 - 1.0)
    pub energy: f32,
    /// True only on the tick an onset fires
    pub is_onset: bool,
    /// Onsets detected since session start
    pub beat_count: u64,
    /// Incremented once every `beats_per_epoch` onsets
    pub scene_epoch: u64,
    /// Raw bass flux of this tick
    pub flux: f32,
    /// Adaptive threshold the flux was compared against
    pub threshold: f32,
    /// Estimated tempo in BPM (None if not enough onsets)
    pub tempo_bpm: Option<f32>,
    /// Timestamp of the spectrum these features came from
    pub timestamp: f64,
}

/// Configuration for the [`FeatureExtractor`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Bins averaged into the bass energy
    pub bass_bins: BinRange,
    /// Bins averaged into the mid energy
    pub mid_bins: BinRange,
    /// Bins averaged into the high energy
    pub high_bins: BinRange,
    /// Full-scale bin magnitude
    pub magnitude_scale: f32,
    /// Depth of the flux history ring
    pub flux_history_len: usize,
    /// Lower bound of the adaptive threshold
    pub threshold_floor: f32,
    /// Multiplier applied to the mean flux
    pub threshold_multiplier: f32,
    /// Minimum spacing between onsets, seconds
    pub debounce_s: f64,
    /// Onsets per scene epoch
    pub beats_per_epoch: u64,
    /// Smoothing factor for bass
    pub bass_smoothing: f32,
    /// Smoothing factor for mid, high and overall energy
    pub band_smoothing: f32,
    /// Onset timestamps kept for tempo estimation
    pub tempo_history_len: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            bass_bins: BinRange::new(0, 6),
            mid_bins: BinRange::new(8, 100),
            high_bins: BinRange::new(101, 512),
            magnitude_scale: 255.0,
            flux_history_len: 30,
            threshold_floor: 0.15,
            threshold_multiplier: 2.0,
            debounce_s: 0.1,
            beats_per_epoch: 16,
            bass_smoothing: 0.2,
            band_smoothing: 0.1,
            tempo_history_len: 16,
        }
    }
}

/// Spectrum-to-features stage with session-long history
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: ExtractorConfig,
    prev_bass: f32,
    flux_history: VecDeque<f32>,
    last_onset: Option<f64>,
    onset_timestamps: VecDeque<f64>,
    latest: AudioFeatures,
}

impl FeatureExtractor {
    /// Create an extractor with empty history
    pub fn new(config: ExtractorConfig) -> Self {
        debug!(
            "FeatureExtractor created: bass={:?}, mid={:?}, high={:?}, history={}",
            config.bass_bins, config.mid_bins, config.high_bins, config.flux_history_len
        );

        Self {
            flux_history: VecDeque::with_capacity(config.flux_history_len + 1),
            onset_timestamps: VecDeque::with_capacity(config.tempo_history_len + 1),
            config,
            prev_bass: 0.0,
            last_onset: None,
            latest: AudioFeatures::default(),
        }
    }

    /// Process one spectrum and return the updated features.
    ///
    /// A missing or empty spectrum returns the last-known features with the
    /// onset flag cleared and leaves all history untouched.
    pub fn process(&mut self, bins: Option<&[u8]>, timestamp: f64) -> AudioFeatures {
        let bins = match bins {
            Some(b) if !b.is_empty() => b,
            _ => {
                trace!("No spectrum at t={:.3}, holding last features", timestamp);
                self.latest.is_onset = false;
                return self.latest;
            }
        };

        let scale = self.config.magnitude_scale;
        let raw_bass = self.config.bass_bins.mean(bins, scale);

        // Spectral flux: positive rise in bass energy
        let flux = (raw_bass - self.prev_bass).max(0.0);
        self.prev_bass = raw_bass;

        self.flux_history.push_back(flux);
        while self.flux_history.len() > self.config.flux_history_len.max(1) {
            self.flux_history.pop_front();
        }
        let mean_flux = self.flux_history.iter().sum::<f32>() / self.flux_history.len() as f32;
        let threshold = (mean_flux * self.config.threshold_multiplier).max(self.config.threshold_floor);

        let debounced = match self.last_onset {
            Some(last) => timestamp - last > self.config.debounce_s,
            None => true,
        };
        let is_onset = flux > threshold && debounced;

        let mut features = self.latest;
        if is_onset {
            self.last_onset = Some(timestamp);
            features.beat_count += 1;
            if self.config.beats_per_epoch > 0 && features.beat_count % self.config.beats_per_epoch == 0 {
                features.scene_epoch += 1;
                debug!(
                    "Scene epoch {} at beat {}",
                    features.scene_epoch, features.beat_count
                );
            }

            self.onset_timestamps.push_back(timestamp);
            while self.onset_timestamps.len() > self.config.tempo_history_len {
                self.onset_timestamps.pop_front();
            }
            features.tempo_bpm = self.calculate_bpm();

            trace!(
                "Onset #{} at t={:.3}: flux={:.3} > threshold={:.3}",
                features.beat_count,
                timestamp,
                flux,
                threshold
            );
        }

        let raw_mid = self.config.mid_bins.mean(bins, scale);
        let raw_high = self.config.high_bins.mean(bins, scale);
        let raw_energy = (raw_bass + raw_mid + raw_high) / 3.0;

        features.bass += (raw_bass - features.bass) * self.config.bass_smoothing;
        features.mid += (raw_mid - features.mid) * self.config.band_smoothing;
        features.high += (raw_high - features.high) * self.config.band_smoothing;
        features.energy += (raw_energy - features.energy) * self.config.band_smoothing;

        features.is_onset = is_onset;
        features.flux = flux;
        features.threshold = threshold;
        features.timestamp = timestamp;

        self.latest = features;
        features
    }

    /// Calculate BPM from recent onset timestamps
    fn calculate_bpm(&self) -> Option<f32> {
        if self.onset_timestamps.len() < 4 {
            return None;
        }

        let mut intervals: Vec<f64> = self
            .onset_timestamps
            .iter()
            .zip(self.onset_timestamps.iter().skip(1))
            .map(|(a, b)| b - a)
            .collect();

        intervals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        // Drop the outer quartiles once there are enough intervals
        let valid = if intervals.len() >= 4 {
            let start = intervals.len() / 4;
            &intervals[start..intervals.len() - start]
        } else {
            &intervals[..]
        };

        if valid.is_empty() {
            return None;
        }

        let avg_interval = valid.iter().sum::<f64>() / valid.len() as f64;
        if avg_interval <= 0.001 {
            return None;
        }

        let bpm = (60.0 / avg_interval) as f32;
        let bpm = if (60.0..=200.0).contains(&bpm) {
            bpm
        } else if (200.0..=400.0).contains(&bpm) {
            bpm / 2.0
        } else if (30.0..60.0).contains(&bpm) {
            bpm * 2.0
        } else {
            return None;
        };

        Some((bpm * 10.0).round() / 10.0)
    }

    /// Most recent features
    pub fn latest(&self) -> &AudioFeatures {
        &self.latest
    }

    /// Current config
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}
