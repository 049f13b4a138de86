//! Temperature - sustained intensity estimate
//!
//! A slow scalar in [0, 1] with asymmetric attack and decay. Loud sections
//! heat it up (faster on onsets), quiet sections cool it down slowly.

use crate::audio::AudioFeatures;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the [`TemperatureEstimator`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureConfig {
    /// Smoothing factor applied to overall energy before tiering
    pub volume_smoothing: f32,
    /// Volume above which the temperature rises
    pub attack_volume: f32,
    /// Volume below which the temperature decays at the fast rate
    pub decay_volume: f32,
    /// Per-tick rise above `attack_volume`
    pub attack_step: f32,
    /// Extra attack multiplier applied on an onset tick
    pub onset_boost: f32,
    /// Per-tick decay below `decay_volume`
    pub decay_step: f32,
    /// Per-tick decay between the two volume tiers
    pub idle_decay_step: f32,
    /// Starting temperature
    pub initial: f32,
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self {
            volume_smoothing: 0.1,
            attack_volume: 0.4,
            decay_volume: 0.2,
            attack_step: 0.005,
            onset_boost: 2.0,
            decay_step: 0.001,
            idle_decay_step: 0.0005,
            initial: 0.0,
        }
    }
}

/// Tracks sustained intensity across ticks
#[derive(Debug, Clone)]
pub struct TemperatureEstimator {
    config: TemperatureConfig,
    volume: f32,
    temperature: f32,
}

impl TemperatureEstimator {
    /// Create an estimator at the configured initial temperature
    pub fn new(config: TemperatureConfig) -> Self {
        let temperature = config.initial.clamp(0.0, 1.0);
        Self {
            config,
            volume: 0.0,
            temperature,
        }
    }

    /// Advance one tick and return the new temperature.
    ///
    /// The step sizes are per tick, not per second.
    pub fn update(&mut self, features: &AudioFeatures) -> f32 {
        let energy = if features.energy.is_finite() {
            features.energy
        } else {
            0.0
        };
        self.volume += (energy - self.volume) * self.config.volume_smoothing;

        let delta = if self.volume > self.config.attack_volume {
            let boost = if features.is_onset {
                self.config.onset_boost
            } else {
                0.0
            };
            self.config.attack_step * (1.0 + boost)
        } else if self.volume < self.config.decay_volume {
            -self.config.decay_step
        } else {
            -self.config.idle_decay_step
        };

        let previous = self.temperature;
        self.temperature = (self.temperature + delta).clamp(0.0, 1.0);

        if (previous < 1.0 && self.temperature >= 1.0) || (previous > 0.0 && self.temperature <= 0.0) {
            debug!("Temperature saturated at {:.1}", self.temperature);
        }

        self.temperature
    }

    /// Current temperature
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Smoothed volume used for tiering
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Force the temperature, e.g. to start a session hot
    pub fn set_temperature(&mut self, temperature: f32) {
        self.temperature = temperature.clamp(0.0, 1.0);
    }
}

impl Default for TemperatureEstimator {
    fn default() -> Self {
        Self::new(TemperatureConfig::default())
    }
}
