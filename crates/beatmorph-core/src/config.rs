//! Engine configuration
//!
//! One serde struct per component, aggregated in [`EngineConfig`]. Every
//! field has a default, so a partial JSON document is a valid config.

use crate::audio::ExtractorConfig;
use crate::camera::CameraConfig;
use crate::director::DirectorConfig;
use crate::logging::LogConfig;
use crate::particles::ParticleConfig;
use crate::stage::StageConfig;
use crate::temperature::TemperatureConfig;
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Complete session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Particles in the field
    pub particle_count: usize,
    /// Largest delta a tick will integrate, seconds
    pub max_delta_s: f32,
    /// RNG seed for reproducible sessions; `None` seeds from the OS
    pub seed: Option<u64>,
    /// Feature Extractor settings
    pub extractor: ExtractorConfig,
    /// Temperature Estimator settings
    pub temperature: TemperatureConfig,
    /// Director settings
    pub director: DirectorConfig,
    /// Particle Engine settings
    pub particles: ParticleConfig,
    /// Camera Engine settings
    pub camera: CameraConfig,
    /// Stage uniform settings
    pub stage: StageConfig,
    /// Logging settings (used by the host)
    pub log: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            particle_count: 10_000,
            max_delta_s: 0.1,
            seed: None,
            extractor: ExtractorConfig::default(),
            temperature: TemperatureConfig::default(),
            director: DirectorConfig::default(),
            particles: ParticleConfig::default(),
            camera: CameraConfig::default(),
            stage: StageConfig::default(),
            log: LogConfig::default(),
        }
    }
}

fn invalid(msg: impl Into<String>) -> CoreError {
    CoreError::InvalidConfig(msg.into())
}

/// Require a finite value inside `[min, max]`
fn check_range(name: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!(
            "{} = {} (expected {} ..= {})",
            name, value, min, max
        )))
    }
}

/// Require a finite, strictly positive value
fn check_positive(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{} = {} (expected > 0)", name, value)))
    }
}

impl EngineConfig {
    /// Reject non-finite and out-of-range values
    pub fn validate(&self) -> Result<()> {
        check_positive("max_delta_s", self.max_delta_s)?;

        let e = &self.extractor;
        for (name, range) in [
            ("extractor.bass_bins", e.bass_bins),
            ("extractor.mid_bins", e.mid_bins),
            ("extractor.high_bins", e.high_bins),
        ] {
            if range.start > range.end {
                return Err(invalid(format!(
                    "{} starts after it ends ({} > {})",
                    name, range.start, range.end
                )));
            }
        }
        check_positive("extractor.magnitude_scale", e.magnitude_scale)?;
        if e.flux_history_len == 0 {
            return Err(invalid("extractor.flux_history_len must be at least 1"));
        }
        if e.beats_per_epoch == 0 {
            return Err(invalid("extractor.beats_per_epoch must be at least 1"));
        }
        check_range("extractor.threshold_floor", e.threshold_floor, 0.0, f32::MAX)?;
        check_range("extractor.threshold_multiplier", e.threshold_multiplier, 0.0, f32::MAX)?;
        if !(e.debounce_s.is_finite() && e.debounce_s >= 0.0) {
            return Err(invalid(format!(
                "extractor.debounce_s = {} (expected >= 0)",
                e.debounce_s
            )));
        }
        check_range("extractor.bass_smoothing", e.bass_smoothing, 0.0, 1.0)?;
        check_range("extractor.band_smoothing", e.band_smoothing, 0.0, 1.0)?;

        let t = &self.temperature;
        check_range("temperature.volume_smoothing", t.volume_smoothing, 0.0, 1.0)?;
        check_range("temperature.initial", t.initial, 0.0, 1.0)?;
        check_range("temperature.attack_step", t.attack_step, 0.0, 1.0)?;
        check_range("temperature.decay_step", t.decay_step, 0.0, 1.0)?;
        check_range("temperature.idle_decay_step", t.idle_decay_step, 0.0, 1.0)?;
        if t.decay_volume > t.attack_volume {
            return Err(invalid("temperature.decay_volume must not exceed attack_volume"));
        }

        let d = &self.director;
        if d.beats_per_bar == 0 || d.bars_per_phrase == 0 || d.mixup_every_bars == 0 {
            return Err(invalid("director bar/phrase lengths must be at least 1"));
        }
        check_range("director.mid_threshold", d.mid_threshold, 0.0, 1.0)?;
        check_range("director.high_threshold", d.high_threshold, 0.0, 1.0)?;
        check_range("director.peak_threshold", d.peak_threshold, 0.0, 1.0)?;
        if !(d.mid_threshold <= d.high_threshold && d.high_threshold <= d.peak_threshold) {
            return Err(invalid("director tier thresholds must be ascending"));
        }
        check_range("director.glitch_probability", d.glitch_probability, 0.0, 1.0)?;

        let p = &self.particles;
        check_range("particles.morph_rate", p.morph_rate, 0.0, f32::MAX)?;
        check_positive("particles.scan_half_width", p.scan_half_width)?;
        check_positive("particles.min_scale", p.min_scale)?;
        check_positive("particles.max_scale", p.max_scale)?;

        let c = &self.camera;
        check_range("camera.base_fov", c.base_fov, 1.0, 179.0)?;
        for (name, value) in [
            ("camera.fov_smooth", c.fov_smooth),
            ("camera.shake_smooth", c.shake_smooth),
            ("camera.look_smooth", c.look_smooth),
            ("camera.roll_smooth", c.roll_smooth),
            ("camera.steady_smooth", c.steady_smooth),
            ("camera.kinetic_smooth", c.kinetic_smooth),
            ("camera.glitchy_smooth", c.glitchy_smooth),
            ("camera.dolly_smooth", c.dolly_smooth),
            ("camera.orbital_smooth", c.orbital_smooth),
            ("camera.macro_smooth", c.macro_smooth),
        ] {
            check_positive(name, value)?;
        }
        check_positive("camera.cool_distance", c.cool_distance)?;
        check_positive("camera.hot_distance", c.hot_distance)?;

        let s = &self.stage;
        for (name, value) in [
            ("stage.temperature_smooth", s.temperature_smooth),
            ("stage.band_smooth", s.band_smooth),
            ("stage.ambient_smooth", s.ambient_smooth),
            ("stage.strobe_smooth", s.strobe_smooth),
            ("stage.light_smooth", s.light_smooth),
        ] {
            check_positive(name, value)?;
        }

        Ok(())
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        info!("Loaded engine config from {:?}", path);
        Ok(config)
    }

    /// Pretty JSON rendering
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeKind;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.particle_count, 10_000);
        assert_eq!(config.max_delta_s, 0.1);
        assert_eq!(config.extractor.debounce_s, 0.1);
        assert_eq!(config.director.peak_threshold, 0.9);
        assert_eq!(config.camera.base_fov, 45.0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{
                "particle_count": 2048,
                "seed": 7,
                "director": { "geometries": ["torus", "knot"] },
                "camera": { "glitchy_smooth": 3.0 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.particle_count, 2048);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.director.geometries, vec![ShapeKind::Torus, ShapeKind::Knot]);
        assert_eq!(config.director.beats_per_bar, 4);
        assert_eq!(config.camera.glitchy_smooth, 3.0);
        assert_eq!(config.camera.steady_smooth, 0.8);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.max_delta_s = f32::NAN;
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));

        let mut config = EngineConfig::default();
        config.director.high_threshold = 0.95;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.extractor.mid_bins.start = 200;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.camera.fov_smooth = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            EngineConfig::from_json_str("{ particle_count: }"),
            Err(CoreError::Json(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "director": { "geometries": "torus" } }"#),
            Err(CoreError::Json(_))
        ));
    }

    #[test]
    fn test_unknown_geometry_falls_back_to_scatter() {
        let config = EngineConfig::from_json_str(
            r#"{ "director": { "geometries": ["sphere", "hyperplane", "knot"] } }"#,
        )
        .unwrap();
        assert_eq!(
            config.director.geometries,
            vec![ShapeKind::Sphere, ShapeKind::Scatter, ShapeKind::Knot]
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.json");

        let mut config = EngineConfig::default();
        config.seed = Some(99);
        config.particles.morph_rate = 2.5;
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            EngineConfig::load(dir.path().join("missing.json")),
            Err(CoreError::Io(_))
        ));
    }
}
