//! Director - phrase and tier orchestration
//!
//! Two evaluators write into one [`VisualConfiguration`]:
//! - the phrase evaluator reacts to bar and phrase boundaries of the beat
//!   clock (material, camera mode, geometry);
//! - the tier evaluator reacts to the temperature every tick (effects,
//!   camera escalation, the glitch look at the top).
//!
//! The tier evaluator runs last, so on a conflicting tick its camera mode
//! wins. Nothing is retried or rolled back.

use crate::audio::AudioFeatures;
use crate::shapes::ShapeKind;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Procedural camera modes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    /// Slow drift in front of the subject
    #[default]
    Steady,
    /// Breathing orbit
    Kinetic,
    /// Fast orbit with vertical bounce
    Glitchy,
    /// Distance oscillates while the FOV counter-zooms
    DollyZoom,
    /// Nested fast orbits
    OrbitalChaos,
    /// Close, slow drift
    Macro,
}

impl CameraMode {
    /// Every mode, in declaration order
    pub const ALL: [CameraMode; 6] = [
        CameraMode::Steady,
        CameraMode::Kinetic,
        CameraMode::Glitchy,
        CameraMode::DollyZoom,
        CameraMode::OrbitalChaos,
        CameraMode::Macro,
    ];

    /// Stable identifier
    pub fn name(self) -> &'static str {
        match self {
            CameraMode::Steady => "steady",
            CameraMode::Kinetic => "kinetic",
            CameraMode::Glitchy => "glitchy",
            CameraMode::DollyZoom => "dolly_zoom",
            CameraMode::OrbitalChaos => "orbital_chaos",
            CameraMode::Macro => "macro",
        }
    }

    /// Lenient lookup: unknown identifiers resolve to [`CameraMode::Steady`].
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name() == name)
            .unwrap_or_else(|| {
                warn!("Unknown camera mode '{}', falling back to steady", name);
                CameraMode::Steady
            })
    }
}

/// Material looks for the rendering collaborator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialId {
    /// Audio-reactive default shading
    #[default]
    Reactive,
    /// Plain points
    Points,
    /// Glossy liquid
    Liquid,
    /// Transparent hologram
    Hologram,
    /// Wireframe grid
    CyberGrid,
    /// Corrupted peak look
    Glitch,
}

impl MaterialId {
    /// Every material, in declaration order
    pub const ALL: [MaterialId; 6] = [
        MaterialId::Reactive,
        MaterialId::Points,
        MaterialId::Liquid,
        MaterialId::Hologram,
        MaterialId::CyberGrid,
        MaterialId::Glitch,
    ];

    /// Stable identifier
    pub fn name(self) -> &'static str {
        match self {
            MaterialId::Reactive => "reactive",
            MaterialId::Points => "points",
            MaterialId::Liquid => "liquid",
            MaterialId::Hologram => "hologram",
            MaterialId::CyberGrid => "cyber_grid",
            MaterialId::Glitch => "glitch",
        }
    }

    /// Lenient lookup: unknown identifiers resolve to [`MaterialId::Reactive`].
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name() == name)
            .unwrap_or_else(|| {
                warn!("Unknown material '{}', falling back to reactive", name);
                MaterialId::Reactive
            })
    }
}

/// Overlay effects toggled by the tier evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Bloom glow
    Bloom,
    /// Chromatic aberration
    Chromatic,
    /// Frame feedback trails
    Afterimage,
}

impl Effect {
    /// Stable identifier
    pub fn name(self) -> &'static str {
        match self {
            Effect::Bloom => "bloom",
            Effect::Chromatic => "chromatic",
            Effect::Afterimage => "afterimage",
        }
    }
}

/// Temperature bands of the tier evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureTier {
    /// Ambient / chill
    Ambient,
    /// Mid energy
    Mid,
    /// High energy
    High,
    /// Peak / the drop
    Peak,
}

impl TemperatureTier {
    /// Classify a temperature. Each threshold belongs to the tier above it.
    pub fn classify(temperature: f32, config: &DirectorConfig) -> Self {
        if temperature >= config.peak_threshold {
            TemperatureTier::Peak
        } else if temperature >= config.high_threshold {
            TemperatureTier::High
        } else if temperature >= config.mid_threshold {
            TemperatureTier::Mid
        } else {
            TemperatureTier::Ambient
        }
    }
}

/// The Director's selections, read by every downstream stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualConfiguration {
    /// Phrase-level geometry
    pub geometry: ShapeKind,
    /// Current material
    pub material: MaterialId,
    /// Current camera mode
    pub camera_mode: CameraMode,
    /// Enabled overlay effects
    pub effects: BTreeSet<Effect>,
    /// Transient glitch-morph shape, takes precedence over `geometry`.
    ///
    /// Held until the next onset that does not re-trigger it rather than
    /// for a single frame, so the field has time to visibly morph toward it.
    pub shape_override: Option<ShapeKind>,
}

impl VisualConfiguration {
    /// Shape the particle field should morph toward
    pub fn target_shape(&self) -> ShapeKind {
        self.shape_override.unwrap_or(self.geometry)
    }

    /// Whether `effect` is enabled
    pub fn has_effect(&self, effect: Effect) -> bool {
        self.effects.contains(&effect)
    }

    /// Enable or disable `effect`
    pub fn set_effect(&mut self, effect: Effect, active: bool) {
        if active {
            self.effects.insert(effect);
        } else {
            self.effects.remove(&effect);
        }
    }
}

impl Default for VisualConfiguration {
    fn default() -> Self {
        Self {
            geometry: ShapeKind::Sphere,
            material: MaterialId::Reactive,
            camera_mode: CameraMode::Steady,
            effects: BTreeSet::from([Effect::Bloom]),
            shape_override: None,
        }
    }
}

/// Configuration for the [`Director`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Beats per bar
    pub beats_per_bar: u64,
    /// Bars per phrase
    pub bars_per_phrase: u64,
    /// The material/camera mixup runs on bars divisible by this
    pub mixup_every_bars: u64,
    /// Below this the mixup picks the cool looks
    pub cool_temperature: f32,
    /// Below this (and above cool) the mixup picks the warm looks
    pub warm_temperature: f32,
    /// Lower bound of [`TemperatureTier::Peak`]
    pub peak_threshold: f32,
    /// Lower bound of [`TemperatureTier::High`]
    pub high_threshold: f32,
    /// Lower bound of [`TemperatureTier::Mid`]
    pub mid_threshold: f32,
    /// Minimum overall energy for a glitch morph
    pub glitch_energy: f32,
    /// Chance of a glitch morph on a qualifying onset
    pub glitch_probability: f32,
    /// Geometries the phrase evaluator draws from (empty means every shape)
    pub geometries: Vec<ShapeKind>,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            beats_per_bar: 4,
            bars_per_phrase: 16,
            mixup_every_bars: 8,
            cool_temperature: 0.4,
            warm_temperature: 0.8,
            peak_threshold: 0.9,
            high_threshold: 0.7,
            mid_threshold: 0.3,
            glitch_energy: 0.8,
            glitch_probability: 0.3,
            geometries: Vec::new(),
        }
    }
}

/// Orchestration state machine
#[derive(Debug, Clone)]
pub struct Director {
    config: DirectorConfig,
    visuals: VisualConfiguration,
    prev_bar: u64,
    prev_phrase: u64,
    tier: Option<TemperatureTier>,
}

impl Director {
    /// Create a director with the default starting look
    pub fn new(config: DirectorConfig) -> Self {
        Self {
            config,
            visuals: VisualConfiguration::default(),
            prev_bar: 0,
            prev_phrase: 0,
            tier: None,
        }
    }

    /// Run both evaluators for one tick and return the resulting selections
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        features: &AudioFeatures,
        temperature: f32,
        rng: &mut R,
    ) -> &VisualConfiguration {
        self.update_glitch_morph(features, rng);
        self.evaluate_phrase(features.beat_count, temperature, rng);
        self.evaluate_tier(temperature);
        &self.visuals
    }

    /// Current selections
    pub fn visuals(&self) -> &VisualConfiguration {
        &self.visuals
    }

    /// Tier applied on the last tick
    pub fn tier(&self) -> Option<TemperatureTier> {
        self.tier
    }

    /// Current config
    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    fn update_glitch_morph<R: Rng + ?Sized>(&mut self, features: &AudioFeatures, rng: &mut R) {
        if !features.is_onset {
            return;
        }

        if features.energy > self.config.glitch_energy
            && rng.random::<f32>() < self.config.glitch_probability
        {
            let shape = ShapeKind::GLITCH[rng.random_range(0..ShapeKind::GLITCH.len())];
            debug!("Glitch morph -> {}", shape);
            self.visuals.shape_override = Some(shape);
        } else if self.visuals.shape_override.take().is_some() {
            debug!("Glitch morph cleared, back to {}", self.visuals.geometry);
        }
    }

    /// Bar mixup and phrase transition
    pub fn evaluate_phrase<R: Rng + ?Sized>(&mut self, beat_count: u64, temperature: f32, rng: &mut R) {
        let beats_per_bar = self.config.beats_per_bar.max(1);
        let bar = beat_count / beats_per_bar;
        let phrase = beat_count / (beats_per_bar * self.config.bars_per_phrase.max(1));

        if bar != self.prev_bar && bar % self.config.mixup_every_bars.max(1) == 0 {
            let coin = rng.random::<f32>() > 0.5;
            if temperature < self.config.cool_temperature {
                self.visuals.camera_mode = CameraMode::Steady;
                self.visuals.material = if coin {
                    MaterialId::Liquid
                } else {
                    MaterialId::Hologram
                };
            } else if temperature < self.config.warm_temperature {
                self.visuals.camera_mode = CameraMode::Kinetic;
                self.visuals.material = if coin {
                    MaterialId::Reactive
                } else {
                    MaterialId::CyberGrid
                };
            }
            debug!(
                "Bar {} mixup at temperature {:.2}: material={}, camera={}",
                bar,
                temperature,
                self.visuals.material.name(),
                self.visuals.camera_mode.name()
            );
            self.prev_bar = bar;
        }

        if phrase != self.prev_phrase {
            let previous = self.visuals.geometry;
            self.visuals.geometry = self.pick_geometry(previous, rng);
            self.visuals.camera_mode = CameraMode::Kinetic;
            self.prev_phrase = phrase;
            info!(
                "Phrase {}: geometry {} -> {}",
                phrase, previous, self.visuals.geometry
            );
        }
    }

    /// Uniform pick that never repeats `current` (rejection sampling)
    fn pick_geometry<R: Rng + ?Sized>(&self, current: ShapeKind, rng: &mut R) -> ShapeKind {
        let pool: &[ShapeKind] = if self.config.geometries.is_empty() {
            &ShapeKind::ALL
        } else {
            &self.config.geometries
        };

        // A pool without an alternative would never terminate
        if pool.iter().all(|&s| s == current) {
            return current;
        }

        loop {
            let next = pool[rng.random_range(0..pool.len())];
            if next != current {
                return next;
            }
        }
    }

    /// Temperature tier effects; runs every tick, after the phrase evaluator
    pub fn evaluate_tier(&mut self, temperature: f32) {
        let tier = TemperatureTier::classify(temperature, &self.config);
        let visuals = &mut self.visuals;

        match tier {
            TemperatureTier::Peak => {
                visuals.material = MaterialId::Glitch;
                visuals.camera_mode = CameraMode::Glitchy;
                visuals.set_effect(Effect::Bloom, true);
                visuals.set_effect(Effect::Afterimage, true);
                visuals.set_effect(Effect::Chromatic, true);
            }
            TemperatureTier::High => {
                visuals.set_effect(Effect::Chromatic, true);
                visuals.set_effect(Effect::Afterimage, false);
                if visuals.camera_mode == CameraMode::Steady {
                    visuals.camera_mode = CameraMode::Kinetic;
                }
            }
            TemperatureTier::Mid => {
                visuals.set_effect(Effect::Bloom, true);
                visuals.set_effect(Effect::Chromatic, false);
                visuals.set_effect(Effect::Afterimage, false);
            }
            TemperatureTier::Ambient => {
                visuals.camera_mode = CameraMode::Steady;
                visuals.set_effect(Effect::Bloom, false);
                visuals.set_effect(Effect::Chromatic, false);
                visuals.set_effect(Effect::Afterimage, false);
            }
        }

        if self.tier != Some(tier) {
            debug!(
                "Temperature tier {:?} -> {:?} at {:.3}",
                self.tier, tier, temperature
            );
            self.tier = Some(tier);
        }
    }
}

impl Default for Director {
    fn default() -> Self {
        Self::new(DirectorConfig::default())
    }
}
