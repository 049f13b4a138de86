//! Particle Engine - morphing point field
//!
//! Owns the live position buffer. Each tick the stored positions approach
//! the target shape; the audio deformations (twist, jitter, scan, onset
//! stress) are applied only to the emitted transforms, so they never
//! accumulate into the buffer.

use crate::audio::AudioFeatures;
use crate::shapes::{ShapeKind, ShapeLibrary};
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Position and uniform scale of one rendered particle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InstanceTransform {
    /// World position before the group rotation
    pub position: Vec3,
    /// Uniform scale
    pub scale: f32,
}

/// Configuration for the [`ParticleEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Fraction of the remaining distance covered per second
    pub morph_rate: f32,
    /// Twist angle per unit height per unit bass
    pub twist: f32,
    /// Jitter contribution of high energy
    pub jitter_high: f32,
    /// Jitter contribution of mid energy
    pub jitter_mid: f32,
    /// Jitter below this amplitude is skipped
    pub jitter_floor: f32,
    /// Angular frequency of the scan sweep (rad/s)
    pub scan_frequency: f32,
    /// Half travel of the scan sweep along X
    pub scan_amplitude: f32,
    /// Half width of the band the scan displaces
    pub scan_half_width: f32,
    /// Peak depth displacement of the scan at full energy
    pub scan_strength: f32,
    /// X stretch per unit energy on an onset
    pub onset_stretch: f32,
    /// Y squash per unit energy on an onset
    pub onset_squash: f32,
    /// Particle scale at zero energy
    pub max_scale: f32,
    /// Particle scale at full energy
    pub min_scale: f32,
    /// Scale multiplier on an onset tick
    pub onset_scale: f32,
    /// Particles visible at zero energy
    pub min_visible: usize,
    /// Base group spin about Y (rad/s)
    pub spin_base: f32,
    /// Extra Y spin per unit high energy
    pub spin_high: f32,
    /// Extra Y spin per unit temperature
    pub spin_temperature: f32,
    /// Group spin about Z (rad/s)
    pub spin_roll: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            morph_rate: 1.5,
            twist: 0.2,
            jitter_high: 0.2,
            jitter_mid: 0.1,
            jitter_floor: 0.01,
            scan_frequency: 2.0,
            scan_amplitude: 50.0,
            scan_half_width: 5.0,
            scan_strength: 2.0,
            onset_stretch: 0.1,
            onset_squash: 0.05,
            max_scale: 2.0,
            min_scale: 0.5,
            onset_scale: 1.2,
            min_visible: 20,
            spin_base: 0.1,
            spin_high: 0.2,
            spin_temperature: 0.3,
            spin_roll: 0.05,
        }
    }
}

/// Morphing particle field
#[derive(Debug, Clone)]
pub struct ParticleEngine {
    config: ParticleConfig,
    library: ShapeLibrary,
    positions: Vec<Vec3>,
    instances: Vec<InstanceTransform>,
    visible: usize,
    rotation: Vec3,
    shape: ShapeKind,
}

impl ParticleEngine {
    /// Create an engine with `count` particles, starting on the scatter cloud
    pub fn new<R: Rng + ?Sized>(count: usize, config: ParticleConfig, rng: &mut R) -> Self {
        let library = ShapeLibrary::new(count, rng);
        let positions = library.get(ShapeKind::Scatter).to_vec();

        debug!("ParticleEngine created with {} particles", count);

        Self {
            config,
            library,
            positions,
            instances: Vec::with_capacity(count),
            visible: 0,
            rotation: Vec3::ZERO,
            shape: ShapeKind::Scatter,
        }
    }

    /// Advance one tick and return the visible instance transforms.
    ///
    /// `elapsed` is the session clock in seconds and drives the scan sweep.
    /// `dt` is integrated as given: callers pass an already clamped delta
    /// (see [`Session::clamp_dt`](crate::Session::clamp_dt)). Negative or
    /// non-finite deltas are treated as 0.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        features: &AudioFeatures,
        temperature: f32,
        target: ShapeKind,
        elapsed: f64,
        rng: &mut R,
    ) -> &[InstanceTransform] {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if target != self.shape {
            debug!("Particles morphing {} -> {}", self.shape, target);
            self.shape = target;
        }

        let fraction = (dt * self.config.morph_rate).min(1.0);
        let reset = morph(&mut self.positions, self.library.get(target), fraction);
        if reset > 0 {
            warn!("Reset {} non-finite particle slots to {}", reset, target);
        }

        let count = self.positions.len();
        let energy = finite_unit(features.energy);
        self.visible = if count == 0 {
            0
        } else {
            let min = self.config.min_visible.min(count);
            let span = (count - min) as f32;
            (min + (span * energy).floor() as usize).min(count)
        };

        self.emit(features, elapsed, rng);

        let high = finite_unit(features.high);
        let temperature = finite_unit(temperature);
        let spin = self.config.spin_base
            + high * self.config.spin_high
            + temperature * self.config.spin_temperature;
        self.rotation.y = (self.rotation.y + dt * spin) % std::f32::consts::TAU;
        self.rotation.z = (self.rotation.z + dt * self.config.spin_roll) % std::f32::consts::TAU;

        &self.instances
    }

    /// Build the deformed transforms for the visible range
    fn emit<R: Rng + ?Sized>(&mut self, features: &AudioFeatures, elapsed: f64, rng: &mut R) {
        let c = &self.config;
        let bass = finite_unit(features.bass);
        let energy = finite_unit(features.energy);
        let vibration = finite_unit(features.high) * c.jitter_high + finite_unit(features.mid) * c.jitter_mid;
        let scan_pos = (elapsed * c.scan_frequency as f64).sin() as f32 * c.scan_amplitude;
        let twist = bass * c.twist;

        let mut scale = c.max_scale - (c.max_scale - c.min_scale) * energy;
        if features.is_onset {
            scale *= c.onset_scale;
        }

        self.instances.clear();
        for &stored in &self.positions[..self.visible] {
            let mut p = stored;

            // Height-dependent shear about Y
            let (s, co) = (p.y * twist).sin_cos();
            p = Vec3::new(p.x * co - p.z * s, p.y, p.x * s + p.z * co);

            if vibration > c.jitter_floor {
                p += Vec3::new(
                    rng.random::<f32>() - 0.5,
                    rng.random::<f32>() - 0.5,
                    rng.random::<f32>() - 0.5,
                ) * vibration;
            }

            let scan_dist = (p.x - scan_pos).abs();
            if scan_dist < c.scan_half_width {
                p.z += (1.0 - scan_dist / c.scan_half_width) * c.scan_strength * energy;
            }

            if features.is_onset {
                p.x *= 1.0 + energy * c.onset_stretch;
                p.y *= 1.0 - energy * c.onset_squash;
            }

            if !p.is_finite() {
                p = stored;
            }

            self.instances.push(InstanceTransform { position: p, scale });
        }
    }

    /// Stored (undeformed) positions
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Transforms emitted on the last tick
    pub fn instances(&self) -> &[InstanceTransform] {
        &self.instances
    }

    /// Number of particles emitted on the last tick
    pub fn visible_count(&self) -> usize {
        self.visible
    }

    /// Total particle count
    pub fn count(&self) -> usize {
        self.positions.len()
    }

    /// Group rotation (Euler XYZ, radians)
    pub fn group_rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Shape currently morphed toward
    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    /// Precomputed target buffers
    pub fn library(&self) -> &ShapeLibrary {
        &self.library
    }
}

/// Clamp into [0, 1], mapping non-finite input to 0
#[inline]
fn finite_unit(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[inline]
fn morph_slot(p: &mut Vec3, target: Vec3, fraction: f32) -> bool {
    *p += (target - *p) * fraction;
    if p.is_finite() {
        false
    } else {
        *p = target;
        true
    }
}

/// Move every slot toward its target sample. Returns the number of slots
/// that went non-finite and were reset.
#[cfg(not(feature = "parallel"))]
fn morph(positions: &mut [Vec3], target: &[Vec3], fraction: f32) -> usize {
    positions
        .iter_mut()
        .zip(target)
        .map(|(p, t)| morph_slot(p, *t, fraction))
        .filter(|&reset| reset)
        .count()
}

/// Move every slot toward its target sample. Returns the number of slots
/// that went non-finite and were reset.
#[cfg(feature = "parallel")]
fn morph(positions: &mut [Vec3], target: &[Vec3], fraction: f32) -> usize {
    use rayon::prelude::*;

    positions
        .par_iter_mut()
        .zip(target.par_iter())
        .map(|(p, t)| morph_slot(p, *t, fraction))
        .filter(|&reset| reset)
        .count()
}
