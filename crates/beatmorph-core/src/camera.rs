//! Camera Engine - procedural camera motion
//!
//! Each [`CameraMode`] is an analytic path in time built from drift noise.
//! The camera never jumps onto that path: position, look target, FOV, roll
//! and the onset shake all go through the shared damping law, so a mode
//! switch only changes where the camera is heading.

use crate::audio::AudioFeatures;
use crate::damping::{Damped, Damped3};
use crate::director::CameraMode;
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Low-frequency composite sine used in place of procedural noise
#[inline]
pub fn drift(t: f32, seed: f32) -> f32 {
    (t * 0.2 + seed).sin() * 0.6 + (t * 0.05 + seed * 2.0).sin() * 0.4
}

/// Camera state handed to the rendering collaborator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Eye position
    pub position: Vec3,
    /// Point looked at
    pub look_at: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Roll about the view axis in radians
    pub roll: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 45.0),
            look_at: Vec3::ZERO,
            fov: 45.0,
            roll: 0.0,
        }
    }
}

/// Configuration for the [`CameraEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Resting field of view in degrees
    pub base_fov: f32,
    /// FOV added per unit high energy on an onset
    pub fov_pulse: f32,
    /// FOV smooth time
    pub fov_smooth: f32,
    /// Shake extent per unit energy
    pub shake_strength: f32,
    /// Shake decay smooth time
    pub shake_smooth: f32,
    /// Look target smooth time
    pub look_smooth: f32,
    /// Slow tilt amplitude in radians
    pub roll_amplitude: f32,
    /// Full width of the random onset tilt in radians
    pub roll_kick: f32,
    /// Roll smooth time
    pub roll_smooth: f32,
    /// Smooth time in steady mode
    pub steady_smooth: f32,
    /// Smooth time in kinetic mode
    pub kinetic_smooth: f32,
    /// Smooth time in glitchy mode
    pub glitchy_smooth: f32,
    /// Smooth time in dolly-zoom mode
    pub dolly_smooth: f32,
    /// Smooth time in orbital-chaos mode
    pub orbital_smooth: f32,
    /// Smooth time in macro mode
    pub macro_smooth: f32,
    /// Subject distance at temperature 0
    pub cool_distance: f32,
    /// Subject distance at temperature 1; the mode paths are scaled by
    /// `lerp(cool, hot, temperature) / cool`
    pub hot_distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            base_fov: 45.0,
            fov_pulse: 20.0,
            fov_smooth: 0.2,
            shake_strength: 2.0,
            shake_smooth: 0.1,
            look_smooth: 1.0,
            roll_amplitude: 0.1,
            roll_kick: 0.2,
            roll_smooth: 0.5,
            steady_smooth: 0.8,
            kinetic_smooth: 1.2,
            glitchy_smooth: 0.35,
            dolly_smooth: 1.0,
            orbital_smooth: 0.6,
            macro_smooth: 1.5,
            cool_distance: 40.0,
            hot_distance: 15.0,
        }
    }
}

impl CameraConfig {
    /// Position smooth time for `mode`
    pub fn smooth_time(&self, mode: CameraMode) -> f32 {
        match mode {
            CameraMode::Steady => self.steady_smooth,
            CameraMode::Kinetic => self.kinetic_smooth,
            CameraMode::Glitchy => self.glitchy_smooth,
            CameraMode::DollyZoom => self.dolly_smooth,
            CameraMode::OrbitalChaos => self.orbital_smooth,
            CameraMode::Macro => self.macro_smooth,
        }
    }

    /// Factor applied to the mode path at `temperature`. Hotter tracks pull
    /// the camera in toward the subject.
    pub fn pull_in(&self, temperature: f32) -> f32 {
        let temperature = if temperature.is_finite() {
            temperature.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let distance = self.cool_distance + (self.hot_distance - self.cool_distance) * temperature;
        distance / self.cool_distance.max(1e-3)
    }
}

/// Dolly-zoom subject distance at which the FOV equals the base FOV
const DOLLY_REFERENCE_DISTANCE: f32 = 40.0;

/// Target eye position for `mode` at time `t`
pub fn mode_target(mode: CameraMode, t: f32) -> Vec3 {
    match mode {
        CameraMode::Steady => Vec3::new(
            drift(t * 0.5, 0.0) * 15.0,
            drift(t * 0.5, 10.0) * 8.0,
            45.0 + drift(t * 0.3, 20.0) * 10.0,
        ),
        CameraMode::Kinetic => {
            let rad = 30.0 + (t * 0.1).sin() * 10.0;
            let orbit = t * 0.2;
            Vec3::new(
                orbit.sin() * rad,
                10.0 + drift(t, 5.0) * 10.0,
                orbit.cos() * rad,
            )
        }
        CameraMode::Glitchy => {
            let rad = 25.0;
            let orbit = t * 0.5;
            Vec3::new(orbit.sin() * rad, 20.0 + (t * 2.0).sin() * 10.0, orbit.cos() * rad)
        }
        CameraMode::DollyZoom => Vec3::new(
            drift(t * 0.3, 7.0) * 3.0,
            drift(t * 0.3, 8.0) * 2.0,
            dolly_distance(t),
        ),
        CameraMode::OrbitalChaos => {
            let (outer, inner) = (t * 0.4, t * 1.3);
            Vec3::new(
                outer.sin() * 28.0 + inner.sin() * 8.0,
                (t * 0.7).sin() * 12.0 + (t * 1.1).cos() * 4.0,
                outer.cos() * 28.0 + inner.cos() * 8.0,
            )
        }
        CameraMode::Macro => Vec3::new(
            drift(t * 0.2, 30.0) * 3.0,
            drift(t * 0.2, 40.0) * 2.0,
            12.0 + drift(t * 0.1, 50.0) * 3.0,
        ),
    }
}

/// Dolly distance, oscillating between 20 and 60
fn dolly_distance(t: f32) -> f32 {
    DOLLY_REFERENCE_DISTANCE + (t * 0.25).sin() * 20.0
}

/// FOV that keeps a subject framed at `distance` the way `base_fov` frames
/// it at the reference distance
fn counter_zoom_fov(base_fov: f32, distance: f32) -> f32 {
    let half_height = DOLLY_REFERENCE_DISTANCE * (base_fov.to_radians() * 0.5).tan();
    (2.0 * (half_height / distance.max(1e-3)).atan()).to_degrees()
}

/// Damped procedural camera
#[derive(Debug, Clone)]
pub struct CameraEngine {
    config: CameraConfig,
    mode: CameraMode,
    position: Damped3,
    look: Damped3,
    shake: Damped3,
    fov: Damped,
    roll: Damped,
}

impl CameraEngine {
    /// Create a camera at the default pose in steady mode
    pub fn new(config: CameraConfig) -> Self {
        let pose = CameraPose {
            fov: config.base_fov,
            ..Default::default()
        };
        Self {
            mode: CameraMode::Steady,
            position: Damped3::new(pose.position),
            look: Damped3::new(pose.look_at),
            shake: Damped3::default(),
            fov: Damped::new(pose.fov),
            roll: Damped::new(pose.roll),
            config,
        }
    }

    /// Select the path the camera heads toward
    pub fn set_mode(&mut self, mode: CameraMode) {
        if mode != self.mode {
            debug!("Camera mode {} -> {}", self.mode.name(), mode.name());
            self.mode = mode;
        }
    }

    /// Current mode
    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// Advance one tick and return the new pose.
    ///
    /// `dt` is integrated as given: callers pass an already clamped delta
    /// (see [`Session::clamp_dt`](crate::Session::clamp_dt)). Negative or
    /// non-finite deltas are treated as 0.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        features: &AudioFeatures,
        temperature: f32,
        elapsed: f64,
        rng: &mut R,
    ) -> CameraPose {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let t = elapsed as f32;
        let c = &self.config;
        let energy = if features.energy.is_finite() {
            features.energy.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let high = if features.high.is_finite() {
            features.high.clamp(0.0, 1.0)
        } else {
            0.0
        };

        // Onset shake: one-shot offset that damps back to rest
        if features.is_onset {
            let extent = c.shake_strength * energy;
            self.shake.value = Vec3::new(
                rng.random::<f32>() - 0.5,
                rng.random::<f32>() - 0.5,
                rng.random::<f32>() - 0.5,
            ) * extent;
        }
        self.shake.step(Vec3::ZERO, c.shake_smooth, dt);

        // Macro is already close to the subject
        let pull = match self.mode {
            CameraMode::Macro => 1.0,
            _ => c.pull_in(temperature),
        };
        let target = mode_target(self.mode, t) * pull + self.shake.value;
        self.position.step(target, c.smooth_time(self.mode), dt);

        let look_target = Vec3::new(drift(t * 0.2, 100.0) * 5.0, drift(t * 0.2, 200.0) * 5.0, 0.0);
        self.look.step(look_target, c.look_smooth, dt);

        let mut roll_target = (t * 0.2).sin() * c.roll_amplitude;
        if features.is_onset {
            roll_target += (rng.random::<f32>() - 0.5) * c.roll_kick;
        }
        self.roll.step(roll_target, c.roll_smooth, dt);

        let base_fov = match self.mode {
            CameraMode::DollyZoom => counter_zoom_fov(c.base_fov, self.position.value.z),
            _ => c.base_fov,
        };
        if features.is_onset {
            self.fov.value = self.fov.value.max(base_fov + high * c.fov_pulse);
        }
        self.fov.step(base_fov, c.fov_smooth, dt);

        self.pose()
    }

    /// Current pose
    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position.value,
            look_at: self.look.value,
            fov: self.fov.value,
            roll: self.roll.value,
        }
    }

    /// Current config
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }
}

impl Default for CameraEngine {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_drift_bounds() {
        for i in 0..1000 {
            let v = drift(i as f32 * 0.37, (i % 7) as f32);
            assert!(v.abs() <= 1.0 + 1e-6);
        }
        assert!((drift(0.0, 0.0)).abs() < 1e-6);
    }

    #[test]
    fn test_mode_targets_finite() {
        for mode in CameraMode::ALL {
            for i in 0..200 {
                assert!(mode_target(mode, i as f32 * 0.5).is_finite());
            }
        }
    }

    #[test]
    fn test_glitchy_orbit_radius() {
        for i in 0..50 {
            let p = mode_target(CameraMode::Glitchy, i as f32 * 0.3);
            assert!(((p.x * p.x + p.z * p.z).sqrt() - 25.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_dolly_range_and_counter_zoom() {
        for i in 0..100 {
            let z = dolly_distance(i as f32 * 0.4);
            assert!((20.0 - 1e-3..=60.0 + 1e-3).contains(&z));
        }
        assert!((counter_zoom_fov(45.0, 40.0) - 45.0).abs() < 1e-3);
        // Closer subject needs a wider lens
        assert!(counter_zoom_fov(45.0, 20.0) > 45.0);
        assert!(counter_zoom_fov(45.0, 60.0) < 45.0);
    }

    #[test]
    fn test_mode_switch_is_continuous() {
        let mut rng = StdRng::seed_from_u64(31);
        let mut camera = CameraEngine::default();
        let quiet = AudioFeatures::default();
        let mut t = 0.0;
        for _ in 0..120 {
            t += DT as f64;
            camera.tick(DT, &quiet, 0.0, t, &mut rng);
        }
        let before = camera.pose().position;
        camera.set_mode(CameraMode::Glitchy);
        t += DT as f64;
        let after = camera.tick(DT, &quiet, 0.0, t, &mut rng).position;
        // The glitchy path is far away but one tick only moves a little
        assert!((after - before).length() < 2.0);
    }

    #[test]
    fn test_converges_to_frozen_target() {
        let mut rng = StdRng::seed_from_u64(32);
        let mut camera = CameraEngine::default();
        camera.set_mode(CameraMode::Kinetic);
        let quiet = AudioFeatures::default();
        for _ in 0..2000 {
            camera.tick(DT, &quiet, 0.0, 10.0, &mut rng);
        }
        let target = mode_target(CameraMode::Kinetic, 10.0);
        assert!((camera.pose().position - target).length() < 0.01);
    }

    #[test]
    fn test_fov_pulse_and_decay() {
        let mut rng = StdRng::seed_from_u64(33);
        let mut camera = CameraEngine::default();
        let kick = AudioFeatures {
            high: 1.0,
            energy: 1.0,
            is_onset: true,
            ..Default::default()
        };
        let pose = camera.tick(DT, &kick, 0.0, 0.0, &mut rng);
        assert!(pose.fov > 55.0, "fov was {}", pose.fov);

        let quiet = AudioFeatures::default();
        for _ in 0..120 {
            camera.tick(DT, &quiet, 0.0, 0.0, &mut rng);
        }
        assert_eq!(camera.pose().fov, 45.0);
    }

    #[test]
    fn test_shake_decays() {
        let mut rng = StdRng::seed_from_u64(34);
        let mut camera = CameraEngine::default();
        let kick = AudioFeatures {
            energy: 1.0,
            is_onset: true,
            ..Default::default()
        };
        camera.tick(DT, &kick, 0.0, 0.0, &mut rng);
        let quiet = AudioFeatures::default();
        for _ in 0..60 {
            camera.tick(DT, &quiet, 0.0, 0.0, &mut rng);
        }
        assert_eq!(camera.shake.value, Vec3::ZERO);
    }

    #[test]
    fn test_zero_dt_holds_pose() {
        let mut rng = StdRng::seed_from_u64(35);
        let mut camera = CameraEngine::default();
        let before = camera.pose();
        let after = camera.tick(0.0, &AudioFeatures::default(), 0.0, 5.0, &mut rng);
        assert_eq!(before, after);
        let after = camera.tick(f32::NAN, &AudioFeatures::default(), 0.0, 5.0, &mut rng);
        assert_eq!(before, after);
    }

    #[test]
    fn test_pull_in_factor() {
        let config = CameraConfig::default();
        assert_eq!(config.pull_in(0.0), 1.0);
        assert!((config.pull_in(1.0) - 0.375).abs() < 1e-6);
        assert!((config.pull_in(0.5) - 27.5 / 40.0).abs() < 1e-6);
        assert_eq!(config.pull_in(f32::NAN), 1.0);
        assert!((config.pull_in(7.0) - 0.375).abs() < 1e-6);
    }

    #[test]
    fn test_hot_track_settles_closer() {
        let quiet = AudioFeatures::default();
        let settle = |temperature: f32| {
            let mut rng = StdRng::seed_from_u64(36);
            let mut camera = CameraEngine::default();
            for _ in 0..2000 {
                camera.tick(DT, &quiet, temperature, 10.0, &mut rng);
            }
            camera.pose().position
        };

        let cold = settle(0.0);
        let hot = settle(1.0);
        let target = mode_target(CameraMode::Steady, 10.0);
        assert!((cold - target).length() < 0.01);
        assert!((hot - target * 0.375).length() < 0.01);
        assert!(hot.length() < cold.length());
    }
}
