//! Critically damped smoothing
//!
//! Frame-rate independent exponential approach toward a target with a
//! carried velocity. Every smoothed quantity in the engine (camera pose,
//! FOV, shake, stage uniforms) goes through [`Damped`] or [`Damped3`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Smallest accepted smooth time
pub const MIN_SMOOTH_TIME: f32 = 0.0001;

/// Values this close to the target snap onto it
pub const SNAP_EPSILON: f32 = 0.001;

/// One damping step. Returns the new value and writes the new velocity.
///
/// Never overshoots the target. `dt <= 0` leaves both value and velocity
/// untouched.
pub fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    if dt <= 0.0 || !dt.is_finite() {
        return current;
    }

    let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    // Crossed the target: clamp onto it
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = (output - target) / dt;
    }

    if (output - target).abs() < SNAP_EPSILON {
        output = target;
        *velocity = 0.0;
    }

    output
}

/// A damped scalar
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Damped {
    /// Current value
    pub value: f32,
    /// Carried velocity
    pub velocity: f32,
}

impl Damped {
    /// Start at rest on `value`
    pub fn new(value: f32) -> Self {
        Self {
            value,
            velocity: 0.0,
        }
    }

    /// Advance toward `target` and return the new value
    pub fn step(&mut self, target: f32, smooth_time: f32, dt: f32) -> f32 {
        self.value = smooth_damp(self.value, target, &mut self.velocity, smooth_time, dt);
        self.value
    }

    /// Jump to `value` and drop the velocity
    pub fn reset(&mut self, value: f32) {
        self.value = value;
        self.velocity = 0.0;
    }
}

/// A damped vector, smoothed per component
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Damped3 {
    /// Current value
    pub value: Vec3,
    /// Carried velocity
    pub velocity: Vec3,
}

impl Damped3 {
    /// Start at rest on `value`
    pub fn new(value: Vec3) -> Self {
        Self {
            value,
            velocity: Vec3::ZERO,
        }
    }

    /// Advance toward `target` and return the new value
    pub fn step(&mut self, target: Vec3, smooth_time: f32, dt: f32) -> Vec3 {
        for axis in 0..3 {
            let mut v = self.velocity[axis];
            self.value[axis] = smooth_damp(self.value[axis], target[axis], &mut v, smooth_time, dt);
            self.velocity[axis] = v;
        }
        self.value
    }

    /// Jump to `value` and drop the velocity
    pub fn reset(&mut self, value: Vec3) {
        self.value = value;
        self.velocity = Vec3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converges_without_overshoot() {
        let mut d = Damped::new(0.0);
        let mut prev = 0.0;
        for _ in 0..600 {
            let v = d.step(10.0, 0.3, 1.0 / 60.0);
            assert!(v <= 10.0);
            assert!(v >= prev);
            prev = v;
        }
        assert_eq!(d.value, 10.0);
        assert_eq!(d.velocity, 0.0);
    }

    #[test]
    fn test_converges_from_above() {
        let mut d = Damped::new(50.0);
        for _ in 0..600 {
            let v = d.step(-5.0, 0.5, 1.0 / 60.0);
            assert!(v >= -5.0);
        }
        assert_eq!(d.value, -5.0);
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut d = Damped::new(1.0);
        d.velocity = 3.0;
        d.step(100.0, 0.2, 0.0);
        assert_eq!(d.value, 1.0);
        assert_eq!(d.velocity, 3.0);
    }

    #[test]
    fn test_tiny_smooth_time_is_clamped() {
        let mut d = Damped::new(0.0);
        let v = d.step(1.0, 0.0, 1.0 / 60.0);
        assert!(v.is_finite());
        assert_eq!(v, 1.0);
    }

    #[test]
    fn test_large_dt_lands_on_target() {
        let mut d = Damped::new(0.0);
        let v = d.step(4.0, 0.8, 10.0);
        assert!(v <= 4.0);
        assert!((v - 4.0).abs() < 0.05, "landed at {}", v);
    }

    #[test]
    fn test_vector_components_independent() {
        let mut d = Damped3::new(Vec3::ZERO);
        d.step(Vec3::new(10.0, 0.0, -10.0), 0.5, 1.0 / 60.0);
        assert!(d.value.x > 0.0);
        assert_eq!(d.value.y, 0.0);
        assert!(d.value.z < 0.0);
        assert!((d.value.x + d.value.z).abs() < 1e-5);
    }
}
