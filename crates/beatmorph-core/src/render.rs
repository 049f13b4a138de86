//! Rendering boundary
//!
//! The core never draws. Once per tick the [`Session`](crate::Session)
//! pushes instances, the camera pose and the stage uniforms into a
//! [`RenderSink`], then closes the frame with a [`FrameSummary`].

use crate::audio::AudioFeatures;
use crate::camera::CameraPose;
use crate::director::{TemperatureTier, VisualConfiguration};
use crate::particles::InstanceTransform;
use crate::stage::StageUniforms;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Per-tick digest of the whole pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    /// Tick index since session start
    pub frame: u64,
    /// Session clock after this tick, seconds
    pub elapsed: f64,
    /// Clamped delta used by this tick
    pub dt: f32,
    /// Extractor output
    pub features: AudioFeatures,
    /// Temperature after this tick
    pub temperature: f32,
    /// Tier the Director applied
    pub tier: Option<TemperatureTier>,
    /// Director selections
    pub visuals: VisualConfiguration,
    /// Particles emitted
    pub visible_count: usize,
    /// Particle group rotation (Euler XYZ, radians)
    pub group_rotation: Vec3,
    /// Camera pose
    pub camera: CameraPose,
}

/// Rendering collaborator
///
/// Implementations must not block; every call happens on the tick thread.
pub trait RenderSink {
    /// Visible particle transforms and the rotation of the whole group
    fn submit_instances(&mut self, instances: &[InstanceTransform], group_rotation: Vec3);

    /// Camera pose for this frame
    fn submit_camera(&mut self, pose: &CameraPose);

    /// Shader, light and post-processing inputs for this frame
    fn submit_uniforms(&mut self, uniforms: &StageUniforms);

    /// Called last, once per tick
    fn end_frame(&mut self, _summary: &FrameSummary) {}
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn submit_instances(&mut self, _instances: &[InstanceTransform], _group_rotation: Vec3) {}
    fn submit_camera(&mut self, _pose: &CameraPose) {}
    fn submit_uniforms(&mut self, _uniforms: &StageUniforms) {}
}

impl<S: RenderSink + ?Sized> RenderSink for &mut S {
    fn submit_instances(&mut self, instances: &[InstanceTransform], group_rotation: Vec3) {
        (**self).submit_instances(instances, group_rotation);
    }

    fn submit_camera(&mut self, pose: &CameraPose) {
        (**self).submit_camera(pose);
    }

    fn submit_uniforms(&mut self, uniforms: &StageUniforms) {
        (**self).submit_uniforms(uniforms);
    }

    fn end_frame(&mut self, summary: &FrameSummary) {
        (**self).end_frame(summary);
    }
}
