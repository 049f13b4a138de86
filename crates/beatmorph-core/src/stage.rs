//! Stage uniforms - lights, shader inputs and post parameters
//!
//! Everything the rendering collaborator needs besides instances and the
//! camera: damped material uniforms, ambient/strobe/orbiting lights and
//! the post-processing scalars, plus the Director's material and effects.

use crate::audio::AudioFeatures;
use crate::damping::{Damped, Damped3};
use crate::director::{Effect, MaterialId, VisualConfiguration};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::f32::consts::PI;

/// Convert a `0xRRGGBB` color to unit RGB
pub fn rgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32,
        ((hex >> 8) & 0xff) as f32,
        (hex & 0xff) as f32,
    ) / 255.0
}

/// Configuration for the [`Stage`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Smooth time of the temperature uniform
    pub temperature_smooth: f32,
    /// Smooth time of the low/high band uniforms
    pub band_smooth: f32,
    /// Ambient color at temperature 0 (`0xRRGGBB`)
    pub ambient_cool: u32,
    /// Ambient color at temperature 1 (`0xRRGGBB`)
    pub ambient_hot: u32,
    /// Smooth time of the ambient color
    pub ambient_smooth: f32,
    /// Strobe intensity set on an onset
    pub strobe_peak: f32,
    /// Strobe decay smooth time
    pub strobe_smooth: f32,
    /// Point light intensity at zero high energy
    pub light_base: f32,
    /// Point light intensity per unit high energy
    pub light_gain: f32,
    /// Point light smooth time
    pub light_smooth: f32,
    /// Chromatic offset per unit high energy
    pub chromatic_gain: f32,
    /// Overall energy above which an onset pixelates the frame
    pub pixelation_energy: f32,
    /// Pixel size used when pixelating
    pub pixelation_size: f32,
    /// Noise opacity at zero energy
    pub noise_base: f32,
    /// Noise opacity per unit energy
    pub noise_gain: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            temperature_smooth: 0.5,
            band_smooth: 0.1,
            ambient_cool: 0x001133,
            ambient_hot: 0x330500,
            ambient_smooth: 0.5,
            strobe_peak: 20.0,
            strobe_smooth: 0.2,
            light_base: 2.0,
            light_gain: 10.0,
            light_smooth: 0.1,
            chromatic_gain: 0.01,
            pixelation_energy: 0.85,
            pixelation_size: 10.0,
            noise_base: 0.05,
            noise_gain: 0.15,
        }
    }
}

/// Shader inputs for audio-driven coloring
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialUniforms {
    /// Session clock in seconds
    pub time: f32,
    /// Damped temperature
    pub temperature: f32,
    /// Damped bass energy
    pub low: f32,
    /// Damped high energy
    pub high: f32,
}

/// A colored point light orbiting the field
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointLight {
    /// World position
    pub position: Vec3,
    /// Intensity
    pub intensity: f32,
}

/// Light rig state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StageLighting {
    /// Ambient RGB in [0, 1]
    pub ambient_color: Vec3,
    /// Ambient intensity
    pub ambient_intensity: f32,
    /// Onset strobe intensity
    pub strobe: f32,
    /// The two orbiting lights, half an orbit apart
    pub point_lights: [PointLight; 2],
}

/// Post-processing parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostParams {
    /// Chromatic aberration offset
    pub chromatic_offset: f32,
    /// Pixel size, 0 disables pixelation
    pub pixelation: f32,
    /// Film noise opacity
    pub noise_opacity: f32,
    /// Director's material
    pub material: MaterialId,
    /// Director's enabled effects
    pub effects: BTreeSet<Effect>,
}

/// Everything the renderer needs besides instances and the camera
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StageUniforms {
    /// Shader inputs
    pub material: MaterialUniforms,
    /// Light rig
    pub lighting: StageLighting,
    /// Post-processing
    pub post: PostParams,
}

/// Damped stage state
#[derive(Debug, Clone)]
pub struct Stage {
    config: StageConfig,
    temperature: Damped,
    low: Damped,
    high: Damped,
    ambient: Damped3,
    strobe: Damped,
    lights: [Damped; 2],
}

impl Stage {
    /// Create a cold, dark stage
    pub fn new(config: StageConfig) -> Self {
        let ambient = Damped3::new(rgb(config.ambient_cool));
        Self {
            temperature: Damped::default(),
            low: Damped::default(),
            high: Damped::default(),
            ambient,
            strobe: Damped::default(),
            lights: [Damped::new(config.light_base), Damped::new(config.light_base)],
            config,
        }
    }

    /// Advance one tick
    pub fn tick(
        &mut self,
        dt: f32,
        features: &AudioFeatures,
        temperature: f32,
        visuals: &VisualConfiguration,
        elapsed: f64,
    ) -> StageUniforms {
        let c = &self.config;
        let time = elapsed as f32;

        let temperature = self.temperature.step(temperature, c.temperature_smooth, dt);
        let low = self.low.step(features.bass, c.band_smooth, dt);
        let high = self.high.step(features.high, c.band_smooth, dt);

        let ambient_target = rgb(c.ambient_cool).lerp(rgb(c.ambient_hot), temperature);
        let ambient_color = self.ambient.step(ambient_target, c.ambient_smooth, dt);

        if features.is_onset {
            self.strobe.value = c.strobe_peak;
        }
        let strobe = self.strobe.step(0.0, c.strobe_smooth, dt);

        let light_target = c.light_base + features.high * c.light_gain;
        let mut point_lights = [PointLight::default(); 2];
        for (i, (light, damped)) in point_lights.iter_mut().zip(&mut self.lights).enumerate() {
            let offset = i as f32 * PI;
            light.position = Vec3::new(
                (time * 0.5 + offset).sin() * 20.0,
                (time * 0.3 + offset).sin() * 10.0,
                (time * 0.5 + offset).cos() * 20.0,
            );
            light.intensity = damped.step(light_target, c.light_smooth, dt);
        }

        let pixelation = if features.is_onset && features.energy > c.pixelation_energy {
            c.pixelation_size
        } else {
            0.0
        };

        StageUniforms {
            material: MaterialUniforms {
                time,
                temperature,
                low,
                high,
            },
            lighting: StageLighting {
                ambient_color,
                ambient_intensity: 0.5 + temperature * 0.5,
                strobe,
                point_lights,
            },
            post: PostParams {
                chromatic_offset: features.high * c.chromatic_gain,
                pixelation,
                noise_opacity: c.noise_base + features.energy * c.noise_gain,
                material: visuals.material,
                effects: visuals.effects.clone(),
            },
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(StageConfig::default())
    }
}
