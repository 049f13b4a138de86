//! Session - one audio-reactive pipeline driven by explicit ticks
//!
//! Owns every stateful component plus the random source. The host calls
//! [`Session::tick`] once per frame; nothing is scheduled implicitly and
//! there is no global state, so independent sessions can run side by side.

use crate::audio::{AudioFeatures, FeatureExtractor, SpectrumSource};
use crate::camera::CameraEngine;
use crate::config::EngineConfig;
use crate::director::{Director, VisualConfiguration};
use crate::particles::ParticleEngine;
use crate::render::{FrameSummary, RenderSink};
use crate::stage::Stage;
use crate::temperature::TemperatureEstimator;
use crate::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

/// A running choreography session
pub struct Session<R: Rng = StdRng> {
    config: EngineConfig,
    rng: R,
    extractor: FeatureExtractor,
    temperature: TemperatureEstimator,
    director: Director,
    particles: ParticleEngine,
    camera: CameraEngine,
    stage: Stage,
    features: AudioFeatures,
    elapsed: f64,
    frame: u64,
}

impl Session<StdRng> {
    /// Create a session, seeded from `config.seed` or from the OS
    pub fn new(config: EngineConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(config, rng)
    }

    /// Create a reproducible session
    pub fn with_seed(config: EngineConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Session<R> {
    /// Create a session around an injected random source
    pub fn with_rng(config: EngineConfig, mut rng: R) -> Result<Self> {
        config.validate()?;

        let particles =
            ParticleEngine::new(config.particle_count, config.particles.clone(), &mut rng);

        info!(
            "Session started: {} particles, max dt {}s, seed {:?}",
            config.particle_count, config.max_delta_s, config.seed
        );

        Ok(Self {
            extractor: FeatureExtractor::new(config.extractor.clone()),
            temperature: TemperatureEstimator::new(config.temperature.clone()),
            director: Director::new(config.director.clone()),
            camera: CameraEngine::new(config.camera.clone()),
            stage: Stage::new(config.stage.clone()),
            particles,
            features: AudioFeatures::default(),
            elapsed: 0.0,
            frame: 0,
            rng,
            config,
        })
    }

    /// Sanitize a host delta: non-finite or negative becomes 0, anything
    /// above `max_delta_s` is clamped.
    pub fn clamp_dt(&self, dt: f32) -> f32 {
        if !dt.is_finite() || dt < 0.0 {
            return 0.0;
        }
        dt.min(self.config.max_delta_s)
    }

    /// Run the whole pipeline once.
    ///
    /// Reads one spectrum from `source`, updates every component in data-flow
    /// order and pushes the results into `sink`. Never fails and never blocks.
    pub fn tick<S, K>(&mut self, dt: f32, source: &mut S, sink: &mut K) -> FrameSummary
    where
        S: SpectrumSource + ?Sized,
        K: RenderSink + ?Sized,
    {
        if !dt.is_finite() || dt < 0.0 {
            warn!("Ignoring invalid frame delta {}", dt);
        }
        let dt = self.clamp_dt(dt);
        self.elapsed += dt as f64;
        self.frame += 1;
        let now = self.elapsed;

        // Audio
        self.features = match source.read_spectrum(now) {
            Some(frame) => {
                let timestamp = if frame.timestamp.is_finite() {
                    frame.timestamp
                } else {
                    now
                };
                self.extractor.process(Some(frame.bins), timestamp)
            }
            None => self.extractor.process(None, now),
        };
        let features = self.features;

        let temperature = self.temperature.update(&features);

        // Orchestration
        let visuals = self
            .director
            .update(&features, temperature, &mut self.rng)
            .clone();

        // Motion
        self.particles.tick(
            dt,
            &features,
            temperature,
            visuals.target_shape(),
            now,
            &mut self.rng,
        );
        sink.submit_instances(self.particles.instances(), self.particles.group_rotation());

        self.camera.set_mode(visuals.camera_mode);
        let pose = self
            .camera
            .tick(dt, &features, temperature, now, &mut self.rng);
        sink.submit_camera(&pose);

        let uniforms = self.stage.tick(dt, &features, temperature, &visuals, now);
        sink.submit_uniforms(&uniforms);

        let summary = FrameSummary {
            frame: self.frame,
            elapsed: now,
            dt,
            features,
            temperature,
            tier: self.director.tier(),
            visible_count: self.particles.visible_count(),
            group_rotation: self.particles.group_rotation(),
            camera: pose,
            visuals,
        };
        sink.end_frame(&summary);
        summary
    }

    /// Features from the last tick
    pub fn features(&self) -> &AudioFeatures {
        &self.features
    }

    /// Current temperature
    pub fn temperature(&self) -> f32 {
        self.temperature.temperature()
    }

    /// Force the temperature, e.g. to start a session mid-set
    pub fn set_temperature(&mut self, temperature: f32) {
        self.temperature.set_temperature(temperature);
    }

    /// Director selections
    pub fn visuals(&self) -> &VisualConfiguration {
        self.director.visuals()
    }

    /// The Director
    pub fn director(&self) -> &Director {
        &self.director
    }

    /// The particle field
    pub fn particles(&self) -> &ParticleEngine {
        &self.particles
    }

    /// The camera
    pub fn camera(&self) -> &CameraEngine {
        &self.camera
    }

    /// Session clock in seconds
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Ticks run so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Config the session was built from
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
