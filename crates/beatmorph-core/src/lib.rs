//! beatmorph Core - Audio-reactive choreography engine
//!
//! This crate contains the signal-processing and choreography core, including:
//! - Onset detection and band-energy smoothing
//! - Temperature (sustained intensity) estimation
//! - Phrase/tier orchestration of the visual configuration
//! - Procedural particle shapes and the morphing particle field
//! - Procedural camera motion
//!
//! Everything runs inside one [`Session`], driven by an explicit `tick(dt)`
//! from the host. Audio capture and rendering are external collaborators,
//! reached through the [`SpectrumSource`] and [`RenderSink`] traits.

#![warn(missing_docs)]

pub use glam::Vec3;
use thiserror::Error;

pub mod audio;
pub mod camera;
pub mod config;
pub mod damping;
pub mod director;
pub mod logging;
pub mod particles;
pub mod render;
pub mod session;
pub mod shapes;
pub mod stage;
pub mod temperature;

// --- Re-exports grouped by category ---

// Audio
pub use audio::{
    AudioFeatures, BinRange, BufferSource, ExtractorConfig, FeatureExtractor, Silence, SpectrumFrame,
    SpectrumSource,
};
pub use temperature::{TemperatureConfig, TemperatureEstimator};

// Orchestration
pub use director::{
    CameraMode, Director, DirectorConfig, Effect, MaterialId, TemperatureTier,
    VisualConfiguration,
};

// Motion
pub use camera::{CameraConfig, CameraEngine, CameraPose};
pub use damping::{Damped, Damped3};
pub use particles::{InstanceTransform, ParticleConfig, ParticleEngine};
pub use shapes::{ShapeKind, ShapeLibrary};

// Output
pub use render::{FrameSummary, NullSink, RenderSink};
pub use stage::{MaterialUniforms, PointLight, PostParams, Stage, StageConfig, StageLighting, StageUniforms};

// Session & Config
pub use config::EngineConfig;
pub use logging::LogConfig;
pub use session::Session;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// A configuration value is out of range or non-finite
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
