//! Headless render sink that reports the choreography through `tracing`

use beatmorph_core::{CameraPose, FrameSummary, InstanceTransform, RenderSink, StageUniforms, Vec3};
use tracing::info;

/// Logs one summary line per simulated second
#[derive(Debug, Default)]
pub struct TelemetrySink {
    frames: u64,
    reports: u64,
    next_report: f64,
    onsets: u32,
    instances: usize,
    strobe_peak: f32,
}

impl TelemetrySink {
    /// Create a sink whose first report lands after one simulated second
    pub fn new() -> Self {
        Self {
            next_report: 1.0,
            ..Default::default()
        }
    }

    /// Frames closed so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Summary lines written so far
    pub fn reports(&self) -> u64 {
        self.reports
    }

    fn report(&mut self, summary: &FrameSummary) {
        let f = &summary.features;
        let v = &summary.visuals;
        let effects: Vec<&str> = v.effects.iter().map(|e| e.name()).collect();
        let tempo = f
            .tempo_bpm
            .map(|bpm| format!("{:.1}", bpm))
            .unwrap_or_else(|| "-".to_string());
        let Vec3 { x, y, z } = summary.camera.position;

        info!(
            "t={:>6.1}s beat={:<5} epoch={:<3} bpm={:<5} temp={:.2} onsets={} | {} / {} / {} [{}] | visible={} strobe={:.1} | cam=({:.1}, {:.1}, {:.1})",
            summary.elapsed,
            f.beat_count,
            f.scene_epoch,
            tempo,
            summary.temperature,
            self.onsets,
            v.target_shape(),
            v.material.name(),
            v.camera_mode.name(),
            effects.join("+"),
            self.instances,
            self.strobe_peak,
            x,
            y,
            z,
        );

        self.reports += 1;
        self.onsets = 0;
        self.strobe_peak = 0.0;
    }
}

impl RenderSink for TelemetrySink {
    fn submit_instances(&mut self, instances: &[InstanceTransform], _group_rotation: Vec3) {
        self.instances = instances.len();
    }

    fn submit_camera(&mut self, _pose: &CameraPose) {}

    fn submit_uniforms(&mut self, uniforms: &StageUniforms) {
        self.strobe_peak = self.strobe_peak.max(uniforms.lighting.strobe);
    }

    fn end_frame(&mut self, summary: &FrameSummary) {
        self.frames += 1;
        if summary.features.is_onset {
            self.onsets += 1;
        }
        if summary.elapsed >= self.next_report {
            self.report(summary);
            // Skip seconds a clamped or stalled clock jumped over
            while self.next_report <= summary.elapsed {
                self.next_report += 1.0;
            }
        }
    }
}
