//! Audio input boundary and feature extraction
//!
//! The core never captures audio itself. A host-provided [`SpectrumSource`]
//! hands over one magnitude spectrum per tick and the [`FeatureExtractor`]
//! turns it into [`AudioFeatures`].

pub mod extractor;

pub use extractor::{AudioFeatures, BinRange, ExtractorConfig, FeatureExtractor};

/// One spectrum snapshot, borrowed from the source for the duration of a tick
#[derive(Debug, Clone, Copy)]
pub struct SpectrumFrame<'a> {
    /// Frequency bin magnitudes on a 0-255 scale, lowest frequency first
    pub bins: &'a [u8],
    /// Capture time in seconds, monotonic within a session
    pub timestamp: f64,
}

impl<'a> SpectrumFrame<'a> {
    /// Create a frame
    pub fn new(bins: &'a [u8], timestamp: f64) -> Self {
        Self { bins, timestamp }
    }
}

/// Audio capture collaborator
///
/// Called exactly once per tick. Must not block. `now` is the session clock
/// in seconds; sources without their own clock should stamp frames with it.
/// Returning `None` (no device, dropped frame) is treated as silence-hold by
/// the extractor.
pub trait SpectrumSource {
    /// Current spectrum, if one is available
    fn read_spectrum(&mut self, now: f64) -> Option<SpectrumFrame<'_>>;
}

/// A source that never yields a spectrum
#[derive(Debug, Default, Clone, Copy)]
pub struct Silence;

impl SpectrumSource for Silence {
    fn read_spectrum(&mut self, _now: f64) -> Option<SpectrumFrame<'_>> {
        None
    }
}

/// A fixed bin buffer that the caller rewrites between ticks
#[derive(Debug, Default, Clone)]
pub struct BufferSource {
    /// Bins served on the next read
    pub bins: Vec<u8>,
}

impl BufferSource {
    /// Wrap a bin buffer
    pub fn new(bins: Vec<u8>) -> Self {
        Self { bins }
    }
}

impl SpectrumSource for BufferSource {
    fn read_spectrum(&mut self, now: f64) -> Option<SpectrumFrame<'_>> {
        Some(SpectrumFrame::new(&self.bins, now))
    }
}
