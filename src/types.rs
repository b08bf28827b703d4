//! Core types for the musify dataset pipeline

use std::fmt;
use std::time::Duration;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Stacked spectral features with axes (band, frame).
pub type FeatureMap = Array2<f32>;

/// Decoded audio (mono, f32 samples)
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Audio samples, normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g., 22050)
    pub sample_rate: u32,
}

impl AudioData {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// A fixed-length slice of a decoded clip.
#[derive(Debug, Clone)]
pub struct AudioSegment {
    /// Position of this segment within its source, contiguous from 0
    pub index: usize,
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Number of samples in one segment window.
pub fn window_samples(segment_duration: f64, sample_rate: u32) -> usize {
    (segment_duration * sample_rate as f64).round().max(0.0) as usize
}

/// Dataset partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subset {
    Train,
    Validation,
    Test,
}

impl Subset {
    pub const ALL: [Subset; 3] = [Subset::Train, Subset::Validation, Subset::Test];

    /// Directory and file prefix used on disk.
    pub fn dir_name(self) -> &'static str {
        match self {
            Subset::Train => "Train",
            Subset::Validation => "Validation",
            Subset::Test => "Test",
        }
    }
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}
