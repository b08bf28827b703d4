//! Stacked log-mel, chroma and cepstral features for fixed-length segments.

mod chroma;
mod mel;
pub mod statistics;
mod stft;

use std::path::Path;

use ndarray::Array2;
use tracing::debug;

use crate::audio::{decoder, resample};
use crate::config::FeatureSettings;
use crate::error::{PipelineError, Result};
use crate::types::FeatureMap;

pub use statistics::{standardize_bands, standardize_global};

pub const CHROMA_BINS: usize = 12;
pub const MFCC_COUNT: usize = 13;

/// Turns segment audio into a `(mel_bands + 12 + 13, frames)` feature map.
///
/// Mel, chroma and MFCC share one STFT, so their frame counts agree by
/// construction; the count is still checked before the maps are stacked.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    settings: FeatureSettings,
}

impl FeatureExtractor {
    pub fn new(settings: FeatureSettings) -> Result<Self> {
        settings.validate()?;
        if settings.mel_bands < MFCC_COUNT {
            return Err(PipelineError::InvalidInput(format!(
                "mel_bands ({}) must be at least the {} cepstral coefficients",
                settings.mel_bands, MFCC_COUNT
            )));
        }
        Ok(Self { settings })
    }

    /// Rows in every feature map this extractor produces.
    pub fn band_count(&self) -> usize {
        self.settings.mel_bands + CHROMA_BINS + MFCC_COUNT
    }

    /// Frames produced for `sample_count` samples at the configured rate.
    pub fn expected_frames(&self, sample_count: usize) -> usize {
        stft::frame_count(sample_count, self.settings.n_fft, self.settings.hop_length)
    }

    pub fn extract(&self, samples: &[f32], sample_rate: u32) -> Result<FeatureMap> {
        if samples.is_empty() {
            return Err(PipelineError::EmptyFeatures("segment has no samples".into()));
        }
        let resampled;
        let samples = if sample_rate == self.settings.sample_rate {
            samples
        } else {
            resampled =
                resample::linear_resample(samples, sample_rate, self.settings.sample_rate)?;
            resampled.as_slice()
        };

        let settings = &self.settings;
        let power = stft::power_spectrogram(samples, settings.n_fft, settings.hop_length);
        if power.is_empty() {
            return Err(PipelineError::EmptyFeatures(
                "segment shorter than one analysis frame".into(),
            ));
        }

        let mel_frames = mel::mel_spectrogram(&power, settings);
        let mel_power = bands_by_frames(&mel_frames, settings.mel_bands)?;
        let log_mel = mel::power_to_db(&mel_power, mel::peak_power(&mel_power));
        let mfcc = bands_by_frames(&mel::mfcc_frames(&mel_frames, MFCC_COUNT), MFCC_COUNT)?;
        let chroma = chroma::chromagram(&power, settings.n_fft, settings.sample_rate);

        let features = statistics::stack_bands(&[
            ("mel", log_mel),
            ("chroma", chroma),
            ("mfcc", mfcc),
        ])?;
        if features.is_empty() || features.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::EmptyFeatures(
                "feature map is empty or contains non-finite values".into(),
            ));
        }
        debug!(
            bands = features.nrows(),
            frames = features.ncols(),
            "extracted feature map"
        );
        Ok(features)
    }

    /// Decode `path` and extract its feature map.
    pub fn extract_file(&self, path: &Path) -> Result<FeatureMap> {
        let audio = decoder::decode_audio(path)?;
        self.extract(&audio.samples, audio.sample_rate)
    }
}

/// Transpose `[frame][band]` rows into a `(band, frame)` array.
fn bands_by_frames(frames: &[Vec<f64>], bands: usize) -> Result<Array2<f64>> {
    if let Some(row) = frames.iter().find(|row| row.len() != bands) {
        return Err(PipelineError::shape_mismatch(
            "per-frame band count",
            bands,
            row.len(),
        ));
    }
    Ok(Array2::from_shape_fn((bands, frames.len()), |(band, frame)| {
        frames[frame][band]
    }))
}
