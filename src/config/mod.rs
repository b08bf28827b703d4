use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;
pub const DEFAULT_SEGMENT_DURATION: f64 = 3.0;

/// Settings shared by every pipeline stage, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rate every decoded clip is resampled to before slicing or extraction.
    pub sample_rate: u32,
    /// Segment length in seconds.
    pub segment_duration: f64,
    pub features: FeatureSettings,
    pub split: SplitRatios,
    pub augment: AugmentSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            segment_duration: DEFAULT_SEGMENT_DURATION,
            features: FeatureSettings::default(),
            split: SplitRatios::default(),
            augment: AugmentSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from `path` when given, otherwise use defaults.
    pub fn from_override(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => {
                let raw = fs::read_to_string(p).map_err(|err| PipelineError::filesystem(p, err))?;
                Self::from_json(&raw)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|err| PipelineError::InvalidInput(format!("config JSON: {}", err)))
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.sample_rate > 0, "sample_rate must be positive")?;
        ensure(
            self.segment_duration > 0.0 && self.segment_duration.is_finite(),
            "segment_duration must be a positive number of seconds",
        )?;
        self.features.validate()?;
        self.split.validate()?;
        self.augment.validate()
    }

    /// Feature settings bound to the pipeline sample rate.
    pub fn feature_settings(&self) -> FeatureSettings {
        FeatureSettings {
            sample_rate: self.sample_rate,
            ..self.features.clone()
        }
    }
}

/// STFT and filterbank parameters; identical across mel, chroma and MFCC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSettings {
    pub sample_rate: u32,
    pub n_fft: usize,
    pub hop_length: usize,
    pub mel_bands: usize,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            n_fft: 2048,
            hop_length: 512,
            mel_bands: 128,
        }
    }
}

impl FeatureSettings {
    pub fn validate(&self) -> Result<()> {
        ensure(self.sample_rate > 0, "feature sample_rate must be positive")?;
        ensure(self.n_fft >= 2, "n_fft must be at least 2")?;
        ensure(self.hop_length > 0, "hop_length must be positive")?;
        ensure(self.mel_bands > 0, "mel_bands must be positive")
    }
}

/// Fractions of each genre's files copied to Train and Validation; Test
/// receives the remainder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitRatios {
    pub train: f64,
    pub validation: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.7,
            validation: 0.15,
        }
    }
}

impl SplitRatios {
    pub fn validate(&self) -> Result<()> {
        ensure(
            self.train >= 0.0 && self.validation >= 0.0,
            "split ratios must be non-negative",
        )?;
        ensure(
            self.train + self.validation <= 1.0,
            "train + validation ratios must not exceed 1.0",
        )
    }
}

/// Ranges the augmentation engine draws from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentSettings {
    pub scale_range: (f32, f32),
    pub offset_range: (f32, f32),
    /// Maximum circular shift, as a fraction of the frame count, in either direction.
    pub max_shift_fraction: f64,
    /// Maximum masked span, as a fraction of the frame count.
    pub max_mask_fraction: f64,
    pub mix_probability: f64,
    pub seed: Option<u64>,
}

impl Default for AugmentSettings {
    fn default() -> Self {
        Self {
            scale_range: (0.9, 1.1),
            offset_range: (-0.01, 0.01),
            max_shift_fraction: 0.1,
            max_mask_fraction: 0.2,
            mix_probability: 0.5,
            seed: None,
        }
    }
}

impl AugmentSettings {
    pub fn validate(&self) -> Result<()> {
        ensure(
            self.scale_range.0 <= self.scale_range.1,
            "scale_range lower bound exceeds upper bound",
        )?;
        ensure(
            self.offset_range.0 <= self.offset_range.1,
            "offset_range lower bound exceeds upper bound",
        )?;
        ensure(
            (0.0..1.0).contains(&self.max_shift_fraction),
            "max_shift_fraction must lie in [0, 1)",
        )?;
        ensure(
            (0.0..1.0).contains(&self.max_mask_fraction),
            "max_mask_fraction must lie in [0, 1)",
        )?;
        ensure(
            (0.0..=1.0).contains(&self.mix_probability),
            "mix_probability must lie in [0, 1]",
        )
    }
}

fn ensure(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(PipelineError::InvalidInput(message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::from_override(None).unwrap();
        assert_eq!(config.sample_rate, 22_050);
        assert_eq!(config.features.n_fft, 2048);
        assert_eq!(config.features.hop_length, 512);
        assert_eq!(config.features.mel_bands, 128);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = PipelineConfig::from_json(
            r#"{ "segment_duration": 1.5, "features": { "mel_bands": 64 } }"#,
        )
        .unwrap();
        assert_eq!(config.segment_duration, 1.5);
        assert_eq!(config.features.mel_bands, 64);
        assert_eq!(config.features.hop_length, 512);
        assert_eq!(config.augment.mix_probability, 0.5);
    }

    #[test]
    fn rejects_inverted_ranges() {
        let mut config = PipelineConfig::default();
        config.augment.scale_range = (1.2, 0.8);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_oversized_split() {
        let mut config = PipelineConfig::default();
        config.split = SplitRatios {
            train: 0.9,
            validation: 0.2,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn feature_settings_follow_pipeline_rate() {
        let config = PipelineConfig {
            sample_rate: 16_000,
            ..PipelineConfig::default()
        };
        assert_eq!(config.feature_settings().sample_rate, 16_000);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "sample_rate": 8000 }"#).unwrap();
        let config = PipelineConfig::from_override(Some(&path)).unwrap();
        assert_eq!(config.sample_rate, 8000);
    }
}
