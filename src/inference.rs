//! Whole-clip genre prediction from per-segment classifier scores.

use std::path::Path;

use ndarray::{Array1, Array2, Array3, ArrayView2, ArrayView3, Axis};
use tracing::{debug, warn};

use crate::audio::{decoder, resample};
use crate::config::PipelineConfig;
use crate::dataset::LabelEncoder;
use crate::error::{PipelineError, Result};
use crate::features::FeatureExtractor;
use crate::segment::slice_fixed;
use crate::types::FeatureMap;

/// Anything that scores a batch of `[segments, bands, frames]` feature maps.
///
/// Must return `[segments, genres]` with columns in label-encoder order.
pub trait GenreClassifier {
    fn predict(&self, batch: ArrayView3<f32>) -> anyhow::Result<Array2<f32>>;
}

/// Clip-level decision.
#[derive(Debug, Clone, PartialEq)]
pub struct GenrePrediction {
    pub index: usize,
    /// Per-genre probabilities summed over segments.
    pub scores: Array1<f32>,
    pub segments: usize,
}

/// Labelled decision for one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipClassification {
    pub genre: String,
    pub prediction: GenrePrediction,
}

/// Sum segment probabilities per genre and pick the largest sum.
///
/// Ties go to the lowest index.
pub fn aggregate_probabilities(probabilities: ArrayView2<f32>) -> Result<GenrePrediction> {
    let (segments, genres) = probabilities.dim();
    if segments == 0 || genres == 0 {
        return Err(PipelineError::EmptyFeatures(
            "no segment probabilities to aggregate".into(),
        ));
    }
    let scores = probabilities.sum_axis(Axis(0));
    let mut index = 0;
    for (i, &score) in scores.iter().enumerate() {
        if score > scores[index] {
            index = i;
        }
    }
    Ok(GenrePrediction {
        index,
        scores,
        segments,
    })
}

/// Segment a clip and extract one feature map per segment.
///
/// Segments that yield no features are skipped; a clip with no surviving
/// segment is an `EmptyFeatures` error.
pub fn prepare_clip(path: &Path, config: &PipelineConfig) -> Result<Array3<f32>> {
    let extractor = FeatureExtractor::new(config.feature_settings())?;
    let audio = resample::to_rate(decoder::decode_audio(path)?, config.sample_rate)?;
    let segments = slice_fixed(&audio, config.segment_duration);

    let mut maps: Vec<FeatureMap> = Vec::with_capacity(segments.len());
    for segment in &segments {
        match extractor.extract(&segment.samples, segment.sample_rate) {
            Ok(features) => maps.push(features),
            Err(err) if err.is_recoverable() => {
                warn!(
                    path = %path.display(),
                    segment = segment.index,
                    error = %err,
                    "skipping segment"
                );
            }
            Err(err) => return Err(err),
        }
    }

    let Some(first) = maps.first() else {
        return Err(PipelineError::EmptyFeatures(format!(
            "{} produced no full segment",
            path.display()
        )));
    };
    let (bands, frames) = first.dim();
    let mut batch = Array3::zeros((maps.len(), bands, frames));
    for (mut slot, features) in batch.outer_iter_mut().zip(&maps) {
        slot.assign(features);
    }
    debug!(path = %path.display(), segments = maps.len(), "prepared clip");
    Ok(batch)
}

/// Predict the genre of one clip with `classifier`.
pub fn classify_clip<C: GenreClassifier + ?Sized>(
    path: &Path,
    classifier: &C,
    encoder: &LabelEncoder,
    config: &PipelineConfig,
) -> Result<ClipClassification> {
    let batch = prepare_clip(path, config)?;
    let probabilities = classifier
        .predict(batch.view())
        .map_err(|err| PipelineError::InvalidInput(format!("classifier failed: {:#}", err)))?;
    if probabilities.dim() != (batch.len_of(Axis(0)), encoder.len()) {
        return Err(PipelineError::shape_mismatch(
            "classifier output",
            (batch.len_of(Axis(0)), encoder.len()),
            probabilities.dim(),
        ));
    }

    let prediction = aggregate_probabilities(probabilities.view())?;
    let genre = encoder
        .decode(prediction.index)
        .map(str::to_owned)
        .ok_or_else(|| {
            PipelineError::InvalidInput(format!("no genre at index {}", prediction.index))
        })?;
    Ok(ClipClassification { genre, prediction })
}
