//! Dataset construction: manifests, shared label encoding, extraction and persistence.

pub mod labels;
pub mod manifest;
pub mod split;
pub mod store;

use std::path::Path;

use ndarray::{stack, Array2, Array3, ArrayView2, Axis};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::features::FeatureExtractor;
use crate::types::{window_samples, Subset};

pub use labels::LabelEncoder;
pub use manifest::{Manifest, ManifestEntry};
pub use split::{split_dataset, SplitSummary};

/// Feature tensors and one-hot labels for one subset.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// `[examples, bands, frames]`
    pub features: Array3<f32>,
    /// `[examples, genres]`, one-hot
    pub labels: Array2<f32>,
    /// Manifest entry behind each example, in row order
    pub sources: Vec<ManifestEntry>,
    /// Manifest entries that were skipped
    pub skipped: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.features.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Example counts written per subset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetSummary {
    pub classes: Vec<String>,
    pub band_count: usize,
    pub frame_count: usize,
    pub subsets: Vec<(Subset, usize, usize)>,
}

/// Extract every entry of `manifest` into one dataset.
///
/// Files that cannot be decoded or yield no features are logged and skipped.
/// The first surviving example fixes the feature shape; any later example with
/// a different shape aborts with a `ShapeMismatch` naming the file.
/// `empty_frames` sets the frame axis when nothing survives.
pub fn extract_manifest(
    manifest: &Manifest,
    encoder: &LabelEncoder,
    extractor: &FeatureExtractor,
    empty_frames: usize,
) -> Result<Dataset> {
    let mut maps = Vec::with_capacity(manifest.len());
    let mut genres = Vec::with_capacity(manifest.len());
    let mut sources = Vec::with_capacity(manifest.len());
    let mut skipped = 0usize;
    let mut shape: Option<(usize, usize)> = None;

    for entry in &manifest.entries {
        encoder.encode(&entry.genre)?;
        let features = match extractor.extract_file(&entry.path) {
            Ok(features) => features,
            Err(err) if err.is_recoverable() => {
                warn!(
                    path = %entry.path.display(),
                    genre = %entry.genre,
                    error = %err,
                    "skipping file"
                );
                skipped += 1;
                continue;
            }
            Err(err) => return Err(err),
        };

        match shape {
            None => shape = Some(features.dim()),
            Some(expected) if expected != features.dim() => {
                return Err(PipelineError::shape_mismatch(
                    entry.path.display().to_string(),
                    expected,
                    features.dim(),
                ));
            }
            Some(_) => {}
        }
        maps.push(features);
        genres.push(entry.genre.as_str());
        sources.push(entry.clone());
    }

    let features = if maps.is_empty() {
        Array3::zeros((0, extractor.band_count(), empty_frames))
    } else {
        let views: Vec<ArrayView2<f32>> = maps.iter().map(|m| m.view()).collect();
        stack(Axis(0), &views).map_err(|err| {
            PipelineError::shape_mismatch("example stack", "uniform", err.to_string())
        })?
    };
    let labels = encoder.one_hot(&genres)?;

    Ok(Dataset {
        features,
        labels,
        sources,
        skipped,
    })
}

/// Extract `root/{Train,Validation,Test}/<genre>/<file>` into `output`.
///
/// One label encoder is fitted over the genres of all three subsets and
/// shared by each of them; it is saved as `genres.json` next to the arrays,
/// together with one manifest per subset listing the extracted rows.
pub fn extract_dataset(
    root: &Path,
    output: &Path,
    config: &PipelineConfig,
) -> Result<DatasetSummary> {
    let manifests = Subset::ALL
        .iter()
        .map(|&subset| -> Result<(Subset, Manifest)> {
            let manifest = Manifest::from_directory(&root.join(subset.dir_name()))?;
            Ok((subset, manifest))
        })
        .collect::<Result<Vec<_>>>()?;
    extract_manifests(&manifests, output, config)
}

/// Re-extract from the `<Subset>_manifest.json` files a previous run saved in `dir`.
pub fn extract_saved_manifests(
    dir: &Path,
    output: &Path,
    config: &PipelineConfig,
) -> Result<DatasetSummary> {
    let manifests = Subset::ALL
        .iter()
        .map(|&subset| -> Result<(Subset, Manifest)> {
            Ok((subset, store::load_manifest(dir, subset)?))
        })
        .collect::<Result<Vec<_>>>()?;
    extract_manifests(&manifests, output, config)
}

/// Extract explicit per-subset manifests into `output`.
pub fn extract_manifests(
    manifests: &[(Subset, Manifest)],
    output: &Path,
    config: &PipelineConfig,
) -> Result<DatasetSummary> {
    let encoder = LabelEncoder::fit(
        manifests
            .iter()
            .flat_map(|(_, manifest)| manifest.genres.iter().cloned()),
    )?;
    let extractor = FeatureExtractor::new(config.feature_settings())?;
    let empty_frames =
        extractor.expected_frames(window_samples(config.segment_duration, config.sample_rate));
    info!(classes = ?encoder.classes(), "fitted label encoder");

    let mut datasets = Vec::with_capacity(manifests.len());
    let mut frame_count: Option<usize> = None;
    for (subset, manifest) in manifests {
        info!(%subset, files = manifest.len(), "extracting subset");
        let dataset = extract_manifest(manifest, &encoder, &extractor, empty_frames)?;
        if !dataset.is_empty() {
            let frames = dataset.features.len_of(Axis(2));
            match frame_count {
                Some(expected) if expected != frames => {
                    return Err(PipelineError::shape_mismatch(
                        format!("{} frame count", subset),
                        expected,
                        frames,
                    ));
                }
                _ => frame_count = Some(frames),
            }
        }
        datasets.push((*subset, dataset));
    }

    let frame_count = frame_count.unwrap_or(empty_frames);
    let mut summary = DatasetSummary {
        classes: encoder.classes().to_vec(),
        band_count: extractor.band_count(),
        frame_count,
        subsets: Vec::with_capacity(datasets.len()),
    };
    store::save_encoder(output, &encoder)?;
    for ((subset, mut dataset), (_, manifest)) in datasets.into_iter().zip(manifests) {
        if dataset.is_empty() {
            // Empty subsets share the frame axis of the populated ones.
            dataset.features = Array3::zeros((0, extractor.band_count(), frame_count));
        }
        store::save_subset(output, subset, &dataset.features, &dataset.labels)?;
        let extracted =
            Manifest::new(dataset.sources.clone()).with_genres(manifest.genres.clone());
        store::save_manifest(output, subset, &extracted)?;
        info!(
            %subset,
            examples = dataset.len(),
            skipped = dataset.skipped,
            "persisted subset"
        );
        summary.subsets.push((subset, dataset.len(), dataset.skipped));
    }
    Ok(summary)
}
