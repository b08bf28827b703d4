use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array2, Array3};
use ndarray_npy::{read_npy, write_npy};

use super::labels::LabelEncoder;
use super::manifest::Manifest;
use crate::error::{PipelineError, Result};
use crate::types::Subset;

pub const GENRES_FILE: &str = "genres.json";

pub fn features_path(dir: &Path, subset: Subset) -> PathBuf {
    dir.join(format!("{}_features.npy", subset.dir_name()))
}

pub fn labels_path(dir: &Path, subset: Subset) -> PathBuf {
    dir.join(format!("{}_labels.npy", subset.dir_name()))
}

pub fn manifest_path(dir: &Path, subset: Subset) -> PathBuf {
    dir.join(format!("{}_manifest.json", subset.dir_name()))
}

/// Write `<Subset>_features.npy` and `<Subset>_labels.npy` under `dir`.
pub fn save_subset(
    dir: &Path,
    subset: Subset,
    features: &Array3<f32>,
    labels: &Array2<f32>,
) -> Result<()> {
    if features.len_of(ndarray::Axis(0)) != labels.nrows() {
        return Err(PipelineError::shape_mismatch(
            format!("{} examples vs labels", subset),
            features.len_of(ndarray::Axis(0)),
            labels.nrows(),
        ));
    }
    fs::create_dir_all(dir).map_err(|err| PipelineError::filesystem(dir, err))?;
    let path = features_path(dir, subset);
    write_npy(&path, features).map_err(|err| PipelineError::persist(&path, err))?;
    let path = labels_path(dir, subset);
    write_npy(&path, labels).map_err(|err| PipelineError::persist(&path, err))?;
    Ok(())
}

/// Read back one subset's features and one-hot labels.
pub fn load_subset(dir: &Path, subset: Subset) -> Result<(Array3<f32>, Array2<f32>)> {
    let path = features_path(dir, subset);
    let features: Array3<f32> =
        read_npy(&path).map_err(|err| PipelineError::persist(&path, err))?;
    let path = labels_path(dir, subset);
    let labels: Array2<f32> = read_npy(&path).map_err(|err| PipelineError::persist(&path, err))?;
    if features.len_of(ndarray::Axis(0)) != labels.nrows() {
        return Err(PipelineError::shape_mismatch(
            format!("{} examples vs labels", subset),
            features.len_of(ndarray::Axis(0)),
            labels.nrows(),
        ));
    }
    Ok((features, labels))
}

pub fn save_encoder(dir: &Path, encoder: &LabelEncoder) -> Result<()> {
    fs::create_dir_all(dir).map_err(|err| PipelineError::filesystem(dir, err))?;
    encoder.save(&dir.join(GENRES_FILE))
}

pub fn load_encoder(dir: &Path) -> Result<LabelEncoder> {
    LabelEncoder::load(&dir.join(GENRES_FILE))
}

/// Entries behind the rows of one subset, in row order.
pub fn save_manifest(dir: &Path, subset: Subset, manifest: &Manifest) -> Result<()> {
    fs::create_dir_all(dir).map_err(|err| PipelineError::filesystem(dir, err))?;
    manifest.save(&manifest_path(dir, subset))
}

pub fn load_manifest(dir: &Path, subset: Subset) -> Result<Manifest> {
    Manifest::load(&manifest_path(dir, subset))
}
