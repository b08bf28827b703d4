use ndarray::{concatenate, Array2, ArrayView2, Axis};

use crate::error::{PipelineError, Result};

/// Standard deviations at or below this are treated as zero variance.
const STD_FLOOR: f64 = 1e-10;

/// Standardise each band (row) across frames: zero mean, unit variance.
///
/// Bands with zero variance are divided by 1 instead.
pub fn standardize_bands(feature: ArrayView2<f64>) -> Array2<f64> {
    if feature.ncols() == 0 {
        return feature.to_owned();
    }
    let mean = feature
        .mean_axis(Axis(1))
        .unwrap_or_else(|| ndarray::Array1::zeros(feature.nrows()))
        .insert_axis(Axis(1));
    let std = feature
        .std_axis(Axis(1), 0.0)
        .mapv(safe_divisor)
        .insert_axis(Axis(1));
    (&feature - &mean) / &std
}

/// Standardise the whole array with a single mean and deviation.
pub fn standardize_global(feature: ArrayView2<f32>) -> Array2<f32> {
    if feature.is_empty() {
        return feature.to_owned();
    }
    let count = feature.len() as f64;
    let mean = feature.iter().map(|&v| v as f64).sum::<f64>() / count;
    let variance = feature
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / count;
    let std = safe_divisor(variance.sqrt());
    feature.mapv(|v| ((v as f64 - mean) / std) as f32)
}

/// Stack standardised maps along the band axis after checking their frame counts agree.
pub(crate) fn stack_bands(maps: &[(&str, Array2<f64>)]) -> Result<Array2<f32>> {
    let Some((_, first)) = maps.first() else {
        return Err(PipelineError::EmptyFeatures("no feature maps to stack".into()));
    };
    let frames = first.ncols();
    for (name, map) in maps {
        if map.ncols() != frames {
            return Err(PipelineError::shape_mismatch(
                format!("{} frame count", name),
                frames,
                map.ncols(),
            ));
        }
    }

    let standardized: Vec<Array2<f64>> = maps
        .iter()
        .map(|(_, map)| standardize_bands(map.view()))
        .collect();
    let views: Vec<ArrayView2<f64>> = standardized.iter().map(|m| m.view()).collect();
    let stacked = concatenate(Axis(0), &views)
        .map_err(|err| PipelineError::shape_mismatch("band stack", frames, err.to_string()))?;
    Ok(stacked.mapv(|v| v as f32))
}

fn safe_divisor(std: f64) -> f64 {
    if std <= STD_FLOOR {
        1.0
    } else {
        std
    }
}
