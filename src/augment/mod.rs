//! Synthesises extra labelled training examples from an extracted dataset.
//!
//! Every synthetic example starts from a uniformly drawn original and goes
//! through scale, offset, circular time shift, a zeroed time span, an optional
//! mixup with a second original, and finally a global re-standardisation.

use ndarray::{s, Array1, Array2, Array3, ArrayView2, ArrayView3, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::AugmentSettings;
use crate::error::{PipelineError, Result};
use crate::features::standardize_global;

/// Random draws behind one synthetic example.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentTrace {
    pub source: usize,
    pub scale: f32,
    pub offset: f32,
    /// Frames rolled towards the end (negative rolls towards the start).
    pub shift: isize,
    pub mask_start: usize,
    pub mask_len: usize,
    pub mix: Option<Mixup>,
}

/// Second example blended into a synthetic one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mixup {
    pub partner: usize,
    /// Weight of the transformed first example; the partner gets `1 - weight`.
    pub weight: f32,
}

/// One synthetic example with the draws that produced it.
#[derive(Debug, Clone)]
pub struct Synthesized {
    pub features: Array2<f32>,
    pub label: Array1<f32>,
    pub trace: AugmentTrace,
}

#[derive(Debug, Clone, Default)]
pub struct Augmenter {
    settings: AugmentSettings,
}

impl Augmenter {
    pub fn new(settings: AugmentSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// RNG seeded from the settings, or from system entropy when no seed is set.
    pub fn rng(&self) -> StdRng {
        match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Return the originals followed by `target_new_count` synthetic examples.
    pub fn augment<R: Rng + ?Sized>(
        &self,
        features: ArrayView3<f32>,
        labels: ArrayView2<f32>,
        target_new_count: usize,
        rng: &mut R,
    ) -> Result<(Array3<f32>, Array2<f32>)> {
        let (count, bands, frames) = features.dim();
        check_pairing(count, labels.nrows())?;

        let total = count + target_new_count;
        let mut out_features = Array3::zeros((total, bands, frames));
        let mut out_labels = Array2::zeros((total, labels.ncols()));
        out_features.slice_mut(s![..count, .., ..]).assign(&features);
        out_labels.slice_mut(s![..count, ..]).assign(&labels);

        let mut mixed = 0usize;
        for row in count..total {
            let synthesized = self.synthesize(features, labels, rng)?;
            if synthesized.trace.mix.is_some() {
                mixed += 1;
            }
            out_features
                .index_axis_mut(Axis(0), row)
                .assign(&synthesized.features);
            out_labels.row_mut(row).assign(&synthesized.label);
        }

        debug!(
            originals = count,
            synthesized = target_new_count,
            mixed,
            "augmented dataset"
        );
        Ok((out_features, out_labels))
    }

    /// Draw and build one synthetic example.
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        features: ArrayView3<f32>,
        labels: ArrayView2<f32>,
        rng: &mut R,
    ) -> Result<Synthesized> {
        let (count, _, frames) = features.dim();
        check_pairing(count, labels.nrows())?;
        if count == 0 {
            return Err(PipelineError::InvalidInput(
                "cannot synthesise examples from an empty dataset".into(),
            ));
        }
        if frames == 0 {
            return Err(PipelineError::InvalidInput(
                "cannot synthesise examples without time frames".into(),
            ));
        }

        let trace = self.draw(count, frames, rng);
        let (features, label) = replay(features, labels, &trace);
        Ok(Synthesized {
            features,
            label,
            trace,
        })
    }

    fn draw<R: Rng + ?Sized>(&self, count: usize, frames: usize, rng: &mut R) -> AugmentTrace {
        let settings = &self.settings;
        let source = rng.gen_range(0..count);
        let scale = rng.gen_range(settings.scale_range.0..=settings.scale_range.1);
        let offset = rng.gen_range(settings.offset_range.0..=settings.offset_range.1);
        let shift_fraction =
            rng.gen_range(-settings.max_shift_fraction..=settings.max_shift_fraction);
        let shift = (frames as f64 * shift_fraction) as isize;
        let mask_fraction = rng.gen_range(0.0..=settings.max_mask_fraction);
        let mask_len = ((frames as f64 * mask_fraction) as usize).min(frames - 1);
        let mask_start = rng.gen_range(0..frames - mask_len);
        let mix = (rng.gen::<f64>() < settings.mix_probability).then(|| Mixup {
            partner: rng.gen_range(0..count),
            weight: rng.gen::<f32>(),
        });

        AugmentTrace {
            source,
            scale,
            offset,
            shift,
            mask_start,
            mask_len,
            mix,
        }
    }
}

/// Rebuild the synthetic example described by `trace`.
///
/// Mixup blends the already transformed first example with the untouched
/// partner, using the same weight for features and labels.
pub fn replay(
    features: ArrayView3<f32>,
    labels: ArrayView2<f32>,
    trace: &AugmentTrace,
) -> (Array2<f32>, Array1<f32>) {
    let source = features.index_axis(Axis(0), trace.source);
    let scaled = source.mapv(|v| v * trace.scale + trace.offset);
    let mut sample = roll_frames(scaled.view(), trace.shift);
    sample
        .slice_mut(s![.., trace.mask_start..trace.mask_start + trace.mask_len])
        .fill(0.0);
    let mut label = labels.row(trace.source).to_owned();

    if let Some(Mixup { partner, weight }) = trace.mix {
        let other = features.index_axis(Axis(0), partner);
        sample = &sample * weight + &other * (1.0 - weight);
        label = &label * weight + &labels.row(partner) * (1.0 - weight);
    }

    (standardize_global(sample.view()), label)
}

/// Circularly shift columns: column `t` moves to `(t + shift) mod frames`.
fn roll_frames(sample: ArrayView2<f32>, shift: isize) -> Array2<f32> {
    let frames = sample.ncols();
    if frames == 0 {
        return sample.to_owned();
    }
    let offset = shift.rem_euclid(frames as isize) as usize;
    let mut rolled = Array2::zeros(sample.raw_dim());
    for (t, column) in sample.columns().into_iter().enumerate() {
        rolled.column_mut((t + offset) % frames).assign(&column);
    }
    rolled
}

fn check_pairing(features: usize, labels: usize) -> Result<()> {
    if features == labels {
        Ok(())
    } else {
        Err(PipelineError::shape_mismatch(
            "feature and label counts",
            features,
            labels,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn roll_moves_columns_forward_and_back() {
        let sample = array![[0.0_f32, 1.0, 2.0, 3.0], [10.0, 11.0, 12.0, 13.0]];
        assert_eq!(
            roll_frames(sample.view(), 1),
            array![[3.0, 0.0, 1.0, 2.0], [13.0, 10.0, 11.0, 12.0]]
        );
        assert_eq!(
            roll_frames(sample.view(), -1),
            array![[1.0, 2.0, 3.0, 0.0], [11.0, 12.0, 13.0, 10.0]]
        );
        assert_eq!(roll_frames(sample.view(), 4), sample);
    }

    #[test]
    fn replay_masks_a_time_span() {
        let features = Array3::from_shape_fn((1, 2, 10), |(_, b, t)| (b * 10 + t + 1) as f32);
        let labels = array![[1.0_f32]];
        let trace = AugmentTrace {
            source: 0,
            scale: 1.0,
            offset: 0.0,
            shift: 0,
            mask_start: 3,
            mask_len: 2,
            mix: None,
        };

        let (sample, label) = replay(features.view(), labels.view(), &trace);

        // Masked cells share one value after standardisation, and no other cell has it.
        let masked = sample[[0, 3]];
        assert_eq!(sample[[0, 4]], masked);
        assert_eq!(sample[[1, 3]], masked);
        assert_eq!(sample.iter().filter(|&&v| v == masked).count(), 4);
        assert_eq!(label, array![1.0]);
    }

    #[test]
    fn mask_never_covers_every_frame() {
        let augmenter = Augmenter::new(AugmentSettings {
            max_mask_fraction: 0.99,
            ..AugmentSettings::default()
        })
        .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let trace = augmenter.draw(4, 3, &mut rng);
            assert!(trace.mask_len < 3);
            assert!(trace.mask_start + trace.mask_len <= 3);
        }
    }

    #[test]
    fn draws_stay_in_configured_ranges() {
        let augmenter = Augmenter::default();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let trace = augmenter.draw(5, 130, &mut rng);
            assert!(trace.source < 5);
            assert!((0.9..=1.1).contains(&trace.scale));
            assert!((-0.01..=0.01).contains(&trace.offset));
            assert!(trace.shift.abs() <= 13);
            assert!(trace.mask_len <= 26);
            assert!(trace.mask_start + trace.mask_len <= 130);
            if let Some(mix) = trace.mix {
                assert!(mix.partner < 5);
                assert!((0.0..1.0).contains(&mix.weight));
            }
        }
    }

    #[test]
    fn mismatched_labels_are_rejected() {
        let features = Array3::<f32>::zeros((3, 2, 4));
        let labels = Array2::<f32>::zeros((2, 2));
        let mut rng = StdRng::seed_from_u64(0);
        let err = Augmenter::default()
            .augment(features.view(), labels.view(), 1, &mut rng)
            .unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch { .. }));
    }

    #[test]
    fn seeded_settings_reproduce() {
        let augmenter = Augmenter::new(AugmentSettings {
            seed: Some(99),
            ..AugmentSettings::default()
        })
        .unwrap();
        let a: u64 = augmenter.rng().gen();
        let b: u64 = augmenter.rng().gen();
        assert_eq!(a, b);
    }
}
