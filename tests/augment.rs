use approx::assert_abs_diff_eq;
use musify::augment::{replay, Augmenter};
use musify::config::AugmentSettings;
use musify::error::PipelineError;
use musify::features::standardize_global;
use ndarray::{s, Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;

const BANDS: usize = 6;
const FRAMES: usize = 20;
const GENRES: usize = 3;

fn toy_dataset(count: usize) -> (Array3<f32>, Array2<f32>) {
    let features = Array3::from_shape_fn((count, BANDS, FRAMES), |(n, b, t)| {
        let sign = if n % 2 == 0 { 1.0 } else { -1.0 };
        sign * ((n + 1) as f32 * 0.3 + b as f32 * 0.7 + (t as f32 * 0.45).sin())
    });
    let mut labels = Array2::zeros((count, GENRES));
    for n in 0..count {
        labels[[n, n % GENRES]] = 1.0;
    }
    (features, labels)
}

#[test]
fn originals_come_first_untouched() {
    let (features, labels) = toy_dataset(5);
    let mut rng = StdRng::seed_from_u64(1);

    let (augmented, augmented_labels) = Augmenter::default()
        .augment(features.view(), labels.view(), 10, &mut rng)
        .unwrap();

    assert_eq!(augmented.dim(), (15, BANDS, FRAMES));
    assert_eq!(augmented_labels.dim(), (15, GENRES));
    assert_eq!(augmented.slice(s![..5, .., ..]), features);
    assert_eq!(augmented_labels.slice(s![..5, ..]), labels);
}

#[test]
fn synthetic_examples_are_standardised_with_convex_labels() {
    let (features, labels) = toy_dataset(5);
    let mut rng = StdRng::seed_from_u64(2);

    let (augmented, augmented_labels) = Augmenter::default()
        .augment(features.view(), labels.view(), 40, &mut rng)
        .unwrap();

    for example in augmented.slice(s![5.., .., ..]).axis_iter(Axis(0)) {
        let mean = example.mean().unwrap();
        let var = example.mapv(|v| (v - mean).powi(2)).mean().unwrap();
        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(var, 1.0, epsilon = 1e-3);
    }
    for label in augmented_labels.slice(s![5.., ..]).rows() {
        assert_abs_diff_eq!(label.sum(), 1.0, epsilon = 1e-5);
        assert!(label.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}

#[test]
fn mixup_uses_one_weight_for_features_and_labels() {
    let (features, labels) = toy_dataset(4);
    let augmenter = Augmenter::new(AugmentSettings {
        scale_range: (1.0, 1.0),
        offset_range: (0.0, 0.0),
        max_shift_fraction: 0.0,
        max_mask_fraction: 0.0,
        mix_probability: 1.0,
        seed: None,
    })
    .unwrap();
    let mut rng = StdRng::seed_from_u64(3);

    for _ in 0..10 {
        let synthesized = augmenter
            .synthesize(features.view(), labels.view(), &mut rng)
            .unwrap();
        let trace = &synthesized.trace;
        let mix = trace.mix.expect("mixing always applies at probability 1");
        assert_eq!((trace.shift, trace.mask_len), (0, 0));

        let first = features.index_axis(Axis(0), trace.source);
        let second = features.index_axis(Axis(0), mix.partner);
        let blended = &first * mix.weight + &second * (1.0 - mix.weight);
        let expected = standardize_global(blended.view());
        for (got, want) in synthesized.features.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-4);
        }

        let expected_label =
            &labels.row(trace.source) * mix.weight + &labels.row(mix.partner) * (1.0 - mix.weight);
        for (got, want) in synthesized.label.iter().zip(expected_label.iter()) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-6);
        }
    }
}

#[test]
fn disabled_mixing_keeps_source_label() {
    let (features, labels) = toy_dataset(3);
    let augmenter = Augmenter::new(AugmentSettings {
        mix_probability: 0.0,
        ..AugmentSettings::default()
    })
    .unwrap();
    let mut rng = StdRng::seed_from_u64(4);

    for _ in 0..10 {
        let synthesized = augmenter
            .synthesize(features.view(), labels.view(), &mut rng)
            .unwrap();
        assert!(synthesized.trace.mix.is_none());
        assert_eq!(synthesized.label, labels.row(synthesized.trace.source));
    }
}

#[test]
fn trace_replays_to_the_same_example() {
    let (features, labels) = toy_dataset(5);
    let mut rng = StdRng::seed_from_u64(5);
    let augmenter = Augmenter::default();

    for _ in 0..10 {
        let synthesized = augmenter
            .synthesize(features.view(), labels.view(), &mut rng)
            .unwrap();
        let (replayed, label) = replay(features.view(), labels.view(), &synthesized.trace);
        assert_eq!(replayed, synthesized.features);
        assert_eq!(label, synthesized.label);
    }
}

#[test]
fn same_seed_same_output() {
    let (features, labels) = toy_dataset(5);
    let augmenter = Augmenter::default();
    let run = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        augmenter
            .augment(features.view(), labels.view(), 8, &mut rng)
            .unwrap()
    };

    assert_eq!(run(17), run(17));
    assert_ne!(run(17).0, run(18).0);
}

#[test]
fn empty_dataset_cannot_seed_new_examples() {
    let features = Array3::<f32>::zeros((0, BANDS, FRAMES));
    let labels = Array2::<f32>::zeros((0, GENRES));
    let mut rng = StdRng::seed_from_u64(6);
    let augmenter = Augmenter::default();

    let err = augmenter
        .augment(features.view(), labels.view(), 3, &mut rng)
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));

    let (unchanged, _) = augmenter
        .augment(features.view(), labels.view(), 0, &mut rng)
        .unwrap();
    assert_eq!(unchanged.dim(), (0, BANDS, FRAMES));
}

#[test]
fn out_of_range_settings_are_rejected() {
    let err = Augmenter::new(AugmentSettings {
        mix_probability: 1.5,
        ..AugmentSettings::default()
    })
    .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));
}
