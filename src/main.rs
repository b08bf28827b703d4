use std::path::Path;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use ndarray::Axis;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use musify::augment::Augmenter;
use musify::cli::{AugmentArgs, Cli, Command, ExtractArgs, SegmentArgs, SplitArgs};
use musify::config::PipelineConfig;
use musify::dataset::{self, store};
use musify::segment;
use musify::types::Subset;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_override(cli.config.as_deref())
        .context("Failed to load pipeline configuration")?;

    match cli.command {
        Command::Split(args) => handle_split(&args, &config),
        Command::Segment(args) => handle_segment(&args, &config),
        Command::Extract(args) => handle_extract(&args, &config),
        Command::Augment(args) => handle_augment(&args, &config),
    }
}

fn handle_split(args: &SplitArgs, config: &PipelineConfig) -> Result<()> {
    ensure_directory(&args.parent)?;
    let summary = dataset::split_dataset(&args.parent, &args.output, &config.split, args.seed)
        .with_context(|| format!("Failed to split {:?}", args.parent))?;
    println!(
        "Split {} files: {} train, {} validation, {} test",
        summary.total(),
        summary.train,
        summary.validation,
        summary.test
    );
    Ok(())
}

fn handle_segment(args: &SegmentArgs, config: &PipelineConfig) -> Result<()> {
    let duration = args.duration.unwrap_or(config.segment_duration);
    ensure!(
        duration > 0.0,
        "Segment duration must be positive, got: {}",
        duration
    );
    let written = segment::segment_path(&args.source, &args.output, duration, config.sample_rate)
        .with_context(|| format!("Failed to segment {:?}", args.source))?;
    println!(
        "Wrote {} segments of {:.3}s under {:?}",
        written, duration, args.output
    );
    Ok(())
}

fn handle_extract(args: &ExtractArgs, config: &PipelineConfig) -> Result<()> {
    ensure_directory(&args.root)?;
    let summary = if args.manifests {
        dataset::extract_saved_manifests(&args.root, &args.output, config)
    } else {
        dataset::extract_dataset(&args.root, &args.output, config)
    }
    .with_context(|| format!("Failed to extract features from {:?}", args.root))?;
    println!("Genres: {}", summary.classes.join(", "));
    for (subset, examples, skipped) in &summary.subsets {
        println!(
            "   {}: {} examples of {}x{} ({} skipped)",
            subset, examples, summary.band_count, summary.frame_count, skipped
        );
    }
    Ok(())
}

fn handle_augment(args: &AugmentArgs, config: &PipelineConfig) -> Result<()> {
    ensure_directory(&args.features_dir)?;
    let (features, labels) = store::load_subset(&args.features_dir, Subset::Train)
        .context("Failed to load the Train subset")?;
    let augmenter =
        Augmenter::new(config.augment.clone()).context("Invalid augmentation settings")?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => augmenter.rng(),
    };

    let (augmented, augmented_labels) = augmenter
        .augment(features.view(), labels.view(), args.count, &mut rng)
        .context("Augmentation failed")?;
    println!(
        "Train: {} examples -> {} examples (features {:?}, labels {:?})",
        features.len_of(Axis(0)),
        augmented.len_of(Axis(0)),
        augmented.shape(),
        augmented_labels.shape()
    );
    Ok(())
}

fn ensure_directory(path: &Path) -> Result<()> {
    ensure!(path.is_dir(), "Not a directory: {:?}", path);
    Ok(())
}
