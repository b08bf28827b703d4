use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "musify")]
#[command(version = "0.1.0")]
#[command(about = "Music genre dataset pipeline: split, segment, extract and augment", long_about = None)]
pub struct Cli {
    /// Optional JSON pipeline configuration.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split `<PARENT>/<genre>/<file>` into Train, Validation and Test.
    Split(SplitArgs),
    /// Cut audio files into fixed-length WAV segments.
    Segment(SegmentArgs),
    /// Extract feature tensors and labels for every subset.
    Extract(ExtractArgs),
    /// Preview augmentation of the extracted Train subset.
    Augment(AugmentArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SplitArgs {
    #[arg(value_name = "PARENT")]
    pub parent: PathBuf,
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,
    /// Seed for the per-genre shuffle.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Args, Debug, Clone)]
pub struct SegmentArgs {
    /// Audio file or directory tree.
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,
    /// Segment length in seconds; overrides the configuration.
    #[arg(long, value_name = "SECS")]
    pub duration: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Directory holding `Train/`, `Validation/` and `Test/`.
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,
    /// Read ROOT as the `<Subset>_manifest.json` files of an earlier extract.
    #[arg(long)]
    pub manifests: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AugmentArgs {
    /// Directory written by `extract`.
    #[arg(value_name = "FEATURES_DIR")]
    pub features_dir: PathBuf,
    /// Synthetic examples to add.
    #[arg(long)]
    pub count: usize,
    /// Overrides the configured augmentation seed.
    #[arg(long)]
    pub seed: Option<u64>,
}
