use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use super::manifest::sorted_entries;
use crate::config::SplitRatios;
use crate::error::{PipelineError, Result};
use crate::types::Subset;

/// Files copied into each subset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitSummary {
    pub train: usize,
    pub validation: usize,
    pub test: usize,
}

impl SplitSummary {
    pub fn total(&self) -> usize {
        self.train + self.validation + self.test
    }
}

/// Copy `<parent>/<genre>/<file>` into `<output>/{Train,Validation,Test}/<genre>/`.
///
/// Each genre's files are shuffled with `seed`; Train and Validation receive
/// `floor(ratio * n)` files and Test the remainder.
pub fn split_dataset(
    parent: &Path,
    output: &Path,
    ratios: &SplitRatios,
    seed: u64,
) -> Result<SplitSummary> {
    ratios.validate()?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut summary = SplitSummary::default();

    for genre_dir in sorted_entries(parent)? {
        if !genre_dir.is_dir() {
            continue;
        }
        let Some(genre) = genre_dir.file_name() else {
            continue;
        };

        let mut files: Vec<_> = sorted_entries(&genre_dir)?
            .into_iter()
            .filter(|path| path.is_file())
            .collect();
        files.shuffle(&mut rng);

        let (train, validation) = split_counts(files.len(), ratios);
        for (index, file) in files.iter().enumerate() {
            let subset = if index < train {
                Subset::Train
            } else if index < train + validation {
                Subset::Validation
            } else {
                Subset::Test
            };
            let target_dir = output.join(subset.dir_name()).join(genre);
            fs::create_dir_all(&target_dir)
                .map_err(|err| PipelineError::filesystem(&target_dir, err))?;
            if let Some(name) = file.file_name() {
                let target = target_dir.join(name);
                fs::copy(file, &target).map_err(|err| PipelineError::filesystem(&target, err))?;
            }
        }
        for subset in Subset::ALL {
            let dir = output.join(subset.dir_name()).join(genre);
            fs::create_dir_all(&dir).map_err(|err| PipelineError::filesystem(&dir, err))?;
        }

        let test = files.len() - train - validation;
        info!(
            genre = %genre.to_string_lossy(),
            train,
            validation,
            test,
            "split genre"
        );
        summary.train += train;
        summary.validation += validation;
        summary.test += test;
    }

    Ok(summary)
}

/// Train and validation counts for `total` files; test takes the rest.
pub fn split_counts(total: usize, ratios: &SplitRatios) -> (usize, usize) {
    let train = ((ratios.train * total as f64).floor() as usize).min(total);
    let validation = ((ratios.validation * total as f64).floor() as usize).min(total - train);
    (train, validation)
}
