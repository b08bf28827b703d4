use std::fs;
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Maps genre names to contiguous indices in sorted order.
///
/// Fitted once over every subset's genres and shared, so index `i` means the
/// same genre in Train, Validation and Test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<I, S>(genres: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = genres.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();
        if classes.is_empty() {
            return Err(PipelineError::InvalidInput(
                "cannot fit a label encoder without any genre".into(),
            ));
        }
        Ok(Self { classes })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn encode(&self, genre: &str) -> Result<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(genre))
            .map_err(|_| PipelineError::InvalidInput(format!("unknown genre '{}'", genre)))
    }

    pub fn decode(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    /// One row per label, a single 1.0 at the genre's index.
    pub fn one_hot<S: AsRef<str>>(&self, genres: &[S]) -> Result<Array2<f32>> {
        let mut encoded = Array2::zeros((genres.len(), self.classes.len()));
        for (row, genre) in genres.iter().enumerate() {
            encoded[[row, self.encode(genre.as_ref())?]] = 1.0;
        }
        Ok(encoded)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| PipelineError::filesystem(path, err))?;
        let classes: Vec<String> = serde_json::from_str(&raw)
            .map_err(|err| PipelineError::InvalidInput(format!("genre list {:?}: {}", path, err)))?;
        Self::fit(classes)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(&self.classes).map_err(|err| PipelineError::persist(path, err))?;
        fs::write(path, json).map_err(|err| PipelineError::filesystem(path, err))
    }
}
