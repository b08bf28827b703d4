//! Error type shared by the dataset pipeline.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Convenient alias for results returned by pipeline modules.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures raised while segmenting, extracting or augmenting.
///
/// Per-file kinds (`Decode`, `Encode`, `EmptyFeatures`) are skipped by batch
/// operations; every other kind aborts the batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to decode {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("failed to write {path:?}: {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("feature extraction produced no usable data: {0}")]
    EmptyFeatures(String),

    #[error("shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("filesystem error at {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to persist {path:?}: {reason}")]
    Persist { path: PathBuf, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PipelineError {
    pub fn decode(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            reason: format!("{:#}", err),
        }
    }

    pub fn encode(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Encode {
            path: path.to_path_buf(),
            reason: format!("{:#}", err),
        }
    }

    pub fn filesystem(path: &Path, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn persist(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Persist {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }

    pub fn shape_mismatch(
        context: impl Into<String>,
        expected: impl std::fmt::Debug,
        found: impl std::fmt::Debug,
    ) -> Self {
        Self::ShapeMismatch {
            context: context.into(),
            expected: format!("{:?}", expected),
            found: format!("{:?}", found),
        }
    }

    /// Whether a batch operation may log this error and move on to the next file.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::Encode { .. } | Self::EmptyFeatures(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_file_errors_are_recoverable() {
        assert!(PipelineError::decode(Path::new("a.wav"), "bad header").is_recoverable());
        assert!(PipelineError::EmptyFeatures("silence".into()).is_recoverable());
        assert!(PipelineError::encode(Path::new("b.wav"), "disk full").is_recoverable());
    }

    #[test]
    fn structural_errors_are_fatal() {
        let missing = PipelineError::filesystem(
            Path::new("nowhere"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(!missing.is_recoverable());
        assert!(!PipelineError::shape_mismatch("frames", 130, 129).is_recoverable());
        assert!(!PipelineError::InvalidInput("count".into()).is_recoverable());
    }

    #[test]
    fn shape_mismatch_names_context() {
        let err = PipelineError::shape_mismatch("clip.wav", (153, 130), (153, 87));
        let message = err.to_string();
        assert!(message.contains("clip.wav"));
        assert!(message.contains("(153, 130)"));
        assert!(message.contains("(153, 87)"));
    }
}
