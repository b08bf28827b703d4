use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// One labelled audio file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: PathBuf,
    pub genre: String,
}

/// Ordered list of labelled files making up one subset.
///
/// Genres are kept even when their directory holds no files so the label
/// encoder still sees them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub genres: Vec<String>,
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        let mut genres: Vec<String> = entries.iter().map(|e| e.genre.clone()).collect();
        genres.sort();
        genres.dedup();
        Self { genres, entries }
    }

    /// Build from a `<dir>/<genre>/<file>` layout, sorted by name at every level.
    pub fn from_directory(dir: &Path) -> Result<Self> {
        let mut manifest = Manifest::default();
        for genre_dir in sorted_entries(dir)? {
            if !genre_dir.is_dir() {
                continue;
            }
            let Some(genre) = genre_dir.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };
            for file in sorted_entries(&genre_dir)? {
                if file.is_file() {
                    manifest.entries.push(ManifestEntry {
                        path: file,
                        genre: genre.clone(),
                    });
                }
            }
            manifest.genres.push(genre);
        }
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| PipelineError::filesystem(path, err))?;
        let manifest: Manifest = serde_json::from_str(&raw)
            .map_err(|err| PipelineError::InvalidInput(format!("manifest {:?}: {}", path, err)))?;
        Ok(Manifest::new(manifest.entries).with_genres(manifest.genres))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|err| PipelineError::persist(path, err))?;
        fs::write(path, json).map_err(|err| PipelineError::filesystem(path, err))
    }

    /// Merge extra genre names into the known set.
    pub fn with_genres(mut self, extra: impl IntoIterator<Item = String>) -> Self {
        self.genres.extend(extra);
        self.genres.sort();
        self.genres.dedup();
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Directory listing sorted by file name.
pub(crate) fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .map_err(|err| PipelineError::filesystem(dir, err))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|err| PipelineError::filesystem(dir, err))?;
    entries.sort();
    Ok(entries)
}
