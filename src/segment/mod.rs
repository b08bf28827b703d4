//! Fixed-duration segmentation of audio files and directory trees.

pub mod slicer;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::audio::{decoder, encoder, resample};
use crate::error::{PipelineError, Result};

pub use slicer::slice_fixed;

const AUDIO_EXTENSIONS: [&str; 7] = ["wav", "mp3", "flac", "ogg", "m4a", "aiff", "aif"];

/// Segment a single file or every audio file below a directory.
///
/// Returns the number of segment files written. Files that fail to decode or
/// write are logged and skipped; a missing source or an unwritable output
/// directory aborts the run.
pub fn segment_path(
    source: &Path,
    output: &Path,
    segment_duration: f64,
    sample_rate: u32,
) -> Result<usize> {
    if !source.exists() {
        return Err(PipelineError::filesystem(
            source,
            std::io::Error::new(std::io::ErrorKind::NotFound, "source does not exist"),
        ));
    }
    if segment_duration <= 0.0 {
        return Err(PipelineError::InvalidInput(format!(
            "segment duration must be positive, got {}",
            segment_duration
        )));
    }

    if source.is_file() {
        match segment_file(source, output, segment_duration, sample_rate) {
            Ok(count) => Ok(count),
            Err(err) if err.is_recoverable() => {
                warn!(path = %source.display(), error = %err, "skipping file");
                Ok(0)
            }
            Err(err) => Err(err),
        }
    } else {
        segment_tree(source, output, segment_duration, sample_rate)
    }
}

/// Segment one file into `output_dir/segment_<n>.wav`.
pub fn segment_file(
    file: &Path,
    output_dir: &Path,
    segment_duration: f64,
    sample_rate: u32,
) -> Result<usize> {
    create_dir(output_dir)?;
    write_segments(file, output_dir, segment_duration, sample_rate, |index| {
        format!("segment_{}.wav", index)
    })
}

/// Segment every audio file below `root`, mirroring its directory layout under
/// `output` with names `<stem>_segment_<n>.wav`.
pub fn segment_tree(
    root: &Path,
    output: &Path,
    segment_duration: f64,
    sample_rate: u32,
) -> Result<usize> {
    // Listing is collected up front so segments written below `root` are never revisited.
    let (dirs, files) = collect_tree(root)?;
    info!(root = %root.display(), files = files.len(), "segmenting directory tree");
    for dir in &dirs {
        create_dir(&output.join(dir))?;
    }

    let mut written = 0usize;
    for file in &files {
        let relative = file
            .parent()
            .and_then(|parent| parent.strip_prefix(root).ok())
            .unwrap_or_else(|| Path::new(""));
        let target_dir = output.join(relative);

        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let result = write_segments(file, &target_dir, segment_duration, sample_rate, |index| {
            format!("{}_segment_{}.wav", stem, index)
        });
        match result {
            Ok(count) => {
                debug!(path = %file.display(), segments = count, "segmented file");
                written += count;
            }
            Err(err) if err.is_recoverable() => {
                warn!(path = %file.display(), error = %err, "skipping file");
            }
            Err(err) => return Err(err),
        }
    }

    info!(segments = written, output = %output.display(), "segmentation finished");
    Ok(written)
}

/// Decode, resample, slice and write one file.
///
/// Either every segment of the file is written or none is: on failure the
/// segments already written for this file are removed.
fn write_segments(
    file: &Path,
    output_dir: &Path,
    segment_duration: f64,
    sample_rate: u32,
    name_for: impl Fn(usize) -> String,
) -> Result<usize> {
    let audio = resample::to_rate(decoder::decode_audio(file)?, sample_rate)?;
    let segments = slice_fixed(&audio, segment_duration);
    debug!(
        path = %file.display(),
        seconds = audio.duration().as_secs_f64(),
        segments = segments.len(),
        "slicing file"
    );

    let mut written: Vec<PathBuf> = Vec::with_capacity(segments.len());
    for segment in &segments {
        let path = output_dir.join(name_for(segment.index));
        if let Err(err) = encoder::encode_wav(&segment.samples, segment.sample_rate, &path) {
            if path.is_file() {
                written.push(path);
            }
            discard(&written);
            return Err(err);
        }
        written.push(path);
    }
    Ok(written.len())
}

fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(err) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %err, "could not remove partial segment");
        }
    }
}

/// Relative directories and audio files below `root`, in file-name order.
fn collect_tree(root: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            PipelineError::filesystem(&path, err.into())
        })?;
        if entry.file_type().is_dir() {
            if let Ok(relative) = entry.path().strip_prefix(root) {
                dirs.push(relative.to_path_buf());
            }
        } else if entry.file_type().is_file() && is_audio_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok((dirs, files))
}

pub(crate) fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|err| PipelineError::filesystem(dir, err))
}
