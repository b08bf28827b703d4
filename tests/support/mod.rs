#![allow(dead_code)]

use std::f32::consts::PI;
use std::fs;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use musify::config::{FeatureSettings, PipelineConfig};

pub const SMALL_RATE: u32 = 8_000;
/// Bands produced by `small_config`: 32 mel + 12 chroma + 13 MFCC.
pub const SMALL_BANDS: usize = 57;
/// Frames for one second at `SMALL_RATE` with a 128-sample hop.
pub const SMALL_FRAMES: usize = 63;

/// One-second segments at 8 kHz with a short FFT, to keep tests fast.
pub fn small_config() -> PipelineConfig {
    PipelineConfig {
        sample_rate: SMALL_RATE,
        segment_duration: 1.0,
        features: FeatureSettings {
            sample_rate: SMALL_RATE,
            n_fft: 512,
            hop_length: 128,
            mel_bands: 32,
        },
        ..PipelineConfig::default()
    }
}

pub fn sine_wave(freq: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
    let total = (seconds * sample_rate as f32).round() as usize;
    (0..total)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            0.4 * (2.0 * PI * freq * t).sin() + 0.1 * (2.0 * PI * 3.0 * freq * t).sin()
        })
        .collect()
}

/// Write a mono 16-bit WAV tone, creating parent directories.
pub fn write_tone(path: &Path, freq: f32, seconds: f32, sample_rate: u32) {
    write_samples(path, &sine_wave(freq, seconds, sample_rate), sample_rate);
}

pub fn write_samples(path: &Path, samples: &[f32], sample_rate: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for &sample in samples {
        writer
            .write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
}

/// A file with an audio extension that no decoder accepts.
pub fn write_garbage(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"definitely not a RIFF header").unwrap();
}

pub fn wav_len(path: &Path) -> (usize, u32) {
    let reader = WavReader::open(path)
        .unwrap_or_else(|err| panic!("failed to open {:?}: {}", path, err));
    (reader.len() as usize, reader.spec().sample_rate)
}
