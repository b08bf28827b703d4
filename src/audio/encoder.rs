use crate::error::{PipelineError, Result};
use anyhow::Context;
use std::path::Path;

/// Write mono samples as a 16-bit PCM WAV file.
pub fn encode_wav<P: AsRef<Path>>(samples: &[f32], sample_rate: u32, path: P) -> Result<()> {
    let path = path.as_ref();
    write_pcm16(samples, sample_rate, path).map_err(|err| PipelineError::encode(path, err))
}

fn write_pcm16(samples: &[f32], sample_rate: u32, path: &Path) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;

    for &sample in samples {
        let pcm = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(pcm)
            .context("Failed to write audio sample")?;
    }

    writer.finalize().context("Failed to finalize WAV file")?;
    Ok(())
}
