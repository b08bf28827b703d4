use crate::error::{PipelineError, Result};
use crate::types::AudioData;
use anyhow::Context;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Decode an audio file to mono f32 samples at its native sample rate.
pub fn decode_audio<P: AsRef<Path>>(path: P) -> Result<AudioData> {
    let path = path.as_ref();
    let audio = decode_with_symphonia(path).map_err(|err| PipelineError::decode(path, err))?;
    debug!(
        path = %path.display(),
        samples = audio.samples.len(),
        sample_rate = audio.sample_rate,
        "decoded audio"
    );
    Ok(audio)
}

fn decode_with_symphonia(path: &Path) -> anyhow::Result<AudioData> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probe_result = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Failed to probe audio format")?;
    let mut format = probe_result.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio tracks found in file")?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Sample rate not specified in audio file")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder")?;

    let mut mono = Vec::new();
    let mut interleaved: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(err).context("Failed to read packet"),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt frame is dropped; the rest of the stream is still usable.
            Err(SymphoniaError::DecodeError(reason)) => {
                debug!(path = %path.display(), reason, "skipping undecodable packet");
                continue;
            }
            Err(err) => return Err(err).context("Failed to decode audio packet"),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let too_small = interleaved
            .as_ref()
            .map_or(true, |buf| buf.capacity() < decoded.capacity() * channels);
        if too_small {
            interleaved = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }
        if let Some(buffer) = interleaved.as_mut() {
            buffer.copy_interleaved_ref(decoded);
            downmix_into(buffer.samples(), channels, &mut mono);
        }
    }

    Ok(AudioData {
        samples: mono,
        sample_rate,
    })
}

/// Average interleaved frames across channels.
fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels == 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    let scale = 1.0 / channels as f32;
    out.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() * scale),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_stereo_frames() {
        let mut out = Vec::new();
        downmix_into(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2, &mut out);
        assert_eq!(out, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn mono_passthrough() {
        let mut out = vec![0.25];
        downmix_into(&[0.1, 0.2], 1, &mut out);
        assert_eq!(out, vec![0.25, 0.1, 0.2]);
    }

    #[test]
    fn missing_file_is_decode_failure() {
        let err = decode_audio("does/not/exist.wav").unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
        assert!(err.is_recoverable());
    }
}
