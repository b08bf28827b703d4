use crate::types::{window_samples, AudioData, AudioSegment};

/// Pure function to cut audio into back-to-back windows of `segment_duration`
/// seconds. A trailing window shorter than the full length is dropped.
pub fn slice_fixed(audio: &AudioData, segment_duration: f64) -> Vec<AudioSegment> {
    let window = window_samples(segment_duration, audio.sample_rate);
    if window == 0 {
        return Vec::new();
    }

    audio
        .samples
        .chunks_exact(window)
        .enumerate()
        .map(|(index, samples)| AudioSegment {
            index,
            samples: samples.to_vec(),
            sample_rate: audio.sample_rate,
        })
        .collect()
}
