use crate::error::{PipelineError, Result};
use crate::types::AudioData;

/// Linearly resample `samples` from `source_rate` to `target_rate`.
pub fn linear_resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    if source_rate == 0 || target_rate == 0 {
        return Err(PipelineError::InvalidInput(format!(
            "cannot resample between {} Hz and {} Hz",
            source_rate, target_rate
        )));
    }
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples.to_vec());
    }
    let step = source_rate as f64 / target_rate as f64;
    let output_len = ((samples.len() as f64) * target_rate as f64 / source_rate as f64).floor();
    let output_len = (output_len as usize).max(1);
    let last_index = samples.len() - 1;
    let output = (0..output_len)
        .map(|i| {
            let position = i as f64 * step;
            let left = (position.floor() as usize).min(last_index);
            let right = (left + 1).min(last_index);
            let t = (position - left as f64) as f32;
            samples[left] * (1.0 - t) + samples[right] * t
        })
        .collect();
    Ok(output)
}

/// Bring a decoded clip to `target_rate`, leaving it untouched when it already matches.
pub fn to_rate(audio: AudioData, target_rate: u32) -> Result<AudioData> {
    if audio.sample_rate == target_rate {
        return Ok(audio);
    }
    let samples = linear_resample(&audio.samples, audio.sample_rate, target_rate)?;
    Ok(AudioData::new(samples, target_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_constant_signal_after_resample() {
        let input = vec![0.5; 480];
        let resampled = linear_resample(&input, 48_000, 16_000).unwrap();
        assert_eq!(resampled.len(), 160);
        assert!(resampled.iter().all(|&sample| (sample - 0.5).abs() < 1e-6));
    }

    #[test]
    fn whole_seconds_stay_whole() {
        let input = vec![0.0; 44_100 * 9];
        let resampled = linear_resample(&input, 44_100, 22_050).unwrap();
        assert_eq!(resampled.len(), 22_050 * 9);
    }

    #[test]
    fn upsampling_interpolates_between_neighbours() {
        let resampled = linear_resample(&[0.0, 1.0], 1, 2).unwrap();
        assert_eq!(resampled, vec![0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(linear_resample(&[0.0], 0, 16_000).is_err());
    }

    #[test]
    fn matching_rate_is_untouched() {
        let audio = AudioData::new(vec![0.1, 0.2], 22_050);
        let same = to_rate(audio, 22_050).unwrap();
        assert_eq!(same.samples, vec![0.1, 0.2]);
    }
}
