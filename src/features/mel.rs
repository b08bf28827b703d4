use aus::analysis;
use aus::analysis::mel::MelFilterbank;
use aus::spectrum;
use ndarray::Array2;

use crate::config::FeatureSettings;

const MIN_FREQ: f64 = 0.0;
const AMIN: f64 = 1e-10;
const TOP_DB: f64 = 80.0;

/// Apply a mel filterbank to a `[frame][bin]` power spectrogram.
pub(crate) fn mel_spectrogram(power: &[Vec<f64>], settings: &FeatureSettings) -> Vec<Vec<f64>> {
    let freqs = spectrum::rfftfreq(settings.n_fft, settings.sample_rate);
    let filterbank = MelFilterbank::new(
        MIN_FREQ,
        (settings.sample_rate as f64) / 2.0,
        settings.mel_bands,
        &freqs,
        true,
    );
    analysis::mel::make_mel_spectrogram(power, &filterbank)
}

/// Decibel scaling relative to `reference`, floored `TOP_DB` below the peak.
pub(crate) fn power_to_db(power: &Array2<f64>, reference: f64) -> Array2<f64> {
    let reference_db = 10.0 * reference.abs().max(AMIN).log10();
    let db = power.mapv(|p| 10.0 * p.max(AMIN).log10() - reference_db);
    let peak = db.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
    db.mapv(|v| v.max(peak - TOP_DB))
}

/// Largest value of a power array, used as the dB reference for the log-mel map.
pub(crate) fn peak_power(power: &Array2<f64>) -> f64 {
    power.fold(0.0, |acc, &v| acc.max(v))
}

/// Cepstral coefficients per frame from `[frame][band]` mel power.
///
/// Power is floored at `AMIN` so silent bands stay finite under the log.
pub(crate) fn mfcc_frames(mel_frames: &[Vec<f64>], count: usize) -> Vec<Vec<f64>> {
    let floored: Vec<Vec<f64>> = mel_frames
        .iter()
        .map(|frame| frame.iter().map(|&p| p.max(AMIN)).collect())
        .collect();
    analysis::mel::mfcc_spectrogram(&floored, count, None)
}
