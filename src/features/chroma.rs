use ndarray::Array2;

use super::CHROMA_BINS;

/// Bins below C1 carry too little pitch resolution to be assigned a class.
const MIN_PITCH_FREQ: f64 = 32.70;
const A4_FREQ: f64 = 440.0;
const A4_MIDI: f64 = 69.0;

/// Fold a `[frame][bin]` power spectrogram onto 12 pitch classes (C = 0).
///
/// Each frame is scaled so its strongest class is 1; silent frames stay zero.
pub(crate) fn chromagram(power: &[Vec<f64>], n_fft: usize, sample_rate: u32) -> Array2<f64> {
    let bins = n_fft / 2 + 1;
    let bin_width = sample_rate as f64 / n_fft as f64;
    let classes: Vec<Option<usize>> = (0..bins)
        .map(|bin| pitch_class(bin as f64 * bin_width))
        .collect();

    let mut chroma = Array2::zeros((CHROMA_BINS, power.len()));
    for (t, frame) in power.iter().enumerate() {
        for (energy, class) in frame.iter().zip(&classes) {
            if let Some(class) = class {
                chroma[[*class, t]] += energy;
            }
        }
        let mut column = chroma.column_mut(t);
        let peak = column.fold(0.0_f64, |acc, &v| acc.max(v));
        if peak > 0.0 {
            column.mapv_inplace(|v| v / peak);
        }
    }
    chroma
}

fn pitch_class(freq: f64) -> Option<usize> {
    if freq < MIN_PITCH_FREQ {
        return None;
    }
    let midi = A4_MIDI + 12.0 * (freq / A4_FREQ).log2();
    Some((midi.round() as i64).rem_euclid(CHROMA_BINS as i64) as usize)
}
