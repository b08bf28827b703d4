use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Centred short-time power spectrogram, laid out `[frame][bin]`.
///
/// The signal is zero padded by `n_fft / 2` on both sides so frame `t` is
/// centred on sample `t * hop`. Each frame holds `n_fft / 2 + 1` bins.
pub(crate) fn power_spectrogram(samples: &[f32], n_fft: usize, hop: usize) -> Vec<Vec<f64>> {
    let pad = n_fft / 2;
    let mut padded = vec![0.0_f64; samples.len() + 2 * pad];
    for (slot, &sample) in padded[pad..].iter_mut().zip(samples) {
        *slot = sample as f64;
    }

    let frames = frame_count(samples.len(), n_fft, hop);
    let bins = n_fft / 2 + 1;
    let window = hann(n_fft);
    let fft = FftPlanner::<f64>::new().plan_fft_forward(n_fft);
    let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];

    (0..frames)
        .map(|frame| {
            let start = frame * hop;
            for ((slot, &sample), &w) in buffer
                .iter_mut()
                .zip(&padded[start..start + n_fft])
                .zip(&window)
            {
                *slot = Complex::new(sample * w, 0.0);
            }
            fft.process(&mut buffer);
            buffer[..bins].iter().map(|c| c.norm_sqr()).collect()
        })
        .collect()
}

/// Number of frames `power_spectrogram` yields for `sample_count` samples.
pub(crate) fn frame_count(sample_count: usize, n_fft: usize, hop: usize) -> usize {
    let padded = sample_count + 2 * (n_fft / 2);
    if padded < n_fft || hop == 0 {
        return 0;
    }
    (padded - n_fft) / hop + 1
}

/// Periodic Hann window.
fn hann(size: usize) -> Vec<f64> {
    (0..size)
        .map(|n| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * n as f64 / size as f64).cos())
        .collect()
}
