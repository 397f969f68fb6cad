//! Common test utilities

use rt_stft::prelude::*;

#[allow(dead_code)]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[allow(dead_code)]
pub fn calculate_snr(original: &[f32], reconstructed: &[f32]) -> f32 {
    assert_eq!(original.len(), reconstructed.len());

    let signal_power: f32 = original.iter().map(|x| x.powi(2)).sum();
    let noise_power: f32 = original
        .iter()
        .zip(reconstructed.iter())
        .map(|(o, r)| (o - r).powi(2))
        .sum();

    if noise_power == 0.0 {
        f32::INFINITY
    } else {
        10.0 * (signal_power / noise_power).log10()
    }
}

#[allow(dead_code)]
pub fn max_abs_error(original: &[f64], reconstructed: &[f64]) -> f64 {
    original
        .iter()
        .zip(reconstructed.iter())
        .map(|(o, r)| (o - r).abs())
        .fold(0.0, f64::max)
}

/// Sum of three sines plus a slow ramp, so misaligned output shows up.
#[allow(dead_code)]
pub fn test_signal(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64;
            0.3 * (t * 0.013).sin() + 0.2 * (t * 0.171).sin() + 0.1 * (t * 1.3).cos() + t * 1e-4
        })
        .collect()
}

/// Streams a mono signal through `processor` in blocks of `block` samples
/// and returns the concatenated output. Every call must report success.
#[allow(dead_code)]
pub fn stream_mono(processor: &mut Processor<f64>, signal: &[f64], block: usize) -> Vec<f64> {
    let mut output = Vec::with_capacity(signal.len());
    let mut out_block = vec![0.0; block];

    for chunk in signal.chunks(block) {
        let out = &mut out_block[..chunk.len()];
        let status = processor.execute(&[chunk], &mut [&mut *out]).unwrap();
        assert_eq!(status, ProcessStatus::Success);
        output.extend_from_slice(out);
    }
    output
}

/// Asserts that `output` is `input` delayed by `delay` samples.
#[allow(dead_code)]
pub fn assert_delayed(input: &[f64], output: &[f64], delay: usize, epsilon: f64) {
    assert_eq!(input.len(), output.len());
    let leading = delay.min(output.len());
    assert!(
        output[..leading].iter().all(|s| s.abs() <= epsilon),
        "expected {leading} leading zeros"
    );
    let err = max_abs_error(&input[..input.len() - leading], &output[leading..]);
    assert!(err <= epsilon, "max error {err:e} above {epsilon:e}");
}
