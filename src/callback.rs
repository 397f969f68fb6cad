//! Spectral processing hook.

use crate::fft_backend::{Complex, Sample};

/// User processing applied to every spectral frame.
///
/// `input` and `output` both hold `channels * bins` coefficients,
/// channel-major: channel `w` occupies `[w * bins..(w + 1) * bins]`. `output`
/// arrives with stale contents from the previous frame and must be fully
/// written.
///
/// Any state the callback needs lives in the implementor. Closures with the
/// matching signature implement this trait directly:
///
/// ```
/// use rt_stft::prelude::*;
///
/// let mut gain = 0.5f32;
/// let _attenuate = move |input: &[Complex<f32>],
///                        output: &mut [Complex<f32>],
///                        _bins: usize,
///                        _channels: usize| {
///     for (o, i) in output.iter_mut().zip(input) {
///         *o = *i * gain;
///     }
///     gain *= 0.99;
/// };
/// ```
pub trait SpectralCallback<T: Sample> {
    fn process(
        &mut self,
        input: &[Complex<T>],
        output: &mut [Complex<T>],
        bins: usize,
        channels: usize,
    );
}

impl<T, F> SpectralCallback<T> for F
where
    T: Sample,
    F: FnMut(&[Complex<T>], &mut [Complex<T>], usize, usize),
{
    fn process(
        &mut self,
        input: &[Complex<T>],
        output: &mut [Complex<T>],
        bins: usize,
        channels: usize,
    ) {
        self(input, output, bins, channels)
    }
}

/// Passes coefficients through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T: Sample> SpectralCallback<T> for Identity {
    fn process(
        &mut self,
        input: &[Complex<T>],
        output: &mut [Complex<T>],
        _bins: usize,
        _channels: usize,
    ) {
        output.copy_from_slice(input);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run<C: SpectralCallback<f64>>(cb: &mut C, input: &[Complex<f64>]) -> Vec<Complex<f64>> {
        let mut output = vec![Complex::new(0.0, 0.0); input.len()];
        cb.process(input, &mut output, input.len(), 1);
        output
    }

    #[test]
    fn test_identity_copies() {
        let input = vec![Complex::new(1.0, -2.0), Complex::new(0.5, 0.25)];
        assert_eq!(run(&mut Identity, &input), input);
    }

    #[test]
    fn test_closure_keeps_state() {
        let mut calls = 0;
        let mut cb = |input: &[Complex<f64>], output: &mut [Complex<f64>], _: usize, _: usize| {
            calls += 1;
            for (o, i) in output.iter_mut().zip(input) {
                *o = i.conj();
            }
        };

        let input = vec![Complex::new(1.0, 1.0)];
        assert_eq!(run(&mut cb, &input), vec![Complex::new(1.0, -1.0)]);
        run(&mut cb, &input);
        assert_eq!(calls, 2);
    }
}
