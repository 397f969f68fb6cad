/*MIT License

Copyright (c) 2025 David Maseda Neira

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! FFT backend abstraction layer
//!
//! The transform plans only need two operations from an FFT engine: an
//! unnormalised real-to-complex transform and its complex-to-real mirror.
//! This module defines that contract and ships the default implementation
//! on top of `realfft`/`rustfft`.
//!
//! Custom engines plug in by implementing [`FftPlannerTrait`] and handing the
//! planner to the `with_backend` constructors.

use std::fmt;
use std::sync::Arc;

use num_traits::{Float, FromPrimitive};

pub use rustfft::num_complex::Complex;

use crate::error::{RtError, RtResult};

/// Sample types the pipeline can run on (`f32` and `f64`).
pub trait Sample:
    Float + FromPrimitive + rustfft::FftNum + fmt::Debug + Send + Sync + 'static
{
}

impl<T> Sample for T where
    T: Float + FromPrimitive + rustfft::FftNum + fmt::Debug + Send + Sync + 'static
{
}

/// Unnormalised real-to-complex transform of a fixed length `n`.
///
/// `input` has `n` samples and may be used as scratch; `output` receives
/// `n / 2 + 1` bins.
pub trait RealForward<T: Sample>: Send + Sync {
    fn process(
        &self,
        input: &mut [T],
        output: &mut [Complex<T>],
        scratch: &mut [Complex<T>],
    ) -> RtResult<()>;

    /// Transform length
    fn len(&self) -> usize;

    /// Scratch elements `process` needs
    fn scratch_len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unnormalised complex-to-real transform of a fixed length `n`.
///
/// `input` holds `n / 2 + 1` bins and may be used as scratch. The imaginary
/// parts of DC (and Nyquist for even `n`) must be zero.
pub trait RealInverse<T: Sample>: Send + Sync {
    fn process(
        &self,
        input: &mut [Complex<T>],
        output: &mut [T],
        scratch: &mut [Complex<T>],
    ) -> RtResult<()>;

    fn len(&self) -> usize;

    fn scratch_len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Planner creating forward and inverse real transforms
pub trait FftPlannerTrait<T: Sample> {
    fn plan_forward(&mut self, len: usize) -> RtResult<Arc<dyn RealForward<T>>>;

    fn plan_inverse(&mut self, len: usize) -> RtResult<Arc<dyn RealInverse<T>>>;
}

// ============================================================================
// realfft backend
// ============================================================================

mod realfft_impl {
    use super::*;
    use realfft::{ComplexToReal, RealToComplex};

    struct RealFftForward<T: Sample> {
        fft: Arc<dyn RealToComplex<T>>,
    }

    impl<T: Sample> RealForward<T> for RealFftForward<T> {
        fn process(
            &self,
            input: &mut [T],
            output: &mut [Complex<T>],
            scratch: &mut [Complex<T>],
        ) -> RtResult<()> {
            self.fft
                .process_with_scratch(input, output, scratch)
                .map_err(|e| RtError::TransformFailure(e.to_string()))
        }

        fn len(&self) -> usize {
            self.fft.len()
        }

        fn scratch_len(&self) -> usize {
            self.fft.get_scratch_len()
        }
    }

    struct RealFftInverse<T: Sample> {
        fft: Arc<dyn ComplexToReal<T>>,
    }

    impl<T: Sample> RealInverse<T> for RealFftInverse<T> {
        fn process(
            &self,
            input: &mut [Complex<T>],
            output: &mut [T],
            scratch: &mut [Complex<T>],
        ) -> RtResult<()> {
            self.fft
                .process_with_scratch(input, output, scratch)
                .map_err(|e| RtError::TransformFailure(e.to_string()))
        }

        fn len(&self) -> usize {
            self.fft.len()
        }

        fn scratch_len(&self) -> usize {
            self.fft.get_scratch_len()
        }
    }

    /// Default planner, backed by `realfft::RealFftPlanner`.
    ///
    /// Plans are cached, so a forward and an inverse plan of the same length
    /// share twiddle tables.
    pub struct RealFftPlanner<T: Sample> {
        planner: realfft::RealFftPlanner<T>,
    }

    impl<T: Sample> RealFftPlanner<T> {
        pub fn new() -> Self {
            Self {
                planner: realfft::RealFftPlanner::new(),
            }
        }
    }

    impl<T: Sample> Default for RealFftPlanner<T> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<T: Sample> FftPlannerTrait<T> for RealFftPlanner<T> {
        fn plan_forward(&mut self, len: usize) -> RtResult<Arc<dyn RealForward<T>>> {
            if len == 0 {
                return Err(RtError::EngineInitFailure(
                    "cannot plan a zero-length transform".into(),
                ));
            }
            Ok(Arc::new(RealFftForward {
                fft: self.planner.plan_fft_forward(len),
            }))
        }

        fn plan_inverse(&mut self, len: usize) -> RtResult<Arc<dyn RealInverse<T>>> {
            if len == 0 {
                return Err(RtError::EngineInitFailure(
                    "cannot plan a zero-length transform".into(),
                ));
            }
            Ok(Arc::new(RealFftInverse {
                fft: self.planner.plan_fft_inverse(len),
            }))
        }
    }
}

pub use realfft_impl::RealFftPlanner;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_forward_impulse_is_flat() {
        let mut planner = RealFftPlanner::<f64>::new();
        let fft = planner.plan_forward(8).unwrap();
        assert_eq!(fft.len(), 8);

        let mut input = vec![0.0; 8];
        input[0] = 1.0;
        let mut output = vec![Complex::new(0.0, 0.0); 5];
        let mut scratch = vec![Complex::new(0.0, 0.0); fft.scratch_len()];
        fft.process(&mut input, &mut output, &mut scratch).unwrap();

        for bin in &output {
            assert_abs_diff_eq!(bin.re, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(bin.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_roundtrip_is_unnormalised() {
        let mut planner = RealFftPlanner::<f64>::new();
        let fwd = planner.plan_forward(6).unwrap();
        let inv = planner.plan_inverse(6).unwrap();

        let original = [0.5, -1.0, 2.0, 0.25, 3.0, -0.75];
        let mut input = original.to_vec();
        let mut spectrum = vec![Complex::new(0.0, 0.0); 4];
        let mut scratch =
            vec![Complex::new(0.0, 0.0); fwd.scratch_len().max(inv.scratch_len())];
        fwd.process(&mut input, &mut spectrum, &mut scratch).unwrap();

        let mut output = vec![0.0; 6];
        inv.process(&mut spectrum, &mut output, &mut scratch).unwrap();

        for (o, r) in original.iter().zip(output.iter()) {
            assert_abs_diff_eq!(o * 6.0, *r, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_zero_length_plan_is_rejected() {
        let mut planner = RealFftPlanner::<f32>::default();
        assert!(matches!(
            planner.plan_forward(0),
            Err(RtError::EngineInitFailure(_))
        ));
        assert!(matches!(
            planner.plan_inverse(0),
            Err(RtError::EngineInitFailure(_))
        ));
    }
}
