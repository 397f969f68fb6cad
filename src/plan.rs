//! Windowed real transform plans.
//!
//! A [`ForwardPlan`] turns `channels` frames of `gl` samples into
//! `channels x (M/2 + 1)` complex coefficients; an [`InversePlan`] does the
//! mirror image. Frames longer than the transform are folded (forward) or
//! periodised (inverse); shorter frames are zero-padded.

use std::sync::Arc;

use crate::config::PhaseConvention;
use crate::error::{ensure_positive, RtError, RtResult};
use crate::fft_backend::{
    Complex, FftPlannerTrait, RealFftPlanner, RealForward, RealInverse, Sample,
};
use crate::scratch::{checked_len, try_filled};
use crate::simd;

/// Common interface of the two transform directions.
pub trait FrameTransform<T: Sample> {
    type Input;
    type Output;

    /// Transforms `channels` consecutive frames from `input` into `output`
    /// (both channel-major). Performs no allocation.
    fn execute(
        &mut self,
        input: &[Self::Input],
        channels: usize,
        output: &mut [Self::Output],
    ) -> RtResult<()>;

    /// Samples per time-domain frame (the window length).
    fn frame_len(&self) -> usize;

    /// Transform size `M`.
    fn bins(&self) -> usize;

    /// Complex coefficients per channel, `M / 2 + 1`.
    fn freq_bins(&self) -> usize {
        self.bins() / 2 + 1
    }
}

/// State shared by both directions.
struct PlanCore<T: Sample> {
    window: Vec<T>,
    bins: usize,
    phase: PhaseConvention,
    /// `max(gl, M)` real samples
    time_buf: Vec<T>,
    scratch: Vec<Complex<T>>,
}

impl<T: Sample> PlanCore<T> {
    fn new(window: &[T], bins: usize, phase: PhaseConvention, scratch_len: usize) -> RtResult<Self> {
        let mut owned = try_filled(window.len(), T::zero())?;
        owned.copy_from_slice(window);

        Ok(Self {
            window: owned,
            bins,
            phase,
            time_buf: try_filled(window.len().max(bins), T::zero())?,
            scratch: try_filled(scratch_len, Complex::new(T::zero(), T::zero()))?,
        })
    }

    fn frame_len(&self) -> usize {
        self.window.len()
    }

    /// Rotation that moves the frame centre to index 0
    fn centre_shift(&self) -> usize {
        (self.frame_len() / 2) % self.bins
    }

    fn check_channels(
        &self,
        channels: usize,
        time_what: &'static str,
        time_len: usize,
        freq_what: &'static str,
        freq_len: usize,
    ) -> RtResult<()> {
        ensure_positive("channels", channels)?;

        let needed = checked_len(channels, self.frame_len())?;
        if time_len < needed {
            return Err(RtError::BufferTooShort {
                what: time_what,
                needed,
                got: time_len,
            });
        }

        let needed = checked_len(channels, self.bins / 2 + 1)?;
        if freq_len < needed {
            return Err(RtError::BufferTooShort {
                what: freq_what,
                needed,
                got: freq_len,
            });
        }
        Ok(())
    }
}

fn validate_geometry(window_len: usize, bins: usize) -> RtResult<()> {
    ensure_positive("window length", window_len)?;
    ensure_positive("bins", bins)
}

/// Analysis direction: window, fold/pad, centre, real FFT.
pub struct ForwardPlan<T: Sample> {
    core: PlanCore<T>,
    fft: Arc<dyn RealForward<T>>,
}

impl<T: Sample> ForwardPlan<T> {
    pub fn new(window: &[T], bins: usize, phase: PhaseConvention) -> RtResult<Self> {
        Self::with_backend(window, bins, phase, &mut RealFftPlanner::new())
    }

    pub fn with_backend<P: FftPlannerTrait<T> + ?Sized>(
        window: &[T],
        bins: usize,
        phase: PhaseConvention,
        planner: &mut P,
    ) -> RtResult<Self> {
        validate_geometry(window.len(), bins)?;

        let fft = planner.plan_forward(bins)?;
        if fft.len() != bins {
            return Err(RtError::EngineInitFailure(format!(
                "backend planned length {} instead of {}",
                fft.len(),
                bins
            )));
        }
        let core = PlanCore::new(window, bins, phase, fft.scratch_len())?;

        Ok(Self { core, fft })
    }

    pub fn window(&self) -> &[T] {
        &self.core.window
    }

    pub fn phase(&self) -> PhaseConvention {
        self.core.phase
    }
}

impl<T: Sample> FrameTransform<T> for ForwardPlan<T> {
    type Input = T;
    type Output = Complex<T>;

    fn execute(&mut self, frames: &[T], channels: usize, coefficients: &mut [Complex<T>]) -> RtResult<()> {
        self.core.check_channels(
            channels,
            "analysis frames",
            frames.len(),
            "spectral coefficients",
            coefficients.len(),
        )?;

        let gl = self.core.frame_len();
        let m = self.core.bins;
        let m2 = m / 2 + 1;
        let shift = self.core.centre_shift();
        let PlanCore {
            window,
            phase,
            time_buf,
            scratch,
            ..
        } = &mut self.core;

        for (frame, coeffs) in frames
            .chunks_exact(gl)
            .zip(coefficients.chunks_exact_mut(m2))
            .take(channels)
        {
            simd::apply_window(frame, window, &mut time_buf[..gl]);

            if m > gl {
                time_buf[gl..m].fill(T::zero());
            } else if gl > m {
                // Fold the tail back onto the first M samples
                for i in m..gl {
                    let folded = time_buf[i];
                    time_buf[i % m] = time_buf[i % m] + folded;
                }
            }

            if *phase == PhaseConvention::ZeroPhase {
                time_buf[..m].rotate_left(shift);
            }

            self.fft.process(&mut time_buf[..m], coeffs, scratch)?;
        }

        Ok(())
    }

    fn frame_len(&self) -> usize {
        self.core.frame_len()
    }

    fn bins(&self) -> usize {
        self.core.bins
    }
}

/// Synthesis direction: inverse real FFT, un-centre, periodise, window.
pub struct InversePlan<T: Sample> {
    core: PlanCore<T>,
    /// Coefficients of one channel; the engine consumes its input.
    freq_buf: Vec<Complex<T>>,
    fft: Arc<dyn RealInverse<T>>,
}

impl<T: Sample> InversePlan<T> {
    pub fn new(window: &[T], bins: usize, phase: PhaseConvention) -> RtResult<Self> {
        Self::with_backend(window, bins, phase, &mut RealFftPlanner::new())
    }

    pub fn with_backend<P: FftPlannerTrait<T> + ?Sized>(
        window: &[T],
        bins: usize,
        phase: PhaseConvention,
        planner: &mut P,
    ) -> RtResult<Self> {
        validate_geometry(window.len(), bins)?;

        let fft = planner.plan_inverse(bins)?;
        if fft.len() != bins {
            return Err(RtError::EngineInitFailure(format!(
                "backend planned length {} instead of {}",
                fft.len(),
                bins
            )));
        }
        let core = PlanCore::new(window, bins, phase, fft.scratch_len())?;
        let freq_buf = try_filled(bins / 2 + 1, Complex::new(T::zero(), T::zero()))?;

        Ok(Self {
            core,
            freq_buf,
            fft,
        })
    }

    pub fn window(&self) -> &[T] {
        &self.core.window
    }

    pub fn phase(&self) -> PhaseConvention {
        self.core.phase
    }
}

impl<T: Sample> FrameTransform<T> for InversePlan<T> {
    type Input = Complex<T>;
    type Output = T;

    fn execute(&mut self, coefficients: &[Complex<T>], channels: usize, frames: &mut [T]) -> RtResult<()> {
        self.core.check_channels(
            channels,
            "synthesis frames",
            frames.len(),
            "spectral coefficients",
            coefficients.len(),
        )?;

        let gl = self.core.frame_len();
        let m = self.core.bins;
        let m2 = m / 2 + 1;
        let shift = self.core.centre_shift();
        let PlanCore {
            window,
            phase,
            time_buf,
            scratch,
            ..
        } = &mut self.core;
        let freq_buf = &mut self.freq_buf;

        for (coeffs, frame) in coefficients
            .chunks_exact(m2)
            .zip(frames.chunks_exact_mut(gl))
            .take(channels)
        {
            freq_buf.copy_from_slice(coeffs);
            // A real signal has no imaginary DC (or Nyquist) component
            freq_buf[0].im = T::zero();
            if m % 2 == 0 {
                freq_buf[m2 - 1].im = T::zero();
            }

            self.fft.process(freq_buf, &mut time_buf[..m], scratch)?;

            if *phase == PhaseConvention::ZeroPhase {
                time_buf[..m].rotate_right(shift);
            }

            if gl > m {
                for i in m..gl {
                    time_buf[i] = time_buf[i % m];
                }
            }

            simd::apply_window(&time_buf[..gl], window, frame);
        }

        Ok(())
    }

    fn frame_len(&self) -> usize {
        self.core.frame_len()
    }

    fn bins(&self) -> usize {
        self.core.bins
    }
}

pub type ForwardPlanF32 = ForwardPlan<f32>;
pub type ForwardPlanF64 = ForwardPlan<f64>;
pub type InversePlanF32 = InversePlan<f32>;
pub type InversePlanF64 = InversePlan<f64>;
