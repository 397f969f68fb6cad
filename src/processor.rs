//! Block-based analysis / modification / synthesis pipeline.

use log::{debug, trace, warn};

use crate::callback::{Identity, SpectralCallback};
use crate::channels::{ChannelSink, ChannelSource, Interleaved, Planar};
use crate::config::ProcessorConfig;
use crate::error::{ensure_positive, ProcessStatus, RtError, RtResult};
use crate::fft_backend::{Complex, FftPlannerTrait, RealFftPlanner, Sample};
use crate::fifo::{BackwardFifo, ForwardFifo};
use crate::plan::{ForwardPlan, FrameTransform, InversePlan};
use crate::scratch::{checked_len, try_filled};
use crate::window::{self, WindowFamily};

/// Windows generated by [`Processor::from_window_family`], owned by the
/// processor for its whole lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedWindows<T> {
    pub family: WindowFamily,
    pub analysis: Vec<T>,
    /// Painless dual of `analysis`
    pub synthesis: Vec<T>,
}

/// Real-time STFT processor.
///
/// Each call to one of the `execute` methods pushes a block of samples in,
/// runs every frame that became complete through forward transform,
/// callback and inverse transform, and pulls the same number of samples out.
/// With a reconstructing window pair and the [`Identity`] callback the output
/// equals the input delayed by [`Processor::processing_delay`] samples.
///
/// No method allocates after construction except [`Processor::set_callback`].
pub struct Processor<T: Sample> {
    // Field order is teardown order.
    fwd_fifo: ForwardFifo<T>,
    back_fifo: BackwardFifo<T>,
    fwd_plan: ForwardPlan<T>,
    inv_plan: InversePlan<T>,
    /// `max_channels * max(gal, gsl)` samples, shared by analysis and
    /// synthesis frames
    frame_buf: Vec<T>,
    spectrum_in: Vec<Complex<T>>,
    spectrum_out: Vec<Complex<T>>,
    callback: Box<dyn SpectralCallback<T> + Send>,
    generated: Option<GeneratedWindows<T>>,
    config: ProcessorConfig,
}

impl<T: Sample> Processor<T> {
    /// Builds a processor from explicit analysis and synthesis windows.
    ///
    /// The windows are copied; their lengths set the analysis and synthesis
    /// frame lengths.
    pub fn new<C>(
        config: ProcessorConfig,
        analysis: &[T],
        synthesis: &[T],
        callback: C,
    ) -> RtResult<Self>
    where
        C: SpectralCallback<T> + Send + 'static,
    {
        Self::with_backend(config, analysis, synthesis, callback, &mut RealFftPlanner::new())
    }

    pub fn with_backend<C, P>(
        config: ProcessorConfig,
        analysis: &[T],
        synthesis: &[T],
        callback: C,
        planner: &mut P,
    ) -> RtResult<Self>
    where
        C: SpectralCallback<T> + Send + 'static,
        P: FftPlannerTrait<T> + ?Sized,
    {
        config.validate()?;
        ensure_positive("analysis window length", analysis.len())?;
        ensure_positive("synthesis window length", synthesis.len())?;

        let gal = analysis.len();
        let gsl = synthesis.len();
        let max_channels = config.max_channels;
        let processing_delay = gal.max(gsl) - 1;

        let fwd_fifo = ForwardFifo::new(
            checked_len(config.fifo_frames, gal)?,
            processing_delay,
            gal,
            config.hop,
            max_channels,
        )?;
        let back_fifo = BackwardFifo::new(
            checked_len(config.fifo_frames, gsl)?,
            gsl,
            config.hop,
            max_channels,
        )?;

        let fwd_plan = ForwardPlan::with_backend(analysis, config.bins, config.phase, planner)?;
        let inv_plan = InversePlan::with_backend(synthesis, config.bins, config.phase, planner)?;

        let zero = Complex::new(T::zero(), T::zero());
        let frame_buf = try_filled(checked_len(max_channels, gal.max(gsl))?, T::zero())?;
        let spectrum_len = checked_len(max_channels, config.freq_bins())?;
        let spectrum_in = try_filled(spectrum_len, zero)?;
        let spectrum_out = try_filled(spectrum_len, zero)?;

        debug!(
            "processor ready: analysis {gal}, synthesis {gsl}, hop {}, bins {}, channels {max_channels}, delay {processing_delay}, phase {:?}",
            config.hop, config.bins, config.phase
        );
        if gsl < gal {
            warn!(
                "synthesis window ({gsl}) shorter than analysis window ({gal}): blocks longer than about {} samples hold frames back in the input FIFO",
                back_fifo.free_space() - gsl + config.hop
            );
        }

        Ok(Self {
            fwd_fifo,
            back_fifo,
            fwd_plan,
            inv_plan,
            frame_buf,
            spectrum_in,
            spectrum_out,
            callback: Box::new(callback),
            generated: None,
            config,
        })
    }

    /// Builds a processor from a window family: `frame_len` samples of
    /// `family` for analysis and their painless dual for synthesis.
    ///
    /// Requires `frame_len <= config.bins`.
    pub fn from_window_family<C>(
        family: WindowFamily,
        frame_len: usize,
        config: ProcessorConfig,
        callback: C,
    ) -> RtResult<Self>
    where
        C: SpectralCallback<T> + Send + 'static,
    {
        Self::from_window_family_with_backend(
            family,
            frame_len,
            config,
            callback,
            &mut RealFftPlanner::new(),
        )
    }

    pub fn from_window_family_with_backend<C, P>(
        family: WindowFamily,
        frame_len: usize,
        config: ProcessorConfig,
        callback: C,
        planner: &mut P,
    ) -> RtResult<Self>
    where
        C: SpectralCallback<T> + Send + 'static,
        P: FftPlannerTrait<T> + ?Sized,
    {
        config.validate()?;
        let analysis = window::firwin(family, frame_len)?;
        let synthesis = window::painless_dual(&analysis, config.hop, config.bins)?;

        let mut processor = Self::with_backend(config, &analysis, &synthesis, callback, planner)?;
        debug!("generated {family} window pair of length {frame_len}");
        processor.generated = Some(GeneratedWindows {
            family,
            analysis,
            synthesis,
        });
        Ok(processor)
    }

    /// Replaces the spectral callback.
    pub fn set_callback<C>(&mut self, callback: C)
    where
        C: SpectralCallback<T> + Send + 'static,
    {
        self.callback = Box::new(callback);
    }

    /// Restores the pass-through callback.
    pub fn clear_callback(&mut self) {
        self.callback = Box::new(Identity);
    }

    /// Processes one block given as separate per-channel buffers.
    ///
    /// All input channels must have the same length; each output channel
    /// must be at least that long.
    pub fn execute<I, O>(&mut self, input: &[I], output: &mut [O]) -> RtResult<ProcessStatus>
    where
        I: AsRef<[T]>,
        O: AsRef<[T]> + AsMut<[T]>,
    {
        let channels = input.len();
        self.check_channels(channels)?;
        if output.len() != channels {
            return Err(RtError::InvalidArgument(format!(
                "input has {channels} channels, output has {}",
                output.len()
            )));
        }

        let len = input[0].as_ref().len();
        if input.iter().any(|c| c.as_ref().len() != len) {
            return Err(RtError::InvalidArgument(
                "input channels differ in length".into(),
            ));
        }
        ensure_positive("block length", len)?;
        if let Some(short) = output.iter().map(|c| c.as_ref().len()).find(|&l| l < len) {
            return Err(RtError::BufferTooShort {
                what: "output channel",
                needed: len,
                got: short,
            });
        }

        self.run(input, output, len)
    }

    /// Processes one block stored channel-major in a single buffer: channel
    /// `w` occupies `input[w * len..(w + 1) * len]`, same for `output`.
    pub fn execute_compact(
        &mut self,
        input: &[T],
        output: &mut [T],
        channels: usize,
    ) -> RtResult<ProcessStatus> {
        let len = self.check_block(input.len(), output.len(), channels)?;
        let source = Planar::new(input, channels);
        let mut sink = Planar::new(&mut output[..input.len()], channels);
        self.run(&source, &mut sink, len)
    }

    /// Processes one block of frame-interleaved samples (`[L, R, L, R, ...]`).
    pub fn execute_interleaved(
        &mut self,
        input: &[T],
        output: &mut [T],
        channels: usize,
    ) -> RtResult<ProcessStatus> {
        let len = self.check_block(input.len(), output.len(), channels)?;
        let source = Interleaved::new(input, channels);
        let mut sink = Interleaved::new(&mut output[..input.len()], channels);
        self.run(&source, &mut sink, len)
    }

    /// Drops all buffered audio and returns to the state right after
    /// construction. The callback is kept.
    pub fn reset(&mut self) {
        self.fwd_fifo.reset();
        self.back_fifo.reset();
    }

    /// Releases the processor.
    pub fn done(self) {
        debug!(
            "processor done: analysis {}, synthesis {}, channels {}",
            self.frame_len(),
            self.synthesis_len(),
            self.max_channels()
        );
    }

    /// Latency in samples between input and output.
    pub fn processing_delay(&self) -> usize {
        self.fwd_fifo.processing_delay()
    }

    /// Analysis frame length
    pub fn frame_len(&self) -> usize {
        self.fwd_plan.frame_len()
    }

    pub fn synthesis_len(&self) -> usize {
        self.inv_plan.frame_len()
    }

    pub fn hop(&self) -> usize {
        self.config.hop
    }

    /// Transform size `M`
    pub fn bins(&self) -> usize {
        self.config.bins
    }

    pub fn max_channels(&self) -> usize {
        self.config.max_channels
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn generated_windows(&self) -> Option<&GeneratedWindows<T>> {
        self.generated.as_ref()
    }

    fn check_channels(&self, channels: usize) -> RtResult<()> {
        ensure_positive("channels", channels)?;
        if channels > self.config.max_channels {
            return Err(RtError::InvalidArgument(format!(
                "{channels} channels exceed the configured maximum of {}",
                self.config.max_channels
            )));
        }
        Ok(())
    }

    /// Validates a single-buffer block and returns its length per channel.
    fn check_block(&self, input_len: usize, output_len: usize, channels: usize) -> RtResult<usize> {
        self.check_channels(channels)?;
        if input_len % channels != 0 {
            return Err(RtError::InvalidArgument(format!(
                "buffer of {input_len} samples does not split into {channels} channels"
            )));
        }
        let len = input_len / channels;
        ensure_positive("block length", len)?;
        if output_len < input_len {
            return Err(RtError::BufferTooShort {
                what: "output buffer",
                needed: input_len,
                got: output_len,
            });
        }
        Ok(len)
    }

    fn run<S, K>(&mut self, input: &S, output: &mut K, len: usize) -> RtResult<ProcessStatus>
    where
        S: ChannelSource<T> + ?Sized,
        K: ChannelSink<T> + ?Sized,
    {
        let written = self.fwd_fifo.write(input, len);

        let channels = self.config.max_channels;
        let bins = self.config.freq_bins();
        let analysis_len = channels * self.fwd_plan.frame_len();
        let synthesis_len = channels * self.inv_plan.frame_len();

        // Frames stay queued in the input FIFO until the output FIFO has room
        while self.back_fifo.free_space() >= self.inv_plan.frame_len()
            && self.fwd_fifo.read(&mut self.frame_buf[..analysis_len])? > 0
        {
            self.fwd_plan
                .execute(&self.frame_buf[..analysis_len], channels, &mut self.spectrum_in)?;
            self.callback
                .process(&self.spectrum_in, &mut self.spectrum_out, bins, channels);
            self.inv_plan
                .execute(&self.spectrum_out, channels, &mut self.frame_buf[..synthesis_len])?;

            let accepted = self.back_fifo.write(&self.frame_buf[..synthesis_len])?;
            debug_assert_eq!(accepted, self.inv_plan.frame_len());
        }

        let produced = self.back_fifo.read(output, len);

        let status = if written != len {
            ProcessStatus::Overflow {
                accepted: written,
                produced,
            }
        } else if produced != len {
            ProcessStatus::Underflow { produced }
        } else {
            ProcessStatus::Success
        };
        if !status.is_success() {
            trace!("block of {len} samples: {status:?}");
        }
        Ok(status)
    }
}

impl<T: Sample> Drop for Processor<T> {
    fn drop(&mut self) {
        trace!(
            "releasing processor ({} channels, {} generated windows)",
            self.config.max_channels,
            if self.generated.is_some() { 2 } else { 0 }
        );
    }
}

pub type ProcessorF32 = Processor<f32>;
pub type ProcessorF64 = Processor<f64>;
