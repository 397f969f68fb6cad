//! Processor configuration.

use crate::error::{ensure_positive, RtError, RtResult};

/// Phase reference of the spectral coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PhaseConvention {
    /// Frame centre is the phase origin (circular shift by `-floor(gl/2)`
    /// before the forward transform, undone after the inverse).
    #[default]
    ZeroPhase,

    /// Frame start is the phase origin; no shift.
    TimeInvariant,
}

/// Number of frame lengths each FIFO can hold unless overridden.
pub const DEFAULT_FIFO_FRAMES: usize = 11;

/// Geometry shared by both plans and both FIFOs of a [`crate::Processor`].
///
/// Frame lengths are not part of the configuration; they follow from the
/// analysis and synthesis windows.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessorConfig {
    pub hop: usize,
    /// Transform size `M`; each frame yields `M / 2 + 1` bins.
    pub bins: usize,
    pub max_channels: usize,
    pub phase: PhaseConvention,
    /// FIFO capacity in frame lengths
    pub fifo_frames: usize,
}

impl ProcessorConfig {
    pub fn new(hop: usize, bins: usize, max_channels: usize) -> RtResult<Self> {
        let config = Self {
            hop,
            bins,
            max_channels,
            phase: PhaseConvention::default(),
            fifo_frames: DEFAULT_FIFO_FRAMES,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_phase(mut self, phase: PhaseConvention) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_fifo_frames(mut self, fifo_frames: usize) -> RtResult<Self> {
        self.fifo_frames = fifo_frames;
        self.validate()?;
        Ok(self)
    }

    /// Complex coefficients per channel and frame.
    pub fn freq_bins(&self) -> usize {
        self.bins / 2 + 1
    }

    pub fn validate(&self) -> RtResult<()> {
        ensure_positive("hop", self.hop)?;
        ensure_positive("bins", self.bins)?;
        ensure_positive("max_channels", self.max_channels)?;
        if self.fifo_frames < 2 {
            return Err(RtError::InvalidArgument(format!(
                "fifo_frames must be at least 2, got {}",
                self.fifo_frames
            )));
        }
        Ok(())
    }
}
