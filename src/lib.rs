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

//! Real-time short-time Fourier transform processing for streaming
//! multi-channel audio.
//!
//! A [`Processor`] takes blocks of any length, cuts them into overlapping
//! frames, runs each frame through a windowed real FFT, hands the spectrum to
//! a [`SpectralCallback`], transforms the result back and overlap-adds it into
//! the output stream. Latency is fixed at [`Processor::processing_delay`]
//! samples and nothing is allocated once the processor is built.
//!
//! ```
//! use rt_stft::prelude::*;
//!
//! let config = ProcessorConfig::new(256, 1024, 2).unwrap();
//! let mut processor =
//!     ProcessorF32::from_window_family(WindowFamily::Hann, 1024, config, Identity).unwrap();
//!
//! let left = vec![0.0f32; 256];
//! let right = vec![0.0f32; 256];
//! let mut out_left = vec![0.0f32; 256];
//! let mut out_right = vec![0.0f32; 256];
//!
//! let status = processor
//!     .execute(&[&left, &right], &mut [&mut out_left, &mut out_right])
//!     .unwrap();
//! assert!(status.is_success());
//! ```

pub mod callback;
pub mod channels;
pub mod config;
pub mod error;
pub mod fft_backend;
pub mod fifo;
pub mod plan;
pub mod processor;
pub mod window;

pub mod simd;

mod scratch;

pub use callback::{Identity, SpectralCallback};
pub use channels::{ChannelSink, ChannelSource, Interleaved, Planar};
pub use config::{PhaseConvention, ProcessorConfig, DEFAULT_FIFO_FRAMES};
pub use error::{ProcessStatus, RtError, RtResult};
pub use fft_backend::{Complex, FftPlannerTrait, RealFftPlanner, RealForward, RealInverse, Sample};
pub use fifo::{BackwardFifo, BackwardFifoF32, BackwardFifoF64, ForwardFifo, ForwardFifoF32, ForwardFifoF64};
pub use plan::{
    ForwardPlan, ForwardPlanF32, ForwardPlanF64, FrameTransform, InversePlan, InversePlanF32,
    InversePlanF64,
};
pub use processor::{GeneratedWindows, Processor, ProcessorF32, ProcessorF64};
pub use window::{firwin, painless_dual, WindowFamily};

pub mod prelude {
    pub use crate::{
        Complex, FrameTransform, Identity, PhaseConvention, ProcessStatus, Processor,
        ProcessorConfig, ProcessorF32, ProcessorF64, RtError, RtResult, SpectralCallback,
        WindowFamily,
    };
}
