//! Window families and the painless dual window.
//!
//! Windows are produced in natural time order: sample `0` is the frame start
//! and the peak sits at `floor(len / 2)`. All families are periodic
//! (DFT-even), which is what the zero-phase shift in the plans expects.

use std::fmt;
use std::str::FromStr;

use crate::error::{ensure_positive, RtError, RtResult};
use crate::fft_backend::Sample;
use crate::scratch::try_filled;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WindowFamily {
    Hann,
    /// Square root of Hann; analysis and synthesis windows coincide for
    /// 50% overlap.
    SqrtHann,
    Hamming,
    Blackman,
    Nuttall,
    Rect,
}

impl WindowFamily {
    pub fn name(&self) -> &'static str {
        match self {
            WindowFamily::Hann => "hann",
            WindowFamily::SqrtHann => "sqrthann",
            WindowFamily::Hamming => "hamming",
            WindowFamily::Blackman => "blackman",
            WindowFamily::Nuttall => "nuttall",
            WindowFamily::Rect => "rect",
        }
    }
}

impl fmt::Display for WindowFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindowFamily {
    type Err = RtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hann" | "hanning" => Ok(WindowFamily::Hann),
            "sqrthann" => Ok(WindowFamily::SqrtHann),
            "hamming" => Ok(WindowFamily::Hamming),
            "blackman" => Ok(WindowFamily::Blackman),
            "nuttall" => Ok(WindowFamily::Nuttall),
            "rect" | "rectangular" => Ok(WindowFamily::Rect),
            other => Err(RtError::InvalidArgument(format!(
                "unknown window family '{other}'"
            ))),
        }
    }
}

/// Generates a window of `len` samples from `family`.
pub fn firwin<T: Sample>(family: WindowFamily, len: usize) -> RtResult<Vec<T>> {
    ensure_positive("window length", len)?;

    let mut window = try_filled(len, T::zero())?;
    let two_pi = T::from_f64(2.0 * std::f64::consts::PI).unwrap_or_else(T::zero);
    let size = T::from_usize(len).unwrap_or_else(T::one);

    // Cosine-sum coefficients a0 - a1 cos + a2 cos2 - a3 cos3
    let cosine_sum = |coeffs: &[f64], angle: T| -> T {
        coeffs
            .iter()
            .enumerate()
            .fold(T::zero(), |acc, (k, &c)| {
                let term = T::from_f64(c).unwrap_or_else(T::zero)
                    * (T::from_usize(k).unwrap_or_else(T::zero) * angle).cos();
                if k % 2 == 0 {
                    acc + term
                } else {
                    acc - term
                }
            })
    };

    for (i, w) in window.iter_mut().enumerate() {
        let angle = two_pi * T::from_usize(i).unwrap_or_else(T::zero) / size;
        *w = match family {
            WindowFamily::Hann => cosine_sum(&[0.5, 0.5], angle),
            WindowFamily::SqrtHann => cosine_sum(&[0.5, 0.5], angle).max(T::zero()).sqrt(),
            WindowFamily::Hamming => cosine_sum(&[0.54, 0.46], angle),
            WindowFamily::Blackman => cosine_sum(&[0.42, 0.5, 0.08], angle),
            WindowFamily::Nuttall => {
                cosine_sum(&[0.355768, 0.487396, 0.144232, 0.012604], angle)
            }
            WindowFamily::Rect => T::one(),
        };
    }

    Ok(window)
}

/// Canonical dual of `window` for hop `hop` and transform size `bins`, in
/// the painless case (`window.len() <= bins`).
///
/// With an unnormalised inverse transform, analysis by `window` and
/// synthesis by the returned window overlap-add back to the input. Positions
/// whose shifted energies sum to zero get a zero coefficient; whether the
/// frame condition actually holds is left to the caller.
pub fn painless_dual<T: Sample>(window: &[T], hop: usize, bins: usize) -> RtResult<Vec<T>> {
    ensure_positive("window length", window.len())?;
    ensure_positive("hop", hop)?;
    ensure_positive("bins", bins)?;
    if window.len() > bins {
        return Err(RtError::InvalidArgument(format!(
            "painless dual needs window length ({}) <= bins ({})",
            window.len(),
            bins
        )));
    }

    let mut energy = try_filled(hop, T::zero())?;
    for (i, &g) in window.iter().enumerate() {
        energy[i % hop] = energy[i % hop] + g * g;
    }

    let scale = T::from_usize(bins).unwrap_or_else(T::one);
    let threshold = T::epsilon();
    let mut dual = try_filled(window.len(), T::zero())?;
    for (i, (d, &g)) in dual.iter_mut().zip(window).enumerate() {
        let e = energy[i % hop];
        if e > threshold {
            *d = g / (scale * e);
        }
    }

    Ok(dual)
}
