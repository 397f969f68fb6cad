//! Error and status types.

use thiserror::Error;

/// Errors raised while building or driving the processing pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RtError {
    /// A length, size or channel count is zero, or arguments disagree.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A caller-supplied buffer cannot hold the requested data.
    #[error("buffer too short for {what}: need {needed}, got {got}")]
    BufferTooShort {
        what: &'static str,
        needed: usize,
        got: usize,
    },

    /// Reserving an internal buffer failed.
    #[error("allocation of {requested} elements failed")]
    AllocationFailure { requested: usize },

    /// The FFT backend could not create a plan.
    #[error("transform engine initialisation failed: {0}")]
    EngineInitFailure(String),

    /// The FFT backend rejected a call at run time.
    #[error("transform engine failed: {0}")]
    TransformFailure(String),
}

pub type RtResult<T> = Result<T, RtError>;

/// Outcome of one processor call.
///
/// Neither `Overflow` nor `Underflow` is fatal: the pipeline stays consistent
/// and the next call may proceed. `Underflow` is expected while the pipeline
/// fills up.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Whole block absorbed and whole block produced.
    Success,
    /// Only `accepted` input samples per channel fit into the input FIFO; the
    /// rest were dropped.
    Overflow { accepted: usize, produced: usize },
    /// All input absorbed, but only `produced` output samples were ready.
    Underflow { produced: usize },
}

impl ProcessStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessStatus::Success)
    }

    /// Samples per channel written to the output, or `None` for `Success`
    /// (where it equals the block length).
    pub fn produced(&self) -> Option<usize> {
        match *self {
            ProcessStatus::Success => None,
            ProcessStatus::Overflow { produced, .. } | ProcessStatus::Underflow { produced } => {
                Some(produced)
            }
        }
    }
}

/// Shorthand for the positivity checks every constructor performs.
pub(crate) fn ensure_positive(name: &str, value: usize) -> RtResult<()> {
    if value == 0 {
        return Err(RtError::InvalidArgument(format!("{name} must be positive")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = RtError::BufferTooShort {
            what: "output channel",
            needed: 256,
            got: 128,
        };
        assert_eq!(
            err.to_string(),
            "buffer too short for output channel: need 256, got 128"
        );

        let err = ensure_positive("hop", 0).unwrap_err();
        assert_eq!(err.to_string(), "invalid argument: hop must be positive");
        assert!(ensure_positive("hop", 1).is_ok());
    }

    #[test]
    fn test_status_accessors() {
        assert!(ProcessStatus::Success.is_success());
        assert_eq!(ProcessStatus::Success.produced(), None);

        let status = ProcessStatus::Overflow {
            accepted: 10,
            produced: 4,
        };
        assert!(!status.is_success());
        assert_eq!(status.produced(), Some(4));
        assert_eq!(ProcessStatus::Underflow { produced: 7 }.produced(), Some(7));
    }
}
