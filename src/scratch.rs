//! Fallible buffer allocation.
//!
//! Every buffer the pipeline owns is reserved here once, at construction,
//! so an exhausted allocator surfaces as [`RtError::AllocationFailure`]
//! instead of an abort.

use crate::error::{RtError, RtResult};

/// Allocates `len` copies of `value`.
pub(crate) fn try_filled<T: Clone>(len: usize, value: T) -> RtResult<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| RtError::AllocationFailure { requested: len })?;
    buf.resize(len, value);
    Ok(buf)
}

/// `a * b`, reported as an allocation failure on overflow since the product
/// is always a buffer size.
pub(crate) fn checked_len(a: usize, b: usize) -> RtResult<usize> {
    a.checked_mul(b)
        .ok_or(RtError::AllocationFailure { requested: usize::MAX })
}
