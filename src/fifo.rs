//! Ring-buffer FIFOs between caller blocks and fixed-hop frames.
//!
//! [`ForwardFifo`] accepts blocks of any length and hands out overlapping
//! analysis frames of `frame_len` samples, one every `hop` samples.
//! [`BackwardFifo`] does the reverse: it overlap-adds synthesis frames and
//! hands the finished samples out in blocks of any length.
//!
//! Both store `max_channels` channels channel-major, one circular buffer per
//! channel, and never allocate after construction.

use crate::channels::{ChannelSink, ChannelSource};
use crate::error::{ensure_positive, RtError, RtResult};
use crate::fft_backend::Sample;
use crate::scratch::{checked_len, try_filled};
use crate::simd;

fn validate_geometry(capacity: usize, frame_len: usize, hop: usize, max_channels: usize) -> RtResult<()> {
    ensure_positive("capacity", capacity)?;
    ensure_positive("frame length", frame_len)?;
    ensure_positive("hop", hop)?;
    ensure_positive("max_channels", max_channels)?;

    if hop > frame_len {
        return Err(RtError::InvalidArgument(format!(
            "hop ({hop}) must not exceed frame length ({frame_len})"
        )));
    }
    if capacity <= frame_len + 1 {
        return Err(RtError::InvalidArgument(format!(
            "capacity ({capacity}) must exceed frame length + 1 ({})",
            frame_len + 1
        )));
    }
    Ok(())
}

/// Splits `count` samples starting at `start` into the part before the end
/// of a ring of `ring_len` samples and the part that wraps to the front.
#[inline]
fn split_at_wrap(start: usize, count: usize, ring_len: usize) -> (usize, usize) {
    let head = count.min(ring_len - start);
    (head, count - head)
}

/// Input FIFO: blocks in, overlapping frames out.
pub struct ForwardFifo<T: Sample> {
    buf: Vec<T>,
    /// Samples per channel ring, `capacity + 1`
    buf_len: usize,
    read_pos: usize,
    write_pos: usize,
    processing_delay: usize,
    frame_len: usize,
    hop: usize,
    max_channels: usize,
}

impl<T: Sample> ForwardFifo<T> {
    /// Creates a FIFO holding up to `capacity` samples per channel.
    ///
    /// The FIFO starts with `processing_delay` zero samples queued, so the
    /// first frame comes out once `frame_len - processing_delay` samples have
    /// been written.
    pub fn new(
        capacity: usize,
        processing_delay: usize,
        frame_len: usize,
        hop: usize,
        max_channels: usize,
    ) -> RtResult<Self> {
        validate_geometry(capacity, frame_len, hop, max_channels)?;
        if processing_delay + 1 < frame_len {
            return Err(RtError::InvalidArgument(format!(
                "processing delay ({processing_delay}) must be at least frame length - 1 ({})",
                frame_len - 1
            )));
        }
        if processing_delay > capacity {
            return Err(RtError::InvalidArgument(format!(
                "processing delay ({processing_delay}) exceeds capacity ({capacity})"
            )));
        }

        let buf_len = capacity.checked_add(1).ok_or(RtError::AllocationFailure {
            requested: usize::MAX,
        })?;
        let buf = try_filled(checked_len(buf_len, max_channels)?, T::zero())?;

        Ok(Self {
            buf,
            buf_len,
            read_pos: (buf_len - processing_delay) % buf_len,
            write_pos: 0,
            processing_delay,
            frame_len,
            hop,
            max_channels,
        })
    }

    /// Samples per channel queued and not yet consumed by a hop.
    pub fn available(&self) -> usize {
        (self.write_pos + self.buf_len - self.read_pos) % self.buf_len
    }

    /// Samples per channel that can be written without overflow.
    pub fn free_space(&self) -> usize {
        self.buf_len - 1 - self.available()
    }

    pub fn processing_delay(&self) -> usize {
        self.processing_delay
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    pub fn max_channels(&self) -> usize {
        self.max_channels
    }

    /// Writes up to `len` samples per channel from `source`.
    ///
    /// Channels the source does not have are filled with zeros; channels
    /// beyond `max_channels` are ignored. Returns the number of samples
    /// written per channel, which is short of `len` when the FIFO is full.
    pub fn write<S: ChannelSource<T> + ?Sized>(&mut self, source: &S, len: usize) -> usize {
        let count = len.min(source.frames()).min(self.free_space());
        if count == 0 {
            return 0;
        }

        let start = self.write_pos;
        let (head, tail) = split_at_wrap(start, count, self.buf_len);
        let source_channels = source.channels();

        for (w, ring) in self
            .buf
            .chunks_exact_mut(self.buf_len)
            .take(self.max_channels)
            .enumerate()
        {
            if w < source_channels {
                source.copy_to(w, 0, &mut ring[start..start + head]);
                source.copy_to(w, head, &mut ring[..tail]);
            } else {
                ring[start..start + head].fill(T::zero());
                ring[..tail].fill(T::zero());
            }
        }

        self.write_pos = (start + count) % self.buf_len;
        count
    }

    /// Copies the next frame of every channel into `out` (channel-major,
    /// `frame_len` samples per channel) and advances by one hop.
    ///
    /// Returns `Ok(0)` when less than a full frame is queued.
    pub fn read(&mut self, out: &mut [T]) -> RtResult<usize> {
        let needed = checked_len(self.max_channels, self.frame_len)?;
        if out.len() < needed {
            return Err(RtError::BufferTooShort {
                what: "analysis frame buffer",
                needed,
                got: out.len(),
            });
        }

        if self.available() < self.frame_len {
            return Ok(0);
        }

        let start = self.read_pos;
        let (head, tail) = split_at_wrap(start, self.frame_len, self.buf_len);

        for (ring, frame) in self
            .buf
            .chunks_exact(self.buf_len)
            .zip(out.chunks_exact_mut(self.frame_len))
            .take(self.max_channels)
        {
            frame[..head].copy_from_slice(&ring[start..start + head]);
            frame[head..].copy_from_slice(&ring[..tail]);
        }

        self.read_pos = (start + self.hop) % self.buf_len;
        Ok(self.frame_len)
    }

    /// Returns to the state right after construction.
    pub fn reset(&mut self) {
        self.buf.fill(T::zero());
        self.write_pos = 0;
        self.read_pos = (self.buf_len - self.processing_delay) % self.buf_len;
    }
}

/// Output FIFO: overlapping frames in, blocks out.
pub struct BackwardFifo<T: Sample> {
    buf: Vec<T>,
    /// Samples per channel ring, `capacity + frame_len + 1`
    buf_len: usize,
    read_pos: usize,
    write_pos: usize,
    frame_len: usize,
    hop: usize,
    max_channels: usize,
}

impl<T: Sample> BackwardFifo<T> {
    pub fn new(capacity: usize, frame_len: usize, hop: usize, max_channels: usize) -> RtResult<Self> {
        validate_geometry(capacity, frame_len, hop, max_channels)?;

        let buf_len = capacity
            .checked_add(frame_len + 1)
            .ok_or(RtError::AllocationFailure {
                requested: usize::MAX,
            })?;
        let buf = try_filled(checked_len(buf_len, max_channels)?, T::zero())?;

        Ok(Self {
            buf,
            buf_len,
            read_pos: 0,
            write_pos: 0,
            frame_len,
            hop,
            max_channels,
        })
    }

    /// Finished samples per channel ready to be read.
    pub fn available(&self) -> usize {
        (self.write_pos + self.buf_len - self.read_pos) % self.buf_len
    }

    pub fn free_space(&self) -> usize {
        self.buf_len - 1 - self.available()
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    pub fn max_channels(&self) -> usize {
        self.max_channels
    }

    /// Overlap-adds one synthesis frame per channel (channel-major,
    /// `frame_len` samples each) at the write cursor, then advances it by one
    /// hop.
    ///
    /// Returns `Ok(0)` without touching the buffer if a whole frame does not
    /// fit.
    pub fn write(&mut self, frame: &[T]) -> RtResult<usize> {
        let needed = checked_len(self.max_channels, self.frame_len)?;
        if frame.len() < needed {
            return Err(RtError::BufferTooShort {
                what: "synthesis frame buffer",
                needed,
                got: frame.len(),
            });
        }

        if self.free_space() < self.frame_len {
            return Ok(0);
        }

        let start = self.write_pos;
        let (head, tail) = split_at_wrap(start, self.frame_len, self.buf_len);

        for (ring, chunk) in self
            .buf
            .chunks_exact_mut(self.buf_len)
            .zip(frame.chunks_exact(self.frame_len))
            .take(self.max_channels)
        {
            simd::accumulate(&chunk[..head], &mut ring[start..start + head]);
            simd::accumulate(&chunk[head..], &mut ring[..tail]);
        }

        self.write_pos = (start + self.hop) % self.buf_len;
        Ok(self.frame_len)
    }

    /// Moves up to `len` finished samples per channel into `sink` and zeroes
    /// the consumed positions on every channel.
    ///
    /// Channels the sink does not have are cleared too, so they never keep
    /// accumulating overlap-adds.
    ///
    /// Returns the number of samples read per channel; a short count means
    /// the pipeline has not produced enough yet.
    pub fn read<K: ChannelSink<T> + ?Sized>(&mut self, sink: &mut K, len: usize) -> usize {
        let count = len.min(sink.frames()).min(self.available());
        if count == 0 {
            return 0;
        }

        let start = self.read_pos;
        let (head, tail) = split_at_wrap(start, count, self.buf_len);
        let sink_channels = sink.channels();

        for (w, ring) in self
            .buf
            .chunks_exact_mut(self.buf_len)
            .take(self.max_channels)
            .enumerate()
        {
            if w < sink_channels {
                sink.copy_from(w, 0, &ring[start..start + head]);
                sink.copy_from(w, head, &ring[..tail]);
            }
            ring[start..start + head].fill(T::zero());
            ring[..tail].fill(T::zero());
        }

        self.read_pos = (start + count) % self.buf_len;
        count
    }

    pub fn reset(&mut self) {
        self.buf.fill(T::zero());
        self.read_pos = 0;
        self.write_pos = 0;
    }
}

pub type ForwardFifoF32 = ForwardFifo<f32>;
pub type ForwardFifoF64 = ForwardFifo<f64>;
pub type BackwardFifoF32 = BackwardFifo<f32>;
pub type BackwardFifoF64 = BackwardFifo<f64>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::Planar;

    fn ramp(start: usize, len: usize) -> Vec<f64> {
        (start..start + len).map(|i| i as f64).collect()
    }

    #[test]
    fn test_forward_initial_delay() {
        let fifo = ForwardFifo::<f64>::new(32, 7, 8, 2, 1).unwrap();
        assert_eq!(fifo.available(), 7);
        assert_eq!(fifo.free_space(), 25);
        assert_eq!(fifo.processing_delay(), 7);
    }

    #[test]
    fn test_forward_frames_overlap() {
        let (gl, hop) = (8, 3);
        let mut fifo = ForwardFifo::<f64>::new(40, gl - 1, gl, hop, 1).unwrap();
        let data = ramp(1, 20);
        assert_eq!(fifo.write(&[&data[..]], 20), 20);

        let mut frame = vec![0.0; gl];
        let mut frames = Vec::new();
        while fifo.read(&mut frame).unwrap() > 0 {
            frames.push(frame.clone());
        }

        // 27 samples queued: floor((27 - 8) / 3) + 1 frames
        assert_eq!(frames.len(), 7);
        // Leading zeros come from the initial delay
        assert_eq!(frames[0], vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        for pair in frames.windows(2) {
            assert_eq!(pair[0][hop..], pair[1][..gl - hop]);
        }
        assert_eq!(fifo.available(), 27 - 7 * hop);
    }

    #[test]
    fn test_forward_wraparound() {
        let (gl, hop) = (4, 4);
        let mut fifo = ForwardFifo::<f64>::new(10, gl - 1, gl, hop, 1).unwrap();
        let mut frame = vec![0.0; gl];
        let mut collected = Vec::new();

        for block in 0..10 {
            let data = ramp(1 + block * 5, 5);
            assert_eq!(fifo.write(&[&data[..]], 5), 5);
            while fifo.read(&mut frame).unwrap() > 0 {
                collected.extend_from_slice(&frame);
            }
        }

        let mut expected = vec![0.0; gl - 1];
        expected.extend(ramp(1, 50));
        assert_eq!(collected[..], expected[..collected.len()]);
        assert_eq!(collected.len(), 52);
    }

    #[test]
    fn test_forward_overflow_keeps_prefix() {
        let mut fifo = ForwardFifo::<f64>::new(10, 3, 4, 4, 1).unwrap();
        assert_eq!(fifo.free_space(), 7);

        let data = ramp(1, 12);
        assert_eq!(fifo.write(&[&data[..]], 12), 7);
        assert_eq!(fifo.free_space(), 0);
        assert_eq!(fifo.write(&[&data[..]], 12), 0);

        let mut frame = vec![0.0; 4];
        assert_eq!(fifo.read(&mut frame).unwrap(), 4);
        assert_eq!(frame, vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(fifo.read(&mut frame).unwrap(), 4);
        assert_eq!(frame, vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(fifo.read(&mut frame).unwrap(), 0);
        assert_eq!(fifo.available(), 2);
    }

    #[test]
    fn test_forward_missing_channels_are_zero() {
        let mut fifo = ForwardFifo::<f64>::new(16, 3, 4, 4, 2).unwrap();
        let data = ramp(1, 4);
        assert_eq!(fifo.write(&[&data[..]], 4), 4);

        let mut frames = vec![-1.0; 8];
        assert_eq!(fifo.read(&mut frames).unwrap(), 4);
        assert_eq!(frames[..4], [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(frames[4..], [0.0; 4]);
    }

    #[test]
    fn test_forward_read_checks_buffer() {
        let mut fifo = ForwardFifo::<f32>::new(16, 3, 4, 2, 2).unwrap();
        let mut small = vec![0.0f32; 7];
        assert!(matches!(
            fifo.read(&mut small),
            Err(RtError::BufferTooShort { needed: 8, got: 7, .. })
        ));
    }

    #[test]
    fn test_forward_reset() {
        let mut fifo = ForwardFifo::<f64>::new(16, 5, 4, 2, 1).unwrap();
        let data = ramp(1, 9);
        fifo.write(&[&data[..]], 9);
        let mut frame = vec![0.0; 4];
        while fifo.read(&mut frame).unwrap() > 0 {}

        fifo.reset();
        assert_eq!(fifo.available(), 5);
        assert_eq!(fifo.free_space(), 11);
    }

    #[test]
    fn test_forward_rejects_bad_geometry() {
        // Delay shorter than frame length - 1
        assert!(ForwardFifo::<f32>::new(32, 6, 8, 2, 1).is_err());
        // Capacity not above frame length + 1
        assert!(ForwardFifo::<f32>::new(9, 7, 8, 2, 1).is_err());
        // Hop longer than the frame
        assert!(ForwardFifo::<f32>::new(32, 7, 8, 9, 1).is_err());
        assert!(matches!(
            ForwardFifo::<f32>::new(32, 7, 8, 2, 0),
            Err(RtError::InvalidArgument(_))
        ));
        assert!(ForwardFifo::<f32>::new(32, 40, 8, 2, 1).is_err());
    }

    #[test]
    fn test_backward_overlap_add() {
        let (gl, hop) = (4, 2);
        let mut fifo = BackwardFifo::<f64>::new(16, gl, hop, 1).unwrap();
        assert_eq!(fifo.write(&[1.0, 1.0, 1.0, 1.0]).unwrap(), gl);
        assert_eq!(fifo.write(&[10.0, 10.0, 10.0, 10.0]).unwrap(), gl);
        assert_eq!(fifo.available(), 2 * hop);

        let mut out = vec![0.0; 8];
        let read = fifo.read(&mut Planar::new(&mut out[..], 1), 8);
        assert_eq!(read, 4);
        assert_eq!(out[..4], [1.0, 1.0, 11.0, 11.0]);

        // Nothing new was written
        assert_eq!(fifo.read(&mut Planar::new(&mut out[..], 1), 8), 0);

        // The pending tail of the second frame is still there, the consumed
        // positions were zeroed
        fifo.write(&[0.0; 4]).unwrap();
        let read = fifo.read(&mut Planar::new(&mut out[..], 1), 8);
        assert_eq!(read, 2);
        assert_eq!(out[..2], [10.0, 10.0]);
    }

    #[test]
    fn test_backward_underflow_is_short_read() {
        let mut fifo = BackwardFifo::<f32>::new(16, 4, 1, 2).unwrap();
        fifo.write(&[1.0f32; 8]).unwrap();

        let mut left = vec![0.0f32; 5];
        let mut right = vec![0.0f32; 5];
        let mut sink = [&mut left[..], &mut right[..]];
        assert_eq!(fifo.read(&mut sink, 5), 1);
        assert_eq!(left[0], 1.0);
        assert_eq!(right[0], 1.0);
        assert_eq!(left[1..], [0.0; 4]);
    }

    #[test]
    fn test_backward_rejects_when_full() {
        let (gl, hop) = (4, 4);
        let mut fifo = BackwardFifo::<f64>::new(6, gl, hop, 1).unwrap();
        // Ring of 11 samples, 10 usable
        assert_eq!(fifo.write(&[1.0; 4]).unwrap(), 4);
        assert_eq!(fifo.write(&[1.0; 4]).unwrap(), 4);
        assert_eq!(fifo.free_space(), 2);
        assert_eq!(fifo.write(&[1.0; 4]).unwrap(), 0);
        assert_eq!(fifo.available(), 8);
    }

    #[test]
    fn test_backward_wraparound_zeroes() {
        let (gl, hop) = (4, 2);
        let mut fifo = BackwardFifo::<f64>::new(6, gl, hop, 1).unwrap();
        let mut out = vec![0.0; 2];
        let mut collected = Vec::new();

        for _ in 0..12 {
            assert_eq!(fifo.write(&[1.0; 4]).unwrap(), 4);
            let read = fifo.read(&mut Planar::new(&mut out[..], 1), 2);
            collected.extend_from_slice(&out[..read]);
        }

        // First hop sees a single frame, everything after sees two
        assert_eq!(collected[..2], [1.0, 1.0]);
        assert!(collected[2..].iter().all(|&s| s == 2.0));
        assert_eq!(collected.len(), 24);
    }

    #[test]
    fn test_backward_read_clears_channels_missing_from_sink() {
        let mut fifo = BackwardFifo::<f64>::new(8, 4, 4, 2).unwrap();
        let mut mono = vec![0.0; 4];

        // Enough frames to wrap the 13-sample ring, reading only the left channel
        for _ in 0..5 {
            assert_eq!(fifo.write(&[1.0; 8]).unwrap(), 4);
            assert_eq!(fifo.read(&mut Planar::new(&mut mono[..], 1), 4), 4);
            assert_eq!(mono, [1.0; 4]);
        }

        fifo.write(&[1.0; 8]).unwrap();
        let mut left = vec![0.0; 4];
        let mut right = vec![0.0; 4];
        assert_eq!(fifo.read(&mut [&mut left[..], &mut right[..]], 4), 4);
        assert_eq!(right, [1.0; 4]);
    }

    #[test]
    fn test_backward_reset_and_buffer_check() {
        let mut fifo = BackwardFifo::<f64>::new(8, 4, 2, 2).unwrap();
        assert!(matches!(
            fifo.write(&[0.0; 4]),
            Err(RtError::BufferTooShort { needed: 8, .. })
        ));
        fifo.write(&[1.0; 8]).unwrap();
        fifo.reset();
        assert_eq!(fifo.available(), 0);
        assert_eq!(fifo.free_space(), 12);
    }
}
