//! Multi-channel buffer views.
//!
//! The FIFOs read caller blocks through [`ChannelSource`] and write them back
//! through [`ChannelSink`], so the same pipeline serves three layouts
//! without copying into an intermediate buffer:
//!
//! * separate buffers, one per channel (`&[&[T]]`, `&mut [Vec<T>]`, ...),
//! * [`Planar`]: one buffer, channel `w` at `[w * len..(w + 1) * len]`,
//! * [`Interleaved`]: one buffer, `[L, R, L, R, ...]`.
//!
//! None of the views allocate.

/// Read access to a block of `frames()` samples on `channels()` channels.
pub trait ChannelSource<T: Copy> {
    fn channels(&self) -> usize;

    /// Samples per channel
    fn frames(&self) -> usize;

    /// Copies `dst.len()` samples of channel `channel`, starting at `offset`.
    fn copy_to(&self, channel: usize, offset: usize, dst: &mut [T]);
}

/// Write access to a block of `frames()` samples on `channels()` channels.
pub trait ChannelSink<T: Copy> {
    fn channels(&self) -> usize;

    fn frames(&self) -> usize;

    /// Copies `src` into channel `channel`, starting at `offset`.
    fn copy_from(&mut self, channel: usize, offset: usize, src: &[T]);
}

// Separate per-channel buffers. The block length is that of the shortest
// channel.

impl<T: Copy, S: AsRef<[T]>> ChannelSource<T> for [S] {
    fn channels(&self) -> usize {
        self.len()
    }

    fn frames(&self) -> usize {
        self.iter().map(|c| c.as_ref().len()).min().unwrap_or(0)
    }

    fn copy_to(&self, channel: usize, offset: usize, dst: &mut [T]) {
        dst.copy_from_slice(&self[channel].as_ref()[offset..offset + dst.len()]);
    }
}

impl<T: Copy, S: AsRef<[T]> + AsMut<[T]>> ChannelSink<T> for [S] {
    fn channels(&self) -> usize {
        self.len()
    }

    fn frames(&self) -> usize {
        self.iter().map(|c| c.as_ref().len()).min().unwrap_or(0)
    }

    fn copy_from(&mut self, channel: usize, offset: usize, src: &[T]) {
        self[channel].as_mut()[offset..offset + src.len()].copy_from_slice(src);
    }
}

impl<T: Copy, S: AsRef<[T]>, const N: usize> ChannelSource<T> for [S; N] {
    fn channels(&self) -> usize {
        N
    }

    fn frames(&self) -> usize {
        <[S] as ChannelSource<T>>::frames(self.as_slice())
    }

    fn copy_to(&self, channel: usize, offset: usize, dst: &mut [T]) {
        <[S] as ChannelSource<T>>::copy_to(self.as_slice(), channel, offset, dst)
    }
}

impl<T: Copy, S: AsRef<[T]> + AsMut<[T]>, const N: usize> ChannelSink<T> for [S; N] {
    fn channels(&self) -> usize {
        N
    }

    fn frames(&self) -> usize {
        <[S] as ChannelSink<T>>::frames(self.as_slice())
    }

    fn copy_from(&mut self, channel: usize, offset: usize, src: &[T]) {
        <[S] as ChannelSink<T>>::copy_from(self.as_mut_slice(), channel, offset, src)
    }
}

/// Channel-major view of a single buffer.
///
/// Trailing samples that do not fill a whole frame on every channel are
/// ignored.
#[derive(Debug)]
pub struct Planar<B> {
    data: B,
    channels: usize,
}

impl<B> Planar<B> {
    pub fn new(data: B, channels: usize) -> Self {
        Self { data, channels }
    }
}

impl<T: Copy, B: AsRef<[T]>> ChannelSource<T> for Planar<B> {
    fn channels(&self) -> usize {
        self.channels
    }

    fn frames(&self) -> usize {
        self.data.as_ref().len().checked_div(self.channels).unwrap_or(0)
    }

    fn copy_to(&self, channel: usize, offset: usize, dst: &mut [T]) {
        let start = channel * <Self as ChannelSource<T>>::frames(self) + offset;
        dst.copy_from_slice(&self.data.as_ref()[start..start + dst.len()]);
    }
}

impl<T: Copy, B: AsRef<[T]> + AsMut<[T]>> ChannelSink<T> for Planar<B> {
    fn channels(&self) -> usize {
        self.channels
    }

    fn frames(&self) -> usize {
        self.data.as_ref().len().checked_div(self.channels).unwrap_or(0)
    }

    fn copy_from(&mut self, channel: usize, offset: usize, src: &[T]) {
        let start = channel * <Self as ChannelSink<T>>::frames(self) + offset;
        self.data.as_mut()[start..start + src.len()].copy_from_slice(src);
    }
}

/// Frame-interleaved view of a single buffer (`[L, R, L, R, ...]` for
/// stereo).
#[derive(Debug)]
pub struct Interleaved<B> {
    data: B,
    channels: usize,
}

impl<B> Interleaved<B> {
    pub fn new(data: B, channels: usize) -> Self {
        Self { data, channels }
    }
}

impl<T: Copy, B: AsRef<[T]>> ChannelSource<T> for Interleaved<B> {
    fn channels(&self) -> usize {
        self.channels
    }

    fn frames(&self) -> usize {
        self.data.as_ref().len().checked_div(self.channels).unwrap_or(0)
    }

    fn copy_to(&self, channel: usize, offset: usize, dst: &mut [T]) {
        let data = self.data.as_ref();
        for (i, d) in dst.iter_mut().enumerate() {
            *d = data[(offset + i) * self.channels + channel];
        }
    }
}

impl<T: Copy, B: AsRef<[T]> + AsMut<[T]>> ChannelSink<T> for Interleaved<B> {
    fn channels(&self) -> usize {
        self.channels
    }

    fn frames(&self) -> usize {
        self.data.as_ref().len().checked_div(self.channels).unwrap_or(0)
    }

    fn copy_from(&mut self, channel: usize, offset: usize, src: &[T]) {
        let channels = self.channels;
        let data = self.data.as_mut();
        for (i, &s) in src.iter().enumerate() {
            data[(offset + i) * channels + channel] = s;
        }
    }
}
