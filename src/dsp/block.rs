//! Non-owning audio views and the preparation spec handed to every component.

/// Mono or stereo only.
pub const MAX_CHANNELS: usize = 2;

/// Configuration every component is (re)prepared with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    pub sample_rate: f32,
    pub max_block_size: usize,
    pub num_channels: usize,
}

impl ProcessSpec {
    /// Same layout at `2^factor` times the rate and block size.
    pub fn oversampled(&self, factor: usize) -> Self {
        Self {
            sample_rate: self.sample_rate * (1 << factor) as f32,
            max_block_size: self.max_block_size << factor,
            num_channels: self.num_channels,
        }
    }
}

/// Borrowed view over one or two equal-length channel slices.
///
/// Channels past `num_channels` are empty slices.
pub struct AudioBlock<'a> {
    channels: [&'a mut [f32]; MAX_CHANNELS],
    num_channels: usize,
    num_samples: usize,
}

impl<'a> AudioBlock<'a> {
    /// Wrap host channel slices. Extra channels are ignored and every channel
    /// is cut to the shortest length.
    pub fn new(channels: &'a mut [&mut [f32]]) -> Self {
        let num_channels = channels.len().min(MAX_CHANNELS);
        let num_samples = channels[..num_channels]
            .iter()
            .map(|c| c.len())
            .min()
            .unwrap_or(0);

        let mut slots: [&'a mut [f32]; MAX_CHANNELS] = [&mut [], &mut []];
        for (slot, ch) in slots.iter_mut().zip(channels.iter_mut()) {
            *slot = &mut ch[..num_samples];
        }

        Self {
            channels: slots,
            num_channels,
            num_samples,
        }
    }

    /// View the first `num_samples` of each owned channel buffer.
    pub fn from_vecs(buffers: &'a mut [Vec<f32>], num_samples: usize) -> Self {
        let num_channels = buffers.len().min(MAX_CHANNELS);
        let num_samples = buffers[..num_channels]
            .iter()
            .map(|b| b.len())
            .min()
            .unwrap_or(0)
            .min(num_samples);

        let mut slots: [&'a mut [f32]; MAX_CHANNELS] = [&mut [], &mut []];
        for (slot, buf) in slots.iter_mut().zip(buffers.iter_mut()) {
            *slot = &mut buf[..num_samples];
        }

        Self {
            channels: slots,
            num_channels,
            num_samples,
        }
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_channels == 0 || self.num_samples == 0
    }

    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index][..]
    }

    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index][..]
    }

    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> + '_ {
        self.channels[..self.num_channels]
            .iter_mut()
            .map(|c| &mut **c)
    }

    /// First channel plus the second one when present.
    pub fn pair_mut(&mut self) -> (&mut [f32], Option<&mut [f32]>) {
        let [left, right] = &mut self.channels;
        let right = if self.num_channels > 1 {
            Some(&mut **right)
        } else {
            None
        };
        (&mut **left, right)
    }

    pub fn stereo_mut(&mut self) -> Option<(&mut [f32], &mut [f32])> {
        match self.pair_mut() {
            (left, Some(right)) => Some((left, right)),
            _ => None,
        }
    }

    /// Visit every sample frame in order. Frame slots past `num_channels` hold
    /// zero and are not written back.
    #[inline]
    pub fn for_each_frame(&mut self, mut f: impl FnMut(&mut [f32; MAX_CHANNELS], usize)) {
        let n = self.num_samples;
        let channels = self.num_channels;
        if channels == 0 {
            return;
        }
        let (left, mut right) = self.pair_mut();
        for i in 0..n {
            let mut frame = [left[i], right.as_deref().map_or(0.0, |r| r[i])];
            f(&mut frame, channels);
            left[i] = frame[0];
            if let Some(r) = right.as_deref_mut() {
                r[i] = frame[1];
            }
        }
    }

    /// Reborrow `len` samples starting at `start`.
    pub fn sub_block(&mut self, start: usize, len: usize) -> AudioBlock<'_> {
        let start = start.min(self.num_samples);
        let end = (start + len).min(self.num_samples);

        let mut slots: [&mut [f32]; MAX_CHANNELS] = [&mut [], &mut []];
        for (slot, ch) in slots
            .iter_mut()
            .zip(self.channels[..self.num_channels].iter_mut())
        {
            *slot = &mut ch[start..end];
        }

        AudioBlock {
            channels: slots,
            num_channels: self.num_channels,
            num_samples: end - start,
        }
    }

    pub fn clear_channel(&mut self, index: usize) {
        self.channels[index].fill(0.0);
    }

    pub fn apply_gain(&mut self, gain: f32) {
        for ch in self.channels_mut() {
            for x in ch.iter_mut() {
                *x *= gain;
            }
        }
    }

    pub fn copy_from(&mut self, other: &AudioBlock<'_>) {
        let n = self.num_samples.min(other.num_samples);
        for c in 0..self.num_channels.min(other.num_channels) {
            self.channels[c][..n].copy_from_slice(&other.channel(c)[..n]);
        }
    }

    pub fn peak(&self, index: usize) -> f32 {
        self.channels[index]
            .iter()
            .fold(0.0f32, |acc, x| acc.max(x.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_truncates_to_shortest() {
        let mut l = vec![1.0f32; 8];
        let mut r = vec![2.0f32; 6];
        let mut chans = [l.as_mut_slice(), r.as_mut_slice()];
        let block = AudioBlock::new(&mut chans);
        assert_eq!(block.num_channels(), 2);
        assert_eq!(block.num_samples(), 6);
        assert_eq!(block.channel(1)[0], 2.0);
    }

    #[test]
    fn test_sub_block_writes_through() {
        let mut bufs = vec![vec![0.0f32; 10], vec![0.0f32; 10]];
        {
            let mut block = AudioBlock::from_vecs(&mut bufs, 10);
            let mut sub = block.sub_block(4, 3);
            assert_eq!(sub.num_samples(), 3);
            sub.channel_mut(1).fill(1.0);
        }
        assert_eq!(bufs[1][3], 0.0);
        assert_eq!(bufs[1][4], 1.0);
        assert_eq!(bufs[1][6], 1.0);
        assert_eq!(bufs[1][7], 0.0);
    }

    #[test]
    fn test_mono_pair() {
        let mut bufs = vec![vec![0.5f32; 4]];
        let mut block = AudioBlock::from_vecs(&mut bufs, 4);
        let (left, right) = block.pair_mut();
        assert_eq!(left.len(), 4);
        assert!(right.is_none());
        assert!(block.stereo_mut().is_none());
        block.apply_gain(2.0);
        assert_eq!(block.channel(0)[2], 1.0);
    }
}
