//! Dry/wet crossfade with the dry path delayed to line up with the wet
//! path's (possibly fractional) latency.

use crate::dsp::block::{AudioBlock, ProcessSpec, MAX_CHANNELS};
use crate::dsp::utils::lerp;
use crate::params::linear_style;
use nih_plug::prelude::Smoother;

const DELAY_CAPACITY: usize = 32;
const DELAY_MASK: usize = DELAY_CAPACITY - 1;
/// Largest delay that still leaves room for the interpolation tap.
pub const MAX_WET_LATENCY: f32 = (DELAY_CAPACITY - 2) as f32;
const MIX_RAMP_MS: f32 = 50.0;

pub struct DryWetMixer {
    delay_lines: [[f32; DELAY_CAPACITY]; MAX_CHANNELS],
    write_pos: usize,
    dry: [Vec<f32>; MAX_CHANNELS],
    latency: f32,
    mix: Smoother<f32>,
    mix_target: f32,
    sample_rate: f32,
}

impl DryWetMixer {
    pub fn new() -> Self {
        let mix = Smoother::new(linear_style(MIX_RAMP_MS));
        mix.reset(1.0);
        Self {
            delay_lines: [[0.0; DELAY_CAPACITY]; MAX_CHANNELS],
            write_pos: 0,
            dry: Default::default(),
            latency: 0.0,
            mix,
            mix_target: 1.0,
            sample_rate: 44100.0,
        }
    }

    pub fn prepare(&mut self, spec: &ProcessSpec) {
        for (c, dry) in self.dry.iter_mut().enumerate() {
            let len = if c < spec.num_channels {
                spec.max_block_size
            } else {
                0
            };
            *dry = vec![0.0; len];
        }
        self.sample_rate = spec.sample_rate;
        self.reset();
    }

    /// Dry delay in samples, clamped to what the line can hold.
    pub fn set_wet_latency(&mut self, samples: f32) {
        self.latency = samples.clamp(0.0, MAX_WET_LATENCY);
    }

    pub fn wet_latency(&self) -> f32 {
        self.latency
    }

    pub fn set_wet_mix_proportion(&mut self, proportion: f32) {
        let proportion = proportion.clamp(0.0, 1.0);
        if proportion != self.mix_target {
            self.mix_target = proportion;
            self.mix.set_target(self.sample_rate, proportion);
        }
    }

    /// Capture the dry signal of a block. Call before the wet path runs.
    pub fn push_dry_samples(&mut self, block: &AudioBlock) {
        let n = block.num_samples();
        let whole = self.latency as usize;
        let frac = self.latency - whole as f32;

        for c in 0..block.num_channels().min(MAX_CHANNELS) {
            let line = &mut self.delay_lines[c];
            let Some(dry) = self.dry[c].get_mut(..n) else {
                continue;
            };
            let mut pos = self.write_pos;
            for (out, &x) in dry.iter_mut().zip(block.channel(c)) {
                line[pos] = x;
                let a = line[pos.wrapping_sub(whole) & DELAY_MASK];
                let b = line[pos.wrapping_sub(whole + 1) & DELAY_MASK];
                *out = lerp(a, b, frac);
                pos = (pos + 1) & DELAY_MASK;
            }
        }
        self.write_pos = (self.write_pos + n) & DELAY_MASK;
    }

    /// Blend the captured dry signal into the processed block.
    pub fn mix_wet_samples(&mut self, block: &mut AudioBlock) {
        let n = block.num_samples().min(self.dry[0].len());

        if !self.mix.is_smoothing() && self.mix_target >= 1.0 {
            return;
        }

        let (left, mut right) = block.pair_mut();
        let [dry_left, dry_right] = &self.dry;
        for i in 0..n {
            let m = self.mix.next();
            left[i] = dry_left[i] * (1.0 - m) + left[i] * m;
            if let Some(r) = right.as_deref_mut() {
                if let Some(&d) = dry_right.get(i) {
                    r[i] = d * (1.0 - m) + r[i] * m;
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.delay_lines = [[0.0; DELAY_CAPACITY]; MAX_CHANNELS];
        self.write_pos = 0;
        self.mix.reset(self.mix_target);
    }
}

impl Default for DryWetMixer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixer(latency: f32, mix: f32) -> DryWetMixer {
        let mut mixer = DryWetMixer::new();
        mixer.prepare(&ProcessSpec {
            sample_rate: 48000.0,
            max_block_size: 64,
            num_channels: 1,
        });
        mixer.set_wet_latency(latency);
        mixer.set_wet_mix_proportion(mix);
        mixer.mix.reset(mixer.mix_target);
        mixer
    }

    /// Full-dry output of an impulse, i.e. the dry delay line alone.
    fn dry_impulse_response(latency: f32) -> Vec<f32> {
        let mut m = mixer(latency, 0.0);
        let mut bufs = vec![vec![0.0f32; 48]];
        bufs[0][0] = 1.0;
        let mut block = AudioBlock::from_vecs(&mut bufs, 48);
        m.push_dry_samples(&block);
        m.mix_wet_samples(&mut block);
        bufs.swap_remove(0)
    }

    #[test]
    fn test_integer_latency_delays_dry() {
        let out = dry_impulse_response(15.0);
        assert_eq!(out[15], 1.0);
        assert_eq!(out.iter().filter(|&&v| v != 0.0).count(), 1);
    }

    #[test]
    fn test_fractional_latency_interpolates() {
        let out = dry_impulse_response(22.5);
        assert!((out[22] - 0.5).abs() < 1e-6);
        assert!((out[23] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_zero_latency_passes_current_sample() {
        let out = dry_impulse_response(0.0);
        assert_eq!(out[0], 1.0);
    }

    #[test]
    fn test_latency_is_clamped() {
        let m = mixer(100.0, 1.0);
        assert_eq!(m.wet_latency(), MAX_WET_LATENCY);
    }

    #[test]
    fn test_full_wet_keeps_processed_signal() {
        let mut m = mixer(0.0, 1.0);
        let mut bufs = vec![vec![0.25f32; 16]];
        let mut block = AudioBlock::from_vecs(&mut bufs, 16);
        m.push_dry_samples(&block);
        block.apply_gain(2.0);
        m.mix_wet_samples(&mut block);
        assert!(bufs[0].iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_mix_ramps_linearly() {
        let mut m = DryWetMixer::new();
        m.prepare(&ProcessSpec {
            sample_rate: 1000.0,
            max_block_size: 64,
            num_channels: 1,
        });
        // 50 ms at 1 kHz: 50 steps from full wet to full dry.
        m.set_wet_mix_proportion(0.0);
        let mut bufs = vec![vec![1.0f32; 64]];
        let mut block = AudioBlock::from_vecs(&mut bufs, 64);
        m.push_dry_samples(&block);
        block.apply_gain(0.0);
        m.mix_wet_samples(&mut block);
        assert!((bufs[0][0] - 0.02).abs() < 1e-5);
        assert!((bufs[0][24] - 0.5).abs() < 1e-4);
        assert_eq!(bufs[0][63], 1.0);
    }
}
