//! Pre-emphasis shelves ahead of the nonlinear stages and their exact
//! inverse after them.
//!
//! An RBJ shelf with gain `-g` is the reciprocal of the same shelf with gain
//! `g`, so with nothing nonlinear in between the pair is transparent.

use std::f32::consts::FRAC_1_SQRT_2;
use std::sync::Arc;

use crate::dsp::biquad::{Biquad, StereoBiquad};
use crate::dsp::block::{AudioBlock, ProcessSpec};
use crate::params::{FloatParamId, ParamStore, SmoothedFloat};

const LOW_SHELF_Q: f32 = FRAC_1_SQRT_2;
/// RBJ shelf slope for the high shelf.
const HIGH_SHELF_SLOPE: f32 = 1.0;

#[derive(Default)]
struct ShelfPair {
    low: StereoBiquad,
    high: StereoBiquad,
}

impl ShelfPair {
    fn design(&mut self, low_freq: f32, low_db: f32, high_freq: f32, high_db: f32, sr: f32) {
        let nyquist_guard = sr * 0.49;
        let mut low = Biquad::new();
        low.update_low_shelf(low_freq.min(nyquist_guard), LOW_SHELF_Q, low_db, sr);
        let mut high = Biquad::new();
        high.update_high_shelf(high_freq.min(nyquist_guard), HIGH_SHELF_SLOPE, high_db, sr);
        self.low.set_coefficients_from(&low);
        self.high.set_coefficients_from(&high);
    }

    fn process(&mut self, block: &mut AudioBlock) {
        for (c, channel) in block.channels_mut().enumerate() {
            let low = self.low.channel(c);
            let high = self.high.channel(c);
            for x in channel.iter_mut() {
                *x = high.process(low.process(*x));
            }
        }
    }

    fn reset(&mut self) {
        self.low.reset();
        self.high.reset();
    }
}

pub struct EmphasisFilter {
    low_freq: SmoothedFloat,
    low_gain: SmoothedFloat,
    high_freq: SmoothedFloat,
    high_gain: SmoothedFloat,
    before: ShelfPair,
    after: ShelfPair,
    generations: [u32; 4],
    sample_rate: f32,
}

impl EmphasisFilter {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            low_freq: SmoothedFloat::new(store, FloatParamId::EmphasisLowFreq),
            low_gain: SmoothedFloat::new(store, FloatParamId::EmphasisLowGain),
            high_freq: SmoothedFloat::new(store, FloatParamId::EmphasisHighFreq),
            high_gain: SmoothedFloat::new(store, FloatParamId::EmphasisHighGain),
            before: ShelfPair::default(),
            after: ShelfPair::default(),
            generations: [u32::MAX; 4],
            sample_rate: 44100.0,
        }
    }

    fn handles(&mut self) -> [&mut SmoothedFloat; 4] {
        [
            &mut self.low_freq,
            &mut self.low_gain,
            &mut self.high_freq,
            &mut self.high_gain,
        ]
    }

    fn refresh(&mut self) {
        let generations = [
            self.low_freq.generation(),
            self.low_gain.generation(),
            self.high_freq.generation(),
            self.high_gain.generation(),
        ];
        if generations == self.generations {
            return;
        }
        self.generations = generations;

        let (lf, lg) = (self.low_freq.value(), self.low_gain.value());
        let (hf, hg) = (self.high_freq.value(), self.high_gain.value());
        self.before.design(lf, lg, hf, hg, self.sample_rate);
        self.after.design(lf, -lg, hf, -hg, self.sample_rate);
    }

    pub fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        for p in self.handles() {
            p.prepare(spec.sample_rate);
        }
        self.generations = [u32::MAX; 4];
        self.refresh();
        self.reset();
    }

    /// Advances the parameter ramps by one block and applies the emphasis.
    pub fn process_before(&mut self, block: &mut AudioBlock) {
        let n = block.num_samples();
        for p in self.handles() {
            p.update();
            p.skip(n);
        }
        self.refresh();
        self.before.process(block);
    }

    /// Applies the de-emphasis designed in the matching `process_before`.
    pub fn process_after(&mut self, block: &mut AudioBlock) {
        self.after.process(block);
    }

    pub fn reset(&mut self) {
        self.before.reset();
        self.after.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_before_then_after_is_transparent() {
        let store = ParamStore::shared();
        store.set(FloatParamId::EmphasisLowGain, 12.0);
        store.set(FloatParamId::EmphasisHighGain, -9.0);
        let mut emphasis = EmphasisFilter::new(&store);
        emphasis.prepare(&ProcessSpec {
            sample_rate: 48000.0,
            max_block_size: 256,
            num_channels: 2,
        });

        let mut max_err = 0.0f32;
        let mut changed = false;
        for block in 0..40 {
            let input: Vec<f32> = (0..256)
                .map(|i| {
                    let n = (block * 256 + i) as f32;
                    0.4 * (n * 0.01).sin() + 0.3 * (n * 1.3).sin()
                })
                .collect();
            let mut bufs = vec![input.clone(), input.clone()];
            {
                let mut io = AudioBlock::from_vecs(&mut bufs, 256);
                emphasis.process_before(&mut io);
                changed |= io.channel(0).iter().zip(&input).any(|(a, b)| (a - b).abs() > 0.05);
                emphasis.process_after(&mut io);
            }
            for (a, b) in bufs[1].iter().zip(&input) {
                max_err = max_err.max((a - b).abs());
            }
        }
        assert!(changed);
        assert!(max_err < 1e-3, "{max_err}");
    }
}
