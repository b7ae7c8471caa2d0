//! Up to 50 RBJ all-pass biquads in series, sharing one frequency and Q.

use std::sync::Arc;

use crate::dsp::biquad::{Biquad, StereoBiquad};
use crate::dsp::block::{AudioBlock, ProcessSpec};
use crate::dsp::BlockProcessor;
use crate::params::{FloatParamId, ParamStore, SmoothedFloat};

pub const MAX_STAGES: usize = 50;

pub struct AllPassChain {
    freq: SmoothedFloat,
    q: SmoothedFloat,
    amount: SmoothedFloat,
    stages: [StereoBiquad; MAX_STAGES],
    generations: [u32; 3],
    active_stages: usize,
    sample_rate: f32,
}

impl AllPassChain {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            freq: SmoothedFloat::new(store, FloatParamId::AllPassFreq),
            q: SmoothedFloat::new(store, FloatParamId::AllPassQ),
            amount: SmoothedFloat::new(store, FloatParamId::AllPassAmount),
            stages: [StereoBiquad::default(); MAX_STAGES],
            generations: [u32::MAX; 3],
            active_stages: 0,
            sample_rate: 44100.0,
        }
    }

    /// Stages that ran in the last block.
    pub fn active_stages(&self) -> usize {
        self.active_stages
    }

    fn refresh(&mut self) {
        let generations = [
            self.freq.generation(),
            self.q.generation(),
            self.amount.generation(),
        ];
        if generations == self.generations {
            return;
        }
        self.generations = generations;

        let mut design = Biquad::new();
        design.update_allpass(self.freq.value(), self.q.value(), self.sample_rate);
        for stage in self.stages.iter_mut() {
            stage.set_coefficients_from(&design);
        }
    }
}

impl BlockProcessor for AllPassChain {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        for p in [&mut self.freq, &mut self.q, &mut self.amount] {
            p.prepare(spec.sample_rate);
        }
        self.generations = [u32::MAX; 3];
        self.refresh();
        self.reset();
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        let n = block.num_samples();
        for p in [&mut self.freq, &mut self.q, &mut self.amount] {
            p.update();
            p.skip(n);
        }
        self.refresh();

        let count = (self.amount.value().round() as usize).min(MAX_STAGES);
        self.active_stages = count;

        for (c, channel) in block.channels_mut().enumerate() {
            for stage in self.stages[..count].iter_mut() {
                let filter = stage.channel(c);
                for x in channel.iter_mut() {
                    *x = filter.process(*x);
                }
            }
        }
    }

    fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rms(x: &[f32]) -> f32 {
        (x.iter().map(|v| v * v).sum::<f32>() / x.len() as f32).sqrt()
    }

    #[test]
    fn test_runs_rounded_stage_count() {
        let store = ParamStore::shared();
        store.set(FloatParamId::AllPassAmount, 7.4);
        let mut chain = AllPassChain::new(&store);
        chain.prepare(&ProcessSpec {
            sample_rate: 48000.0,
            max_block_size: 64,
            num_channels: 2,
        });

        let mut bufs = vec![vec![0.0f32; 64], vec![0.0f32; 64]];
        chain.process_block(&mut AudioBlock::from_vecs(&mut bufs, 64));
        assert_eq!(chain.active_stages(), 7);

        store.set(FloatParamId::AllPassAmount, 0.0);
        let input: Vec<f32> = (0..64).map(|i| (i as f32 * 0.2).sin()).collect();
        let mut bufs = vec![input.clone(), input.clone()];
        chain.process_block(&mut AudioBlock::from_vecs(&mut bufs, 64));
        assert_eq!(chain.active_stages(), 0);
        assert_eq!(bufs[0], input);
    }

    #[test]
    fn test_rms_preserved() {
        let store = ParamStore::shared();
        store.set(FloatParamId::AllPassAmount, 50.0);
        store.set(FloatParamId::AllPassFreq, 1000.0);
        let mut chain = AllPassChain::new(&store);
        chain.prepare(&ProcessSpec {
            sample_rate: 48000.0,
            max_block_size: 480,
            num_channels: 1,
        });

        let mut input_rms = 0.0;
        let mut output_rms = 0.0;
        for block in 0..200 {
            let input: Vec<f32> = (0..480)
                .map(|i| (2.0 * std::f32::consts::PI * 440.0 * (block * 480 + i) as f32 / 48000.0).sin())
                .collect();
            let mut bufs = vec![input.clone()];
            chain.process_block(&mut AudioBlock::from_vecs(&mut bufs, 480));
            if block >= 100 {
                input_rms += rms(&input);
                output_rms += rms(&bufs[0]);
            }
        }
        assert_eq!(chain.active_stages(), 50);
        assert!((output_rms / input_rms - 1.0).abs() < 0.02);
    }
}
