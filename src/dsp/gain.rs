//! Smoothed decibel gain.

use std::sync::Arc;

use crate::dsp::block::{AudioBlock, ProcessSpec};
use crate::dsp::utils::db_to_gain;
use crate::dsp::BlockProcessor;
use crate::params::{FloatParamId, ParamStore, SmoothedFloat};

pub struct GainStage {
    gain_db: SmoothedFloat,
}

impl GainStage {
    pub fn new(store: &Arc<ParamStore>, id: FloatParamId) -> Self {
        Self {
            gain_db: SmoothedFloat::new(store, id),
        }
    }
}

impl BlockProcessor for GainStage {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.gain_db.prepare(spec.sample_rate);
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        self.gain_db.update();

        if !self.gain_db.is_smoothing() {
            let db = self.gain_db.value();
            if db != 0.0 {
                block.apply_gain(db_to_gain(db));
            }
            return;
        }

        let n = block.num_samples();
        let (left, mut right) = block.pair_mut();
        for i in 0..n {
            let g = db_to_gain(self.gain_db.next());
            left[i] *= g;
            if let Some(r) = right.as_deref_mut() {
                r[i] *= g;
            }
        }
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_gain() {
        let store = ParamStore::shared();
        store.set(FloatParamId::InputGain, -6.0206);
        let mut stage = GainStage::new(&store, FloatParamId::InputGain);
        stage.prepare(&ProcessSpec {
            sample_rate: 48000.0,
            max_block_size: 64,
            num_channels: 2,
        });

        let mut bufs = vec![vec![1.0f32; 64], vec![-1.0f32; 64]];
        stage.process_block(&mut AudioBlock::from_vecs(&mut bufs, 64));
        assert!((bufs[0][10] - 0.5).abs() < 1e-4);
        assert!((bufs[1][63] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_ramp_is_monotonic() {
        let store = ParamStore::shared();
        let mut stage = GainStage::new(&store, FloatParamId::OutputGain);
        stage.prepare(&ProcessSpec {
            sample_rate: 1000.0,
            max_block_size: 100,
            num_channels: 1,
        });
        store.set(FloatParamId::OutputGain, 12.0);

        let mut bufs = vec![vec![1.0f32; 100]];
        stage.process_block(&mut AudioBlock::from_vecs(&mut bufs, 100));
        for w in bufs[0].windows(2) {
            assert!(w[1] >= w[0]);
        }
        // 50 ms at 1 kHz: target reached by sample 50
        assert!((bufs[0][60] - db_to_gain(12.0)).abs() < 1e-4);
    }
}
