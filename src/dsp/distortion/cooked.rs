//! Rational curve `x (1 + k) / (1 + k |x|)`.

use std::sync::Arc;

use super::shapers;
use crate::dsp::block::{AudioBlock, ProcessSpec};
use crate::dsp::BlockProcessor;
use crate::params::{FloatParamId, ParamStore, SmoothedFloat};

/// `k` at 100 %.
const MAX_K: f32 = 10.0;

pub struct Cooked {
    amount: SmoothedFloat,
}

impl Cooked {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            amount: SmoothedFloat::new(store, FloatParamId::CookedAmount),
        }
    }
}

impl BlockProcessor for Cooked {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.amount.prepare(spec.sample_rate);
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        self.amount.update();
        block.for_each_frame(|frame, channels| {
            let k = self.amount.next() * 0.01 * MAX_K;
            for x in frame.iter_mut().take(channels) {
                *x = shapers::cooked(*x, k);
            }
        });
    }

    fn reset(&mut self) {}
}
