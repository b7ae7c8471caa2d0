//! Gain then clamp to +-1.

use std::sync::Arc;

use crate::dsp::block::{AudioBlock, ProcessSpec};
use crate::dsp::utils::db_to_gain;
use crate::dsp::BlockProcessor;
use crate::params::{FloatParamId, ParamStore, SmoothedFloat};

pub struct HardClip {
    gain_db: SmoothedFloat,
}

impl HardClip {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            gain_db: SmoothedFloat::new(store, FloatParamId::HardClipGain),
        }
    }
}

impl BlockProcessor for HardClip {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.gain_db.prepare(spec.sample_rate);
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        self.gain_db.update();
        block.for_each_frame(|frame, channels| {
            let gain = db_to_gain(self.gain_db.next());
            for x in frame.iter_mut().take(channels) {
                *x = (*x * gain).clamp(-1.0, 1.0);
            }
        });
    }

    fn reset(&mut self) {}
}
