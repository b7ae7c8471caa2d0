//! Post-chain soft clipper: drive, then a quadratic-knee clip at +-1.

use std::sync::Arc;

use super::shapers;
use crate::dsp::block::{AudioBlock, ProcessSpec};
use crate::dsp::utils::db_to_gain;
use crate::dsp::BlockProcessor;
use crate::params::{FloatParamId, ParamStore, SmoothedFloat};

pub struct SoftClip {
    gain_db: SmoothedFloat,
    knee: SmoothedFloat,
}

impl SoftClip {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            gain_db: SmoothedFloat::new(store, FloatParamId::PostClipGain),
            knee: SmoothedFloat::new(store, FloatParamId::PostClipKnee),
        }
    }
}

impl BlockProcessor for SoftClip {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.gain_db.prepare(spec.sample_rate);
        self.knee.prepare(spec.sample_rate);
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        self.gain_db.update();
        self.knee.update();
        block.for_each_frame(|frame, channels| {
            let gain = db_to_gain(self.gain_db.next());
            let knee = self.knee.next();
            for x in frame.iter_mut().take(channels) {
                *x = shapers::knee_clip(*x * gain, knee);
            }
        });
    }

    fn reset(&mut self) {}
}
