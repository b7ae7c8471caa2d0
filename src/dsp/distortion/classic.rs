//! "Grill": drive into a rational soft clipper, then optional diode and
//! wave-folding stages, with a bias offset that a DC blocker removes after
//! shaping.

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use super::shapers;
use crate::dsp::block::{AudioBlock, ProcessSpec, MAX_CHANNELS};
use crate::dsp::utils::{db_to_gain, DcBlocker};
use crate::dsp::BlockProcessor;
use crate::params::{FloatParamId, ParamStore, SmoothedFloat};

/// Drive at 100 % saturation.
const MAX_DRIVE_DB: f32 = 24.0;
/// Fold frequency multiplier at 100 %.
const MAX_FOLD: f32 = 4.0;

pub struct Classic {
    saturation: SmoothedFloat,
    diode: SmoothedFloat,
    fold: SmoothedFloat,
    bias: SmoothedFloat,
    dc: [DcBlocker; MAX_CHANNELS],
}

impl Classic {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            saturation: SmoothedFloat::new(store, FloatParamId::SaturationAmount),
            diode: SmoothedFloat::new(store, FloatParamId::Diode),
            fold: SmoothedFloat::new(store, FloatParamId::Fold),
            bias: SmoothedFloat::new(store, FloatParamId::GrillBias),
            dc: Default::default(),
        }
    }
}

impl BlockProcessor for Classic {
    fn prepare(&mut self, spec: &ProcessSpec) {
        for p in [&mut self.saturation, &mut self.diode, &mut self.fold, &mut self.bias] {
            p.prepare(spec.sample_rate);
        }
        for dc in self.dc.iter_mut() {
            dc.prepare(spec.sample_rate);
            dc.reset();
        }
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        for p in [&mut self.saturation, &mut self.diode, &mut self.fold, &mut self.bias] {
            p.update();
        }

        block.for_each_frame(|frame, channels| {
            let drive = db_to_gain(self.saturation.next() * 0.01 * MAX_DRIVE_DB);
            let diode = self.diode.next() * 0.01;
            let fold = self.fold.next() * 0.01;
            let bias = self.bias.next() * 0.5;

            for (x, dc) in frame.iter_mut().zip(self.dc.iter_mut()).take(channels) {
                let mut y = shapers::rational_clip(*x * drive + bias);
                y += (shapers::diode(y) - y) * diode;
                y += ((y * FRAC_PI_2 * (1.0 + MAX_FOLD * fold)).sin() - y) * fold;
                *x = dc.process(y);
            }
        });
    }

    fn reset(&mut self) {
        for dc in self.dc.iter_mut() {
            dc.reset();
        }
    }
}
