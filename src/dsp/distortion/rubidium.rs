//! Rubidium: asymmetric drive into a soft saturator blended with a
//! sine-shaped "mojo" curve, then a tone low-pass and DC removal.

use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use super::shapers;
use crate::dsp::block::{AudioBlock, ProcessSpec, MAX_CHANNELS};
use crate::dsp::utils::DcBlocker;
use crate::dsp::BlockProcessor;
use crate::params::{FloatParamId, ParamStore, SmoothedFloat};

const MAX_DRIVE: f32 = 10.0;
/// Extra positive-half gain per unit of asymmetry.
const ASYM_SCALE: f32 = 0.1;
/// Tone value to low-pass cutoff.
const TONE_HZ_PER_UNIT: f32 = 200.0;

pub struct Rubidium {
    amount: SmoothedFloat,
    mojo: SmoothedFloat,
    asym: SmoothedFloat,
    tone: SmoothedFloat,
    lowpass: [f32; MAX_CHANNELS],
    dc: [DcBlocker; MAX_CHANNELS],
    sample_rate: f32,
}

impl Rubidium {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            amount: SmoothedFloat::new(store, FloatParamId::RubidiumAmount),
            mojo: SmoothedFloat::new(store, FloatParamId::RubidiumMojo),
            asym: SmoothedFloat::new(store, FloatParamId::RubidiumAsym),
            tone: SmoothedFloat::new(store, FloatParamId::RubidiumTone),
            lowpass: [0.0; MAX_CHANNELS],
            dc: Default::default(),
            sample_rate: 44100.0,
        }
    }
}

impl BlockProcessor for Rubidium {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        for p in [&mut self.amount, &mut self.mojo, &mut self.asym, &mut self.tone] {
            p.prepare(spec.sample_rate);
        }
        for dc in self.dc.iter_mut() {
            dc.prepare(spec.sample_rate);
        }
        self.reset();
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        for p in [&mut self.amount, &mut self.mojo, &mut self.asym, &mut self.tone] {
            p.update();
        }

        let sample_rate = self.sample_rate;
        block.for_each_frame(|frame, channels| {
            let drive = 1.0 + self.amount.next() * 0.01 * MAX_DRIVE;
            let mojo = self.mojo.next() * 0.01;
            let asym = self.asym.next() * ASYM_SCALE;
            let fc = (self.tone.next() * TONE_HZ_PER_UNIT).min(sample_rate * 0.45);
            let coeff = (-2.0 * PI * fc / sample_rate).exp();

            for c in 0..channels {
                let x = frame[c] * drive;
                let x = if x > 0.0 { x * (1.0 + asym) } else { x };
                let s = shapers::soft_saturate(x);
                let y = s + ((s * FRAC_PI_2).sin() - s) * mojo;
                self.lowpass[c] = y + coeff * (self.lowpass[c] - y);
                frame[c] = self.dc[c].process(self.lowpass[c]);
            }
        });
    }

    fn reset(&mut self) {
        self.lowpass = [0.0; MAX_CHANNELS];
        for dc in self.dc.iter_mut() {
            dc.reset();
        }
    }
}
