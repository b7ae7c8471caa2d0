//! Stages that run ahead of the primary distortion: the all-pass chain or
//! "grunge", an added even-order component.

use std::f32::consts::PI;
use std::sync::Arc;

use crate::dsp::allpass_chain::AllPassChain;
use crate::dsp::block::{AudioBlock, ProcessSpec, MAX_CHANNELS};
use crate::dsp::utils::DcBlocker;
use crate::dsp::BlockProcessor;
use crate::params::{ChoiceValue, FloatParamId, ParamStore, PreDistortionType, SmoothedFloat};

/// Adds a low-passed, DC-free `x|x|` to the signal.
pub struct Grunge {
    amount: SmoothedFloat,
    tone: SmoothedFloat,
    lowpass: [f32; MAX_CHANNELS],
    dc: [DcBlocker; MAX_CHANNELS],
    coeff: f32,
    tone_generation: u32,
    sample_rate: f32,
}

impl Grunge {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            amount: SmoothedFloat::new(store, FloatParamId::GrungeAmt),
            tone: SmoothedFloat::new(store, FloatParamId::GrungeTone),
            lowpass: [0.0; MAX_CHANNELS],
            dc: Default::default(),
            coeff: 0.0,
            tone_generation: u32::MAX,
            sample_rate: 44100.0,
        }
    }

    fn refresh(&mut self) {
        if self.tone.generation() == self.tone_generation {
            return;
        }
        self.tone_generation = self.tone.generation();
        let fc = (200.0 * 100.0f32.powf(self.tone.value())).min(self.sample_rate * 0.45);
        self.coeff = (-2.0 * PI * fc / self.sample_rate).exp();
    }
}

impl BlockProcessor for Grunge {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        self.amount.prepare(spec.sample_rate);
        self.tone.prepare(spec.sample_rate);
        for dc in self.dc.iter_mut() {
            dc.prepare(spec.sample_rate);
        }
        self.tone_generation = u32::MAX;
        self.refresh();
        self.reset();
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        self.amount.update();
        self.tone.update();
        self.tone.skip(block.num_samples());
        self.refresh();

        let coeff = self.coeff;
        block.for_each_frame(|frame, channels| {
            let amount = self.amount.next();
            for c in 0..channels {
                let x = frame[c];
                let even = x * x.abs();
                self.lowpass[c] = even + coeff * (self.lowpass[c] - even);
                frame[c] = x + self.dc[c].process(self.lowpass[c]) * amount;
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

/// Runs the stage picked by `preDistortionType`.
pub struct PreDistortion {
    selected: ChoiceValue<PreDistortionType>,
    active: PreDistortionType,
    allpass: AllPassChain,
    grunge: Grunge,
}

impl PreDistortion {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        let selected = ChoiceValue::new(store);
        let active = selected.value();
        Self {
            selected,
            active,
            allpass: AllPassChain::new(store),
            grunge: Grunge::new(store),
        }
    }

    pub fn active(&self) -> PreDistortionType {
        self.active
    }

    pub fn allpass(&self) -> &AllPassChain {
        &self.allpass
    }

    fn variant(&mut self, kind: PreDistortionType) -> &mut dyn BlockProcessor {
        match kind {
            PreDistortionType::AllPass => &mut self.allpass,
            PreDistortionType::Grunge => &mut self.grunge,
        }
    }
}

impl BlockProcessor for PreDistortion {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.allpass.prepare(spec);
        self.grunge.prepare(spec);
        self.active = self.selected.value();
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        let kind = self.selected.value();
        if kind != self.active {
            self.active = kind;
            self.variant(kind).reset();
        }
        self.variant(kind).process_block(block);
    }

    fn reset(&mut self) {
        self.allpass.reset();
        self.grunge.reset();
    }
}
