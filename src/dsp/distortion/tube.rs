//! Tube saturation on four parallel lanes (one lane per channel).
//!
//! Signal path per lane:
//! drive + bias, minus a 4 Hz lossy integrator that tracks the bias shift,
//! asymmetric exponential shaper, a second "jeff" stage, and a one-pole tone
//! low-pass between 200 Hz and 20 kHz.

use std::f32::consts::PI;
use std::sync::Arc;

use super::shapers;
use crate::dsp::block::{AudioBlock, ProcessSpec};
use crate::dsp::utils::db_to_gain;
use crate::dsp::BlockProcessor;
use crate::params::{FloatParamId, ParamStore, SmoothedFloat};

const LANES: usize = 4;
type Lanes = [f32; LANES];

const MAX_DRIVE_DB: f32 = 30.0;
const MAX_JEFF_DRIVE: f32 = 4.0;

const INTEGRATOR_FC: f32 = 4.0;
const INTEGRATOR_Q: f32 = 0.607;

#[inline]
fn map(a: Lanes, f: impl Fn(f32) -> f32) -> Lanes {
    [f(a[0]), f(a[1]), f(a[2]), f(a[3])]
}

#[inline]
fn zip(a: Lanes, b: Lanes, f: impl Fn(f32, f32) -> f32) -> Lanes {
    [f(a[0], b[0]), f(a[1], b[1]), f(a[2], b[2]), f(a[3], b[3])]
}

/// TPT state-variable low-pass, used as a lossy integrator.
#[derive(Clone, Copy, Debug)]
pub struct LossyIntegrator {
    g: f32,
    rho: f32,
    alpha0: f32,
    s1: Lanes,
    s2: Lanes,
}

impl Default for LossyIntegrator {
    fn default() -> Self {
        let mut integrator = Self {
            g: 0.0,
            rho: 0.0,
            alpha0: 1.0,
            s1: [0.0; LANES],
            s2: [0.0; LANES],
        };
        integrator.prepare(44100.0);
        integrator
    }
}

impl LossyIntegrator {
    pub fn prepare(&mut self, sample_rate: f32) {
        let r = 1.0 / (2.0 * INTEGRATOR_Q);
        self.g = (PI * INTEGRATOR_FC / sample_rate.max(1.0)).tan();
        self.rho = 2.0 * r + self.g;
        self.alpha0 = 1.0 / (1.0 + 2.0 * r * self.g + self.g * self.g);
        self.reset();
    }

    #[inline]
    pub fn process(&mut self, x: Lanes) -> Lanes {
        let mut lp = [0.0; LANES];
        for lane in 0..LANES {
            let hp = (x[lane] - self.rho * self.s1[lane] - self.s2[lane]) * self.alpha0;
            let bp = self.g * hp + self.s1[lane];
            self.s1[lane] = self.g * hp + bp;
            lp[lane] = self.g * bp + self.s2[lane];
            self.s2[lane] = self.g * bp + lp[lane];
        }
        lp
    }

    pub fn reset(&mut self) {
        self.s1 = [0.0; LANES];
        self.s2 = [0.0; LANES];
    }
}

pub struct Tube {
    amount: SmoothedFloat,
    jeff: SmoothedFloat,
    bias: SmoothedFloat,
    tone: SmoothedFloat,
    integrator: LossyIntegrator,
    tone_state: Lanes,
    sample_rate: f32,
}

impl Tube {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            amount: SmoothedFloat::new(store, FloatParamId::TubeAmount),
            jeff: SmoothedFloat::new(store, FloatParamId::JeffAmount),
            bias: SmoothedFloat::new(store, FloatParamId::TubeBias),
            tone: SmoothedFloat::new(store, FloatParamId::TubeTone),
            integrator: LossyIntegrator::default(),
            tone_state: [0.0; LANES],
            sample_rate: 44100.0,
        }
    }

    /// Tone low-pass coefficient: 200 Hz at 0, 20 kHz at 1.
    #[inline]
    fn tone_coeff(&self, tone: f32) -> f32 {
        let fc = (200.0 * 100.0f32.powf(tone)).min(self.sample_rate * 0.45);
        (-2.0 * PI * fc / self.sample_rate).exp()
    }

    #[inline]
    fn process_lanes(&mut self, x: Lanes, drive: f32, jeff: f32, bias: f32, tone_coeff: f32) -> Lanes {
        let driven = map(x, |v| v * drive + bias);
        let tracked = self.integrator.process(driven);
        let shaped = map(zip(driven, tracked, |v, lp| v - lp), shapers::tube);
        let jeffed = map(shaped, |v| {
            v + (shapers::tube(v * (1.0 + MAX_JEFF_DRIVE * jeff)) - v) * jeff
        });
        self.tone_state = zip(jeffed, self.tone_state, |v, s| v + tone_coeff * (s - v));
        self.tone_state
    }
}

impl BlockProcessor for Tube {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        for p in [&mut self.amount, &mut self.jeff, &mut self.bias, &mut self.tone] {
            p.prepare(spec.sample_rate);
        }
        self.integrator.prepare(spec.sample_rate);
        self.tone_state = [0.0; LANES];
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        for p in [&mut self.amount, &mut self.jeff, &mut self.bias, &mut self.tone] {
            p.update();
        }

        let mut tone_coeff = self.tone_coeff(self.tone.value());
        let mut tone_generation = self.tone.generation();

        block.for_each_frame(|frame, _channels| {
            let drive = db_to_gain(self.amount.next() * 0.01 * MAX_DRIVE_DB);
            let jeff = self.jeff.next() * 0.01;
            let bias = self.bias.next();
            self.tone.next();
            if self.tone.generation() != tone_generation {
                tone_generation = self.tone.generation();
                tone_coeff = self.tone_coeff(self.tone.value());
            }

            let out = self.process_lanes([frame[0], frame[1], 0.0, 0.0], drive, jeff, bias, tone_coeff);
            frame[0] = out[0];
            frame[1] = out[1];
        });
    }

    fn reset(&mut self) {
        self.integrator.reset();
        self.tone_state = [0.0; LANES];
    }
}
