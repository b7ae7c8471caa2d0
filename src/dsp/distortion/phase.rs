//! Phase distortion: a cascade of first-order all-passes whose break
//! frequency is swept by the signal itself.

use std::f32::consts::PI;
use std::sync::Arc;

use crate::dsp::block::{AudioBlock, ProcessSpec, MAX_CHANNELS};
use crate::dsp::BlockProcessor;
use crate::params::{FloatParamId, ParamStore, SmoothedFloat};

const STAGES: usize = 4;
/// Sweep range in octaves at full amount and full-scale input.
const MAX_SWEEP_OCTAVES: f32 = 4.0;
const MIN_FREQ_HZ: f32 = 20.0;

#[derive(Clone, Copy, Debug, Default)]
struct AllPassCascade {
    state: [f32; STAGES],
}

impl AllPassCascade {
    /// `y = a x + s`, `s = x - a y` per stage.
    #[inline]
    fn process(&mut self, x: f32, a: f32) -> f32 {
        let mut v = x;
        for s in self.state.iter_mut() {
            let y = a * v + *s;
            *s = v - a * y;
            v = y;
        }
        v
    }

    fn reset(&mut self) {
        self.state = [0.0; STAGES];
    }
}

pub struct Phase {
    amount: SmoothedFloat,
    tone: SmoothedFloat,
    stereo: SmoothedFloat,
    rectify: SmoothedFloat,
    cascades: [AllPassCascade; MAX_CHANNELS],
    sample_rate: f32,
}

impl Phase {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            amount: SmoothedFloat::new(store, FloatParamId::PhaseAmount),
            tone: SmoothedFloat::new(store, FloatParamId::PhaseDistTone),
            stereo: SmoothedFloat::new(store, FloatParamId::PhaseDistStereo),
            rectify: SmoothedFloat::new(store, FloatParamId::PhaseRectify),
            cascades: Default::default(),
            sample_rate: 44100.0,
        }
    }

    #[inline]
    fn coefficient(&self, freq: f32) -> f32 {
        let freq = freq.clamp(MIN_FREQ_HZ, self.sample_rate * 0.45);
        let t = (PI * freq / self.sample_rate).tan();
        (t - 1.0) / (t + 1.0)
    }
}

impl BlockProcessor for Phase {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        for p in [&mut self.amount, &mut self.tone, &mut self.stereo, &mut self.rectify] {
            p.prepare(spec.sample_rate);
        }
        self.reset();
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        for p in [&mut self.amount, &mut self.tone, &mut self.stereo, &mut self.rectify] {
            p.update();
        }

        block.for_each_frame(|frame, channels| {
            let depth = self.amount.next() * 0.01 * MAX_SWEEP_OCTAVES;
            let tone = self.tone.next();
            let stereo = self.stereo.next();
            let rectify = self.rectify.next();

            for c in 0..channels {
                let x = frame[c];
                let modulator = x + (x.abs() - x) * rectify;
                // right channel sweeps the other way as stereo goes to 1
                let side = if c == 1 { 1.0 - 2.0 * stereo } else { 1.0 };
                let octaves = (depth * side * modulator.clamp(-1.0, 1.0))
                    .clamp(-MAX_SWEEP_OCTAVES, MAX_SWEEP_OCTAVES);
                let a = self.coefficient(tone * octaves.exp2());
                frame[c] = self.cascades[c].process(x, a);
            }
        });
    }

    fn reset(&mut self) {
        for cascade in self.cascades.iter_mut() {
            cascade.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_cascade_preserves_energy() {
        let mut cascade = AllPassCascade::default();
        let t = (PI * 500.0 / 48000.0).tan();
        let a = (t - 1.0) / (t + 1.0);

        let mut e_in = 0.0;
        let mut e_out = 0.0;
        for n in 0..48000 {
            let x = (n as f32 * 0.05).sin();
            let y = cascade.process(x, a);
            if n > 4800 {
                e_in += x * x;
                e_out += y * y;
            }
        }
        assert!((e_out / e_in - 1.0).abs() < 0.01);
    }
}
