//! Per-sample parameter smoothing and typed parameter handles.
//!
//! A DSP component owns one handle per parameter it reads. Handles pull the
//! target from the shared [`ParamStore`] once per block (`update`) and then
//! advance per sample (`next`) or per block (`skip`).

use std::marker::PhantomData;
use std::sync::Arc;

use nih_plug::prelude::{Smoother, SmoothingStyle};

use super::ids::{BoolParamId, Choice, FloatParamId, IntParamId};
use super::store::ParamStore;

/// Linear ramp of `ramp_ms`, or no smoothing at all for a zero ramp.
pub fn linear_style(ramp_ms: f32) -> SmoothingStyle {
    if ramp_ms > 0.0 {
        SmoothingStyle::Linear(ramp_ms)
    } else {
        SmoothingStyle::None
    }
}

/// Smoothed view of a continuous parameter.
///
/// `generation()` advances every time the output value changes, so a
/// component can cache derived coefficients and recompute them only when one
/// of the generations it watches moves.
pub struct SmoothedFloat {
    store: Arc<ParamStore>,
    id: FloatParamId,
    smoother: Smoother<f32>,
    sample_rate: f32,
    target: f32,
    current: f32,
    generation: u32,
}

impl SmoothedFloat {
    pub fn new(store: &Arc<ParamStore>, id: FloatParamId) -> Self {
        let value = store.float(id);
        let smoother = Smoother::new(linear_style(id.descriptor().smoothing_ms));
        smoother.reset(value);
        Self {
            store: Arc::clone(store),
            id,
            smoother,
            sample_rate: 44100.0,
            target: value,
            current: value,
            generation: 0,
        }
    }

    pub fn id(&self) -> FloatParamId {
        self.id
    }

    /// Take the sample rate and jump to the current target.
    pub fn prepare(&mut self, sample_rate: f32) {
        let value = self.store.float(self.id);
        self.sample_rate = sample_rate;
        self.smoother.reset(value);
        self.target = value;
        self.current = value;
        self.generation = self.generation.wrapping_add(1);
    }

    #[inline]
    fn advance_to(&mut self, value: f32) -> f32 {
        if value != self.current {
            self.current = value;
            self.generation = self.generation.wrapping_add(1);
        }
        value
    }

    /// Pull the latest target from the store. Call once per block.
    #[inline]
    pub fn update(&mut self) {
        let target = self.store.float(self.id);
        if target == self.target {
            return;
        }
        self.target = target;
        self.smoother.set_target(self.sample_rate, target);
        if !self.smoother.is_smoothing() {
            self.smoother.reset(target);
            self.advance_to(target);
        }
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        if !self.smoother.is_smoothing() {
            return self.current;
        }
        let value = self.smoother.next();
        self.advance_to(value)
    }

    /// Advance `n` samples at once.
    #[inline]
    pub fn skip(&mut self, n: usize) -> f32 {
        if n == 0 || !self.smoother.is_smoothing() {
            return self.current;
        }
        let value = self.smoother.next_step(n.min(u32::MAX as usize) as u32);
        self.advance_to(value)
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.smoother.is_smoothing()
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Unsmoothed read of a continuous parameter.
pub struct FloatValue {
    store: Arc<ParamStore>,
    id: FloatParamId,
}

impl FloatValue {
    pub fn new(store: &Arc<ParamStore>, id: FloatParamId) -> Self {
        Self {
            store: Arc::clone(store),
            id,
        }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.store.float(self.id)
    }
}

pub struct BoolValue {
    store: Arc<ParamStore>,
    id: BoolParamId,
}

impl BoolValue {
    pub fn new(store: &Arc<ParamStore>, id: BoolParamId) -> Self {
        Self {
            store: Arc::clone(store),
            id,
        }
    }

    #[inline]
    pub fn value(&self) -> bool {
        self.store.bool(self.id)
    }
}

pub struct IntValue {
    store: Arc<ParamStore>,
    id: IntParamId,
}

impl IntValue {
    pub fn new(store: &Arc<ParamStore>, id: IntParamId) -> Self {
        Self {
            store: Arc::clone(store),
            id,
        }
    }

    #[inline]
    pub fn value(&self) -> i32 {
        self.store.int(self.id)
    }
}

/// Typed read of a categorical parameter.
pub struct ChoiceValue<T: Choice> {
    store: Arc<ParamStore>,
    _choice: PhantomData<T>,
}

impl<T: Choice> ChoiceValue<T> {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            store: Arc::clone(store),
            _choice: PhantomData,
        }
    }

    #[inline]
    pub fn value(&self) -> T {
        T::from_option(self.store.choice_index(T::PARAM))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ids::{DistortionType, FloatRange};

    #[test]
    fn test_linear_ramp_reaches_target() {
        let store = ParamStore::shared();
        let mut p = SmoothedFloat::new(&store, FloatParamId::InputGain);
        // 50 ms at 1 kHz.
        p.prepare(1000.0);
        store.set(FloatParamId::InputGain, 10.0);
        p.update();
        for _ in 0..49 {
            p.next();
            assert!(p.is_smoothing());
        }
        assert_eq!(p.next(), 10.0);
        assert!(!p.is_smoothing());
    }

    #[test]
    fn test_zero_ramp_is_immediate() {
        let store = ParamStore::shared();
        let mut p = SmoothedFloat::new(&store, FloatParamId::AllPassAmount);
        p.prepare(48000.0);
        let g0 = p.generation();
        store.set(FloatParamId::AllPassAmount, 20.0);
        p.update();
        assert_eq!(p.value(), 20.0);
        assert_eq!(p.next(), 20.0);
        assert!(!p.is_smoothing());
        assert_ne!(p.generation(), g0);
    }

    #[test]
    fn test_skip_matches_next() {
        let store = ParamStore::shared();
        let mut a = SmoothedFloat::new(&store, FloatParamId::OutputGain);
        let mut b = SmoothedFloat::new(&store, FloatParamId::OutputGain);
        a.prepare(1000.0);
        b.prepare(1000.0);
        store.set(FloatParamId::OutputGain, -12.0);
        a.update();
        b.update();
        for _ in 0..3 {
            a.next();
        }
        assert!((b.skip(3) - a.value()).abs() < 1e-5);
        assert_eq!(b.skip(100), -12.0);
        assert!(!b.is_smoothing());
    }

    #[test]
    fn test_per_sample_delta_bounded() {
        let store = ParamStore::shared();
        let id = FloatParamId::InputGain;
        let mut p = SmoothedFloat::new(&store, id);
        let sr = 48000.0;
        p.prepare(sr);

        let FloatRange::Linear { min, max } = id.descriptor().range else {
            panic!("input gain is linear");
        };
        let ramp = (id.descriptor().smoothing_ms * 0.001 * sr).round();
        let bound = (max - min) / ramp + 1e-5;

        // Full-range jumps in both directions, including mid-ramp reversals.
        let targets = [max, min, max, 0.0, min];
        for (i, t) in targets.iter().enumerate() {
            store.set(id, *t);
            p.update();
            let mut last = p.value();
            for _ in 0..(500 + i * 700) {
                let v = p.next();
                assert!((v - last).abs() <= bound);
                assert!(v >= min && v <= max);
                last = v;
            }
        }
    }

    #[test]
    fn test_generation_advances_only_on_change() {
        let store = ParamStore::shared();
        let mut p = SmoothedFloat::new(&store, FloatParamId::AllPassFreq);
        p.prepare(44100.0);
        let g0 = p.generation();
        p.update();
        p.skip(64);
        assert_eq!(p.generation(), g0);

        store.set(FloatParamId::AllPassFreq, 1000.0);
        p.update();
        p.skip(64);
        assert_ne!(p.generation(), g0);
    }

    #[test]
    fn test_choice_value() {
        let store = ParamStore::shared();
        let choice = ChoiceValue::<DistortionType>::new(&store);
        assert_eq!(choice.value(), DistortionType::Classic);
        store.set(DistortionType::PARAM, 2.0);
        assert_eq!(choice.value(), DistortionType::Phase);
    }
}
