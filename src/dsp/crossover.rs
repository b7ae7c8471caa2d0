//! Three-band Linkwitz-Riley split.
//!
//! Low and high bands are 4th-order (two cascaded Butterworth sections). The
//! mid band is whatever is left, so `low + mid + high == input` exactly.

use crate::dsp::biquad::Biquad;

pub const LOW_CROSSOVER_HZ: f32 = 500.0;
pub const HIGH_CROSSOVER_HZ: f32 = 2500.0;

const BUTTERWORTH_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

#[derive(Clone, Copy, Debug, Default)]
pub struct Bands {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

/// One channel of the split.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreeBandSplit {
    low: [Biquad; 2],
    high: [Biquad; 2],
}

impl ThreeBandSplit {
    pub fn prepare(&mut self, sample_rate: f32) {
        let low_hz = LOW_CROSSOVER_HZ.min(sample_rate * 0.45);
        let high_hz = HIGH_CROSSOVER_HZ.min(sample_rate * 0.45);
        for section in self.low.iter_mut() {
            section.update_lpf(low_hz, BUTTERWORTH_Q, sample_rate);
        }
        for section in self.high.iter_mut() {
            section.update_hpf(high_hz, BUTTERWORTH_Q, sample_rate);
        }
    }

    #[inline]
    pub fn split(&mut self, x: f32) -> Bands {
        let low = self.low[1].process(self.low[0].process(x));
        let high = self.high[1].process(self.high[0].process(x));
        Bands {
            low,
            mid: x - low - high,
            high,
        }
    }

    pub fn reset(&mut self) {
        for section in self.low.iter_mut().chain(self.high.iter_mut()) {
            section.reset();
        }
    }
}
