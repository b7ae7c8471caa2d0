//! Thread-safe metering shared between the audio thread and an editor.
//!
//! Values are atomic f32 bit patterns, written once per block and read
//! without locks.

use std::sync::atomic::{AtomicU32, Ordering};

pub const NUM_GR_BANDS: usize = 3;

/// Input/output peaks (linear) and per-band dynamics gain change (dB).
#[derive(Default)]
pub struct Meters {
    input_peak_l: AtomicU32,
    input_peak_r: AtomicU32,
    output_peak_l: AtomicU32,
    output_peak_r: AtomicU32,
    gain_reduction_db: [AtomicU32; NUM_GR_BANDS],
}

impl Meters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_input_peak_l(&self, val: f32) {
        self.input_peak_l.store(val.to_bits(), Ordering::Relaxed);
    }

    pub fn set_input_peak_r(&self, val: f32) {
        self.input_peak_r.store(val.to_bits(), Ordering::Relaxed);
    }

    pub fn set_output_peak_l(&self, val: f32) {
        self.output_peak_l.store(val.to_bits(), Ordering::Relaxed);
    }

    pub fn set_output_peak_r(&self, val: f32) {
        self.output_peak_r.store(val.to_bits(), Ordering::Relaxed);
    }

    pub fn set_gain_reduction_db(&self, values: [f32; NUM_GR_BANDS]) {
        for (slot, val) in self.gain_reduction_db.iter().zip(values) {
            slot.store(val.to_bits(), Ordering::Relaxed);
        }
    }

    pub fn get_input_peak_l(&self) -> f32 {
        f32::from_bits(self.input_peak_l.load(Ordering::Relaxed))
    }

    pub fn get_input_peak_r(&self) -> f32 {
        f32::from_bits(self.input_peak_r.load(Ordering::Relaxed))
    }

    pub fn get_output_peak_l(&self) -> f32 {
        f32::from_bits(self.output_peak_l.load(Ordering::Relaxed))
    }

    pub fn get_output_peak_r(&self) -> f32 {
        f32::from_bits(self.output_peak_r.load(Ordering::Relaxed))
    }

    pub fn get_gain_reduction_db(&self) -> [f32; NUM_GR_BANDS] {
        let mut out = [0.0; NUM_GR_BANDS];
        for (o, slot) in out.iter_mut().zip(self.gain_reduction_db.iter()) {
            *o = f32::from_bits(slot.load(Ordering::Relaxed));
        }
        out
    }

    pub fn reset(&self) {
        for slot in [
            &self.input_peak_l,
            &self.input_peak_r,
            &self.output_peak_l,
            &self.output_peak_r,
        ] {
            slot.store(0, Ordering::Relaxed);
        }
        self.set_gain_reduction_db([0.0; NUM_GR_BANDS]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_reset() {
        let meters = Meters::new();
        meters.set_input_peak_r(0.5);
        meters.set_gain_reduction_db([-3.0, 0.0, 1.5]);
        assert_eq!(meters.get_input_peak_r(), 0.5);
        assert_eq!(meters.get_gain_reduction_db(), [-3.0, 0.0, 1.5]);

        meters.reset();
        assert_eq!(meters.get_input_peak_r(), 0.0);
        assert_eq!(meters.get_gain_reduction_db(), [0.0; NUM_GR_BANDS]);
    }
}
