//! Peak Envelope Follower
//!
//! Level detector for the dynamics engine. One follower runs per band and
//! channel, once per sample.
//!
//! # Design Notes
//! - Attack/release are one-pole coefficients from `time_constant_coeff`
//! - Times are floored at 0.1 ms so a zero speed stays stable
//! - **No Allocations**: plain `f32` state

use crate::dsp::utils::time_constant_coeff;

/// Shortest usable attack/release time.
pub const MIN_TIME_MS: f32 = 0.1;

#[derive(Clone, Copy, Debug)]
pub struct PeakFollower {
    attack_coeff: f32,
    release_coeff: f32,
    level: f32,
}

impl Default for PeakFollower {
    fn default() -> Self {
        Self {
            attack_coeff: 0.0,
            release_coeff: 0.0,
            level: 0.0,
        }
    }
}

impl PeakFollower {
    pub fn new(attack_ms: f32, release_ms: f32, sample_rate: f32) -> Self {
        let mut follower = Self::default();
        follower.set_times(attack_ms, release_ms, sample_rate);
        follower
    }

    pub fn set_times(&mut self, attack_ms: f32, release_ms: f32, sample_rate: f32) {
        self.attack_coeff = time_constant_coeff(attack_ms.max(MIN_TIME_MS), sample_rate);
        self.release_coeff = time_constant_coeff(release_ms.max(MIN_TIME_MS), sample_rate);
    }

    /// Feed a rectified detector value, returns the new envelope level.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let coeff = if input > self.level {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.level = input + coeff * (self.level - input);
        self.level
    }

    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn reset(&mut self) {
        self.level = 0.0;
    }
}
