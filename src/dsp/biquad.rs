//! Biquad Filter Implementation (IIR 2nd Order)
//!
//! RBJ cookbook designs used by the crossovers, the emphasis shelves, the noise
//! band-passes and the all-pass pre-distortion. Coefficient updates keep the
//! filter state.

use std::f32::consts::PI;

/// Biquad filter implementation (IIR 2nd order)
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    a0: f32,
    a1: f32,
    a2: f32,
    b1: f32,
    b2: f32,
    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn new() -> Self {
        Self {
            a0: 1.0,
            a1: 0.0,
            a2: 0.0,
            b1: 0.0,
            b2: 0.0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Take another filter's coefficients, keeping this filter's state.
    #[inline]
    pub fn copy_coefficients(&mut self, other: &Biquad) {
        self.a0 = other.a0;
        self.a1 = other.a1;
        self.a2 = other.a2;
        self.b1 = other.b1;
        self.b2 = other.b2;
    }

    /// Process a single sample
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let out = input * self.a0 + self.z1;

        // Anti-denormal: tiny DC offset
        self.z1 = input * self.a1 + self.z2 - self.b1 * out + 1e-25;
        self.z2 = input * self.a2 - self.b2 * out + 1e-25;

        out
    }

    /// Clear the delay state. Coefficient updates never do this.
    #[inline]
    pub fn reset_state(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    /// Alias for reset_state() for API consistency
    #[inline]
    pub fn reset(&mut self) {
        self.reset_state();
    }

    // ---------------------------------------------------------------------
    // Filter design helpers (RBJ-style)
    // ---------------------------------------------------------------------

    pub fn update_hpf(&mut self, cutoff: f32, q: f32, sr: f32) {
        let w0 = 2.0 * PI * cutoff / sr;
        let alpha = w0.sin() / (2.0 * q.max(1e-6));
        let cw0 = w0.cos();

        let a0 = 1.0 + alpha;
        let inv_a0 = 1.0 / a0;

        self.a0 = ((1.0 + cw0) * 0.5) * inv_a0;
        self.a1 = -(1.0 + cw0) * inv_a0;
        self.a2 = ((1.0 + cw0) * 0.5) * inv_a0;
        self.b1 = (-2.0 * cw0) * inv_a0;
        self.b2 = (1.0 - alpha) * inv_a0;
    }

    pub fn update_lpf(&mut self, cutoff: f32, q: f32, sr: f32) {
        let w0 = 2.0 * PI * cutoff / sr;
        let alpha = w0.sin() / (2.0 * q.max(1e-6));
        let cw0 = w0.cos();

        let a0 = 1.0 + alpha;
        let inv_a0 = 1.0 / a0;

        self.a0 = ((1.0 - cw0) * 0.5) * inv_a0;
        self.a1 = (1.0 - cw0) * inv_a0;
        self.a2 = ((1.0 - cw0) * 0.5) * inv_a0;
        self.b1 = (-2.0 * cw0) * inv_a0;
        self.b2 = (1.0 - alpha) * inv_a0;
    }

    pub fn update_low_shelf(&mut self, cutoff: f32, q: f32, gain_db: f32, sr: f32) {
        // Bypass when effectively flat
        if gain_db.abs() < 0.01 {
            self.a0 = 1.0;
            self.a1 = 0.0;
            self.a2 = 0.0;
            self.b1 = 0.0;
            self.b2 = 0.0;
            return;
        }

        let a = 10.0_f32.powf(gain_db / 40.0);
        let w0 = 2.0 * PI * cutoff / sr;
        let alpha = w0.sin() / (2.0 * q.max(1e-6));
        let cw0 = w0.cos();
        let sqrt_a = a.sqrt();

        let b0 = a * ((a + 1.0) - (a - 1.0) * cw0 + 2.0 * sqrt_a * alpha);
        let b1 = 2.0 * a * ((a - 1.0) - (a + 1.0) * cw0);
        let b2 = a * ((a + 1.0) - (a - 1.0) * cw0 - 2.0 * sqrt_a * alpha);

        let a0 = (a + 1.0) + (a - 1.0) * cw0 + 2.0 * sqrt_a * alpha;
        let a1 = -2.0 * ((a - 1.0) + (a + 1.0) * cw0);
        let a2 = (a + 1.0) + (a - 1.0) * cw0 - 2.0 * sqrt_a * alpha;

        let inv_a0 = 1.0 / a0;

        self.a0 = b0 * inv_a0;
        self.a1 = b1 * inv_a0;
        self.a2 = b2 * inv_a0;
        self.b1 = a1 * inv_a0;
        self.b2 = a2 * inv_a0;
    }

    pub fn update_high_shelf(&mut self, cutoff: f32, q: f32, gain_db: f32, sr: f32) {
        // Bypass when effectively flat
        if gain_db.abs() < 0.01 {
            self.a0 = 1.0;
            self.a1 = 0.0;
            self.a2 = 0.0;
            self.b1 = 0.0;
            self.b2 = 0.0;
            return;
        }

        let a = 10.0_f32.powf(gain_db / 40.0);
        let w0 = 2.0 * PI * cutoff / sr;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();

        // Shelf slope (RBJ S parameter)
        let s = q.max(1e-6);
        let alpha = sin_w0 * 0.5 * ((a + 1.0 / a) * (1.0 / s - 1.0) + 2.0).sqrt();

        let b0 = a * ((a + 1.0) + (a - 1.0) * cos_w0 + 2.0 * alpha);
        let b1 = -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0);
        let b2 = a * ((a + 1.0) + (a - 1.0) * cos_w0 - 2.0 * alpha);

        let a0 = (a + 1.0) - (a - 1.0) * cos_w0 + 2.0 * alpha;
        let a1 = 2.0 * ((a - 1.0) - (a + 1.0) * cos_w0);
        let a2 = (a + 1.0) - (a - 1.0) * cos_w0 - 2.0 * alpha;

        let inv_a0 = 1.0 / a0;

        self.a0 = b0 * inv_a0;
        self.a1 = b1 * inv_a0;
        self.a2 = b2 * inv_a0;
        self.b1 = a1 * inv_a0;
        self.b2 = a2 * inv_a0;
    }

    pub fn update_bpf(&mut self, center: f32, q: f32, sr: f32) {
        let w0 = 2.0 * PI * center.clamp(1.0, sr * 0.49) / sr;
        let alpha = w0.sin() / (2.0 * q.max(1e-6));
        let cw0 = w0.cos();

        let inv_a0 = 1.0 / (1.0 + alpha);

        // Constant 0 dB peak gain
        self.a0 = alpha * inv_a0;
        self.a1 = 0.0;
        self.a2 = -alpha * inv_a0;
        self.b1 = (-2.0 * cw0) * inv_a0;
        self.b2 = (1.0 - alpha) * inv_a0;
    }

    pub fn update_allpass(&mut self, cutoff: f32, q: f32, sr: f32) {
        let w0 = 2.0 * PI * cutoff.clamp(1.0, sr * 0.49) / sr;
        let alpha = w0.sin() / (2.0 * q.max(1e-6));
        let cw0 = w0.cos();

        let inv_a0 = 1.0 / (1.0 + alpha);

        self.a0 = (1.0 - alpha) * inv_a0;
        self.a1 = (-2.0 * cw0) * inv_a0;
        self.a2 = 1.0;
        self.b1 = (-2.0 * cw0) * inv_a0;
        self.b2 = (1.0 - alpha) * inv_a0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// One biquad per channel sharing the same coefficients.
#[derive(Debug, Clone, Copy, Default)]
pub struct StereoBiquad {
    pub left: Biquad,
    pub right: Biquad,
}

impl StereoBiquad {
    #[inline]
    pub fn set_coefficients_from(&mut self, design: &Biquad) {
        self.left.copy_coefficients(design);
        self.right.copy_coefficients(design);
    }

    #[inline]
    pub fn channel(&mut self, index: usize) -> &mut Biquad {
        if index == 0 {
            &mut self.left
        } else {
            &mut self.right
        }
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn magnitude_at(filter: &Biquad, freq: f32, sr: f32) -> f32 {
        // Steady-state sine response
        let mut f = *filter;
        f.reset();
        let w = 2.0 * PI * freq / sr;
        let mut peak = 0.0f32;
        for n in 0..(sr as usize) {
            let y = f.process((w * n as f32).sin());
            if n > sr as usize / 2 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn test_allpass_is_flat() {
        let mut ap = Biquad::new();
        ap.update_allpass(500.0, 0.7, 48000.0);
        for f in [50.0, 500.0, 5000.0] {
            assert!((magnitude_at(&ap, f, 48000.0) - 1.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_bpf_peak_is_unity() {
        let mut bp = Biquad::new();
        bp.update_bpf(1000.0, 1.0, 48000.0);
        assert!((magnitude_at(&bp, 1000.0, 48000.0) - 1.0).abs() < 0.01);
        assert!(magnitude_at(&bp, 50.0, 48000.0) < 0.1);
    }

    #[test]
    fn test_shelf_with_negated_gain_inverts() {
        let sr = 48000.0;
        let mut boost = Biquad::new();
        let mut cut = Biquad::new();
        boost.update_low_shelf(200.0, 0.707, 9.0, sr);
        cut.update_low_shelf(200.0, 0.707, -9.0, sr);

        let mut max_err = 0.0f32;
        for n in 0..4096 {
            let x = ((n as f32) * 0.37).sin() * 0.5;
            let y = cut.process(boost.process(x));
            max_err = max_err.max((y - x).abs());
        }
        assert!(max_err < 1e-3);
    }
}
