//! Small shared DSP helpers.

/// Floor used when converting silence to decibels.
pub const DB_EPS: f32 = 1e-9;

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    (10.0f32).powf(db / 20.0)
}

#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.abs().max(DB_EPS).log10()
}

/// One-pole coefficient for a time constant in milliseconds.
#[inline]
pub fn time_constant_coeff(ms: f32, sample_rate: f32) -> f32 {
    let samples = (ms * 0.001 * sample_rate).max(1e-6);
    (-1.0 / samples).exp()
}

/// DC blocking high-pass, `y[n] = x[n] - x[n-1] + R * y[n-1]`.
#[derive(Debug, Clone, Copy)]
pub struct DcBlocker {
    r: f32,
    x1: f32,
    y1: f32,
}

impl DcBlocker {
    /// Corner around 10 Hz.
    pub fn new(sample_rate: f32) -> Self {
        let mut blocker = Self {
            r: 0.995,
            x1: 0.0,
            y1: 0.0,
        };
        blocker.prepare(sample_rate);
        blocker
    }

    pub fn prepare(&mut self, sample_rate: f32) {
        let sr = sample_rate.max(1.0);
        self.r = (1.0 - 2.0 * std::f32::consts::PI * 10.0 / sr).clamp(0.9, 0.99999);
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = x - self.x1 + self.r * self.y1 + 1e-25;
        self.x1 = x;
        self.y1 = y;
        y
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

impl Default for DcBlocker {
    fn default() -> Self {
        Self::new(44100.0)
    }
}

/// xorshift32 white noise in [-1, 1). Deterministic for a given seed.
#[derive(Debug, Clone, Copy)]
pub struct Xorshift {
    state: u32,
}

impl Xorshift {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9 } else { seed },
        }
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 * (2.0 / 16_777_216.0) - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_roundtrip_points() {
        assert!((db_to_gain(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_gain(-6.0206) - 0.5).abs() < 1e-4);
        assert!((gain_to_db(0.1) + 20.0).abs() < 1e-4);
        assert!(gain_to_db(0.0).is_finite());
    }

    #[test]
    fn test_dc_blocker_removes_offset() {
        let mut dc = DcBlocker::new(48000.0);
        let mut y = 0.0;
        for _ in 0..48000 {
            y = dc.process(0.5);
        }
        assert!(y.abs() < 1e-3);
    }

    #[test]
    fn test_xorshift_range_and_determinism() {
        let mut a = Xorshift::new(1234);
        let mut b = Xorshift::new(1234);
        for _ in 0..10_000 {
            let v = a.next_bipolar();
            assert!((-1.0..1.0).contains(&v));
            assert_eq!(v, b.next_bipolar());
        }
    }
}
