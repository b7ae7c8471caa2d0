//! Memoryless transfer curves shared by the distortion variants.
//!
//! Every curve clamps its argument before `exp` or division so that any
//! finite input gives a finite output.

/// Largest argument handed to `exp`.
const EXP_LIMIT: f32 = 50.0;

/// Pade tanh approximation, exact +-1 and zero slope at |x| = 3.
#[inline]
pub fn rational_clip(x: f32) -> f32 {
    let x = x.clamp(-3.0, 3.0);
    let x2 = x * x;
    x * (27.0 + x2) / (27.0 + 9.0 * x2)
}

/// `x / (1 + |x|)`
#[inline]
pub fn soft_saturate(x: f32) -> f32 {
    let x = x.clamp(-1e6, 1e6);
    x / (1.0 + x.abs())
}

/// Asymmetric exponential diode. The negative side saturates at -0.5.
#[inline]
pub fn diode(x: f32) -> f32 {
    let x = x.clamp(-EXP_LIMIT, EXP_LIMIT);
    if x >= 0.0 {
        1.0 - (-x).exp()
    } else {
        -0.5 * (1.0 - (2.0 * x).exp())
    }
}

/// Tube-style exponential shaper, harder on the negative side.
#[inline]
pub fn tube(x: f32) -> f32 {
    let x = x.clamp(-EXP_LIMIT, EXP_LIMIT);
    if x >= 0.0 {
        1.0 - (-x).exp()
    } else {
        -(1.0 - (1.4 * x).exp()) / 1.4
    }
}

/// `x (1 + k) / (1 + k |x|)`
#[inline]
pub fn cooked(x: f32, k: f32) -> f32 {
    let x = x.clamp(-1e6, 1e6);
    x * (1.0 + k) / (1.0 + k * x.abs())
}

/// Widest knee that still starts at or above zero.
pub const MAX_KNEE: f32 = 2.0;

/// Hard clip with a C1 quadratic knee of width `knee` centred on +-1.
/// Widths above [`MAX_KNEE`] are treated as `MAX_KNEE`.
#[inline]
pub fn knee_clip(x: f32, knee: f32) -> f32 {
    let a = x.abs();
    if knee <= 0.0 {
        return x.clamp(-1.0, 1.0);
    }
    let knee = knee.min(MAX_KNEE);
    let half = knee * 0.5;
    let y = if a <= 1.0 - half {
        a
    } else if a >= 1.0 + half {
        1.0
    } else {
        let d = a - (1.0 - half);
        (a - d * d / (2.0 * knee)).min(1.0)
    };
    y.copysign(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curves_are_finite_and_bounded() {
        for &x in &[0.0, 1e-30, 0.5, -0.5, 1.0, -1.0, 10.0, -10.0, 1e30, -1e30, f32::MAX, f32::MIN] {
            for y in [rational_clip(x), soft_saturate(x), diode(x), tube(x), knee_clip(x, 0.5)] {
                assert!(y.is_finite(), "{x}");
                assert!(y.abs() <= 1.0 + 1e-6, "{x} -> {y}");
            }
            // bounded by (1 + k) / k
            let y = cooked(x, 10.0);
            assert!(y.is_finite() && y.abs() <= 1.1 + 1e-5);
        }
    }

    #[test]
    fn test_small_signal_slope_is_unity() {
        let x = 1e-3;
        assert!((rational_clip(x) / x - 1.0).abs() < 1e-3);
        assert!((diode(x) / x - 1.0).abs() < 1e-2);
        assert!((tube(x) / x - 1.0).abs() < 1e-2);
        assert!((cooked(x, 3.0) / x - 4.0).abs() < 1e-2);
    }

    #[test]
    fn test_knee_clip_is_c1() {
        let w = 0.5;
        for edge in [1.0 - w / 2.0, 1.0 + w / 2.0] {
            let lo = knee_clip(edge - 1e-4, w);
            let hi = knee_clip(edge + 1e-4, w);
            assert!((lo - hi).abs() < 1e-3);
        }
        assert_eq!(knee_clip(0.5, w), 0.5);
        assert_eq!(knee_clip(-3.0, w), -1.0);
        assert_eq!(knee_clip(1.2, 0.0), 1.0);
    }

    #[test]
    fn test_knee_clip_keeps_zero_and_monotonic_for_every_width() {
        // postClipKnee covers 0..4
        for step in 0..=40 {
            let w = step as f32 * 0.1;
            assert_eq!(knee_clip(0.0, w), 0.0, "knee {w}");
            assert_eq!(knee_clip(-0.0, w), 0.0, "knee {w}");
            let mut last = knee_clip(-4.0, w);
            for i in 1..=8000 {
                let x = -4.0 + i as f32 * 0.001;
                let y = knee_clip(x, w);
                assert!(y >= last - 1e-6, "knee {w}: f({x}) = {y} < {last}");
                assert!(y.abs() <= 1.0);
                last = y;
            }
            let eps = 1e-4;
            assert!((knee_clip(eps, w) - knee_clip(-eps, w) - 2.0 * eps).abs() < 1e-5);
        }
    }

    #[test]
    fn test_wide_knee_is_c1_at_the_cap() {
        for w in [MAX_KNEE, 3.0, 4.0] {
            let lo = knee_clip(2.0 - 1e-4, w);
            let hi = knee_clip(2.0 + 1e-4, w);
            assert!((lo - hi).abs() < 1e-3);
            assert_eq!(knee_clip(2.5, w), 1.0);
        }
    }

    #[test]
    fn test_cooked_zero_amount_is_identity() {
        for x in [-0.9, -0.1, 0.0, 0.3, 0.99] {
            assert_eq!(cooked(x, 0.0), x);
        }
    }
}
