//! Static gain curves for the dynamics engine.
//!
//! All curves map an input level in dB to an output level in dB. Knees are
//! quadratic and meet the straight segments with matching value and slope.
//! A knee width of zero or less gives a hard knee.

/// Downward compression above the threshold.
#[inline]
pub fn compressor(x: f32, threshold: f32, ratio: f32, knee: f32) -> f32 {
    let half = knee * 0.5;
    if knee <= 0.0 {
        return if x > threshold {
            threshold + (x - threshold) / ratio
        } else {
            x
        };
    }
    if x < threshold - half {
        x
    } else if x > threshold + half {
        threshold + (x - threshold) / ratio
    } else {
        let d = x - threshold + half;
        x + (1.0 / ratio - 1.0) * d * d / (2.0 * knee)
    }
}

/// Downward expansion below the threshold.
#[inline]
pub fn expander(x: f32, threshold: f32, ratio: f32, knee: f32) -> f32 {
    let half = knee * 0.5;
    if knee <= 0.0 {
        return if x < threshold {
            threshold + (x - threshold) * ratio
        } else {
            x
        };
    }
    if x > threshold + half {
        x
    } else if x < threshold - half {
        threshold + (x - threshold) * ratio
    } else {
        let d = x - threshold - half;
        x + (1.0 - ratio) * d * d / (2.0 * knee)
    }
}

/// Upward compression below `lower` and downward compression above `upper`,
/// identity in between.
///
/// The lower threshold is pulled down to `upper - 2 * knee` when the two knee
/// regions would otherwise overlap.
#[inline]
pub fn upward_downward(
    x: f32,
    upper: f32,
    upper_ratio: f32,
    lower: f32,
    lower_ratio: f32,
    knee: f32,
) -> f32 {
    let knee = knee.max(0.0);
    let lower = lower.min(upper - 2.0 * knee);

    if x >= upper - knee * 0.5 {
        return compressor(x, upper, upper_ratio, knee);
    }

    let half = knee * 0.5;
    if knee > 0.0 && x > lower - half && x < lower + half {
        let d = x - lower - half;
        return x + (1.0 - 1.0 / lower_ratio) * d * d / (2.0 * knee);
    }
    if x <= lower - half {
        lower + (x - lower) / lower_ratio
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn slope(f: impl Fn(f32) -> f32, x: f32) -> f32 {
        (f(x + EPS) - f(x - EPS)) / (2.0 * EPS)
    }

    fn assert_smooth_at(f: impl Fn(f32) -> f32 + Copy, x: f32) {
        let left = f(x - 1e-4);
        let right = f(x + 1e-4);
        assert!((left - right).abs() < 1e-3, "value jump at {x}");

        let d_left = slope(f, x - 0.01);
        let d_right = slope(f, x + 0.01);
        assert!((d_left - d_right).abs() < 0.02, "slope jump at {x}: {d_left} vs {d_right}");
    }

    #[test]
    fn test_compressor_knee_is_c1() {
        let (t, r, w) = (-20.0, 4.0, 6.0);
        let f = |x| compressor(x, t, r, w);
        assert_smooth_at(f, t - w / 2.0);
        assert_smooth_at(f, t + w / 2.0);
        assert!((f(-60.0) + 60.0).abs() < 1e-6);
        assert!((f(0.0) - (t + 20.0 / r)).abs() < 1e-5);
    }

    #[test]
    fn test_expander_knee_is_c1() {
        let (t, r, w) = (-30.0, 3.0, 8.0);
        let f = |x| expander(x, t, r, w);
        assert_smooth_at(f, t - w / 2.0);
        assert_smooth_at(f, t + w / 2.0);
        assert!((f(0.0)).abs() < 1e-6);
        assert!((f(-40.0) - (t - 10.0 * r)).abs() < 1e-4);
    }

    #[test]
    fn test_upward_downward_knees_are_c1() {
        let (tu, tl, r, w) = (-12.0, -40.0, 3.0, 6.0);
        let f = |x| upward_downward(x, tu, r, tl, r, w);
        for x in [tu - w / 2.0, tu + w / 2.0, tl - w / 2.0, tl + w / 2.0] {
            assert_smooth_at(f, x);
        }
        // identity between the knees
        assert!((f(-25.0) + 25.0).abs() < 1e-6);
        // upward below the lower knee
        assert!(f(-70.0) > -70.0);
        // downward above the upper knee
        assert!(f(0.0) < 0.0);
    }

    #[test]
    fn test_upward_downward_clamps_overlapping_thresholds() {
        let (tu, r, w) = (-20.0, 2.0, 10.0);
        let f = |x| upward_downward(x, tu, r, tu - 5.0, r, w);
        let clamped = tu - 2.0 * w;
        assert_smooth_at(f, clamped + w / 2.0);
        assert_smooth_at(f, clamped - w / 2.0);
        assert_smooth_at(f, tu - w / 2.0);
    }

    #[test]
    fn test_hard_knee() {
        assert_eq!(compressor(-30.0, -20.0, 4.0, 0.0), -30.0);
        assert!((compressor(-10.0, -20.0, 4.0, 0.0) + 17.5).abs() < 1e-6);
        assert_eq!(expander(-10.0, -20.0, 2.0, 0.0), -10.0);
        assert!((upward_downward(-60.0, -10.0, 2.0, -40.0, 2.0, 0.0) + 50.0).abs() < 1e-5);
    }

    #[test]
    fn test_unity_ratio_is_identity() {
        for x in [-90.0, -24.0, -21.0, 0.0, 12.0] {
            assert_eq!(compressor(x, -24.0, 1.0, 6.0), x);
            assert_eq!(expander(x, -24.0, 1.0, 6.0), x);
        }
    }
}
