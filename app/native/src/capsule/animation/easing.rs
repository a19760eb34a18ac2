//! Easing and progress helpers for the fallback animator.

use std::time::Duration;

/// Linear interpolation between two values.
#[inline]
pub fn lerp(start: f64, end: f64, t: f64) -> f64 { (end - start).mul_add(t, start) }

/// Cubic ease-out: `1 - (1 - t)^3`.
///
/// Input is clamped to `[0, 1]`.
#[inline]
pub fn ease_out_cubic(t: f64) -> f64 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    (-inv * inv).mul_add(inv, 1.0)
}

/// Linear progress of `elapsed` through `duration`, clamped to `[0, 1]`.
///
/// A zero duration is treated as already finished.
#[inline]
pub fn linear_progress(elapsed: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp() {
        assert!((lerp(240.0, 700.0, 0.0) - 240.0).abs() < f64::EPSILON);
        assert!((lerp(240.0, 700.0, 1.0) - 700.0).abs() < f64::EPSILON);
        assert!((lerp(700.0, 240.0, 0.5) - 470.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ease_out_cubic_endpoints() {
        assert!(ease_out_cubic(0.0).abs() < f64::EPSILON);
        assert!((ease_out_cubic(1.0) - 1.0).abs() < f64::EPSILON);
        assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_ease_out_cubic_clamps() {
        assert!(ease_out_cubic(-1.0).abs() < f64::EPSILON);
        assert!((ease_out_cubic(2.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ease_out_cubic_is_monotonic() {
        let mut previous = 0.0;
        for step in 1..=100 {
            let value = ease_out_cubic(f64::from(step) / 100.0);
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn test_linear_progress() {
        let duration = Duration::from_millis(280);
        assert!((linear_progress(Duration::from_millis(140), duration) - 0.5).abs() < 1e-12);
        assert!((linear_progress(Duration::from_secs(1), duration) - 1.0).abs() < f64::EPSILON);
        assert!((linear_progress(Duration::ZERO, Duration::ZERO) - 1.0).abs() < f64::EPSILON);
    }
}
