//! Trailing-window indicators over a close series.
//!
//! The range band is two `RollingExtreme` instances (max and min) over the
//! same window; the smoothed percentile is an `Sma` over the percentile
//! series. Every indicator returns a series the same length as its input with
//! NaN for warm-up rows.

pub mod indicator;
pub mod percentile;
pub mod rolling_extreme;
pub mod sma;

pub use indicator::Indicator;
pub use percentile::{range_percentile, range_percentile_series};
pub use rolling_extreme::{rolling_extreme_naive, Extreme, RollingExtreme};
pub use sma::Sma;

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Assert two series match element-wise, treating NaN == NaN.
#[cfg(test)]
pub fn assert_same_series(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "series length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        if e.is_nan() {
            assert!(a.is_nan(), "index {i}: expected NaN, got {a}");
        } else {
            assert_approx(*a, *e, DEFAULT_EPSILON);
        }
    }
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
