//! Indicator trait.
//!
//! Indicators are pure functions: a value series in, a numeric series of the
//! same length out. No indicator value at row t may depend on rows after t.

/// Trait for trailing-window indicators over a single `f64` series.
///
/// The first `lookback()` outputs are `f64::NAN` (warmup). A NaN anywhere in
/// a trailing window makes that window's output NaN.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "rolling_max_252", "sma_21").
    fn name(&self) -> &str;

    /// Number of rows needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire series.
    ///
    /// Returns a `Vec<f64>` of the same length as `values`.
    fn compute(&self, values: &[f64]) -> Vec<f64>;
}
