//! Range percentile — where a close sits inside its trailing high/low band.
//!
//! percentile = (close - low) / (high - low)
//!
//! 0.0 at the band's low, 1.0 at its high. A flat band (high == low) gives
//! 0/0 = NaN, which is returned as-is.

/// Percentile of `close` within `[low, high]`.
pub fn range_percentile(close: f64, low: f64, high: f64) -> f64 {
    (close - low) / (high - low)
}

/// Element-wise `range_percentile` over aligned series.
///
/// All three slices must have the same length.
pub fn range_percentile_series(closes: &[f64], lows: &[f64], highs: &[f64]) -> Vec<f64> {
    debug_assert_eq!(closes.len(), lows.len());
    debug_assert_eq!(closes.len(), highs.len());
    closes
        .iter()
        .zip(lows)
        .zip(highs)
        .map(|((&close, &low), &high)| range_percentile(close, low, high))
        .collect()
}
