//! Rolling range enrichment: band, percentile, smoothed percentile.
//!
//! Per row i, with `band` = 252 and `smooth` = 21 by default:
//! - high_52w[i] = max(close[i-band+1..=i])
//! - low_52w[i]  = min(close[i-band+1..=i])
//! - percentile_52w[i] = (close[i] - low) / (high - low)
//! - percentile_52w_sma21[i] = mean(percentile_52w[i-smooth+1..=i])
//!
//! The first `band + smooth - 2` rows never have a smoothed value and are cut.

use chrono::NaiveDate;

use super::error::AnalyzerError;
use crate::config::{AnalyzerConfig, CloseValidation, UndefinedPolicy};
use crate::data::{DataError, DataProvider};
use crate::domain::{EnrichedRow, EnrichedSeries, InputError, PriceSeries};
use crate::indicators::{range_percentile_series, Indicator, RollingExtreme, Sma};

/// Derived columns for every input row, NaN where a window is incomplete.
#[derive(Debug, Clone)]
pub struct RangeColumns {
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub percentile: Vec<f64>,
    pub percentile_sma: Vec<f64>,
}

/// Compute the four derived columns over `closes` without truncating.
pub fn range_columns(closes: &[f64], band: usize, smooth: usize) -> RangeColumns {
    let high = RollingExtreme::max(band).compute(closes);
    let low = RollingExtreme::min(band).compute(closes);
    let percentile = range_percentile_series(closes, &low, &high);
    let percentile_sma = Sma::new(smooth).compute(&percentile);

    RangeColumns {
        high,
        low,
        percentile,
        percentile_sma,
    }
}

/// Enrich `series` with the rolling range columns and drop the warm-up rows.
///
/// The input is only read; output rows carry clones of the input bars.
///
/// # Errors
/// - `InvalidInput` for a zero-length window, or a non-finite close under
///   `CloseValidation::Strict`.
/// - `DataUnavailable` when the series is shorter than
///   `band + smooth - 1` rows and so cannot produce a single output row.
pub fn enrich(
    series: &PriceSeries,
    ticker: &str,
    config: &AnalyzerConfig,
) -> Result<EnrichedSeries, AnalyzerError> {
    let params = config.windows;
    params.validate()?;

    if config.close_validation == CloseValidation::Strict {
        if let Some((index, date)) = series.first_non_finite_close() {
            return Err(InputError::NonFiniteClose { index, date }.into());
        }
    }

    let required = params.min_rows();
    if series.len() < required {
        return Err(AnalyzerError::DataUnavailable {
            rows: series.len(),
            required,
        });
    }

    let columns = range_columns(&series.closes(), params.band, params.smooth);

    let warmup = params.warmup_rows();
    let mut rows: Vec<EnrichedRow> = series
        .bars()
        .iter()
        .enumerate()
        .skip(warmup)
        .map(|(i, bar)| EnrichedRow {
            bar: bar.clone(),
            high_52w: columns.high[i],
            low_52w: columns.low[i],
            percentile_52w: columns.percentile[i],
            percentile_52w_sma21: columns.percentile_sma[i],
            ticker: ticker.to_string(),
        })
        .collect();

    let undefined = rows.iter().filter(|r| !r.is_fully_defined()).count();
    if config.undefined_policy == UndefinedPolicy::Drop && undefined > 0 {
        rows.retain(EnrichedRow::is_fully_defined);
        tracing::debug!(ticker, dropped = undefined, "dropped rows with undefined range values");
    } else if undefined > 0 {
        tracing::debug!(ticker, undefined, "retaining rows with undefined range values");
    }

    tracing::info!(
        ticker,
        input_rows = series.len(),
        output_rows = rows.len(),
        band = params.band,
        smooth = params.smooth,
        "enriched price series"
    );

    Ok(EnrichedSeries::new(ticker, rows))
}

/// Fetch `[start, end)` from `provider`, then enrich it.
///
/// Provider failures are returned as `AnalyzerError::Provider` without retry.
/// A provider that reports itself unavailable is not called.
pub fn analyze(
    provider: &dyn DataProvider,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
    config: &AnalyzerConfig,
) -> Result<EnrichedSeries, AnalyzerError> {
    if start >= end {
        return Err(InputError::EmptyDateRange { start, end }.into());
    }
    if !provider.is_available() {
        return Err(DataError::Unavailable {
            provider: provider.name().to_string(),
        }
        .into());
    }

    tracing::debug!(ticker, provider = provider.name(), %start, %end, "fetching price series");
    let series = provider.fetch(ticker, start, end)?;
    enrich(&series, ticker, config)
}
