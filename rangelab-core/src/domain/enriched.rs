//! EnrichedSeries — price bars plus the rolling range columns.

use serde::Serialize;

use super::bar::Bar;
use super::series::PriceSeries;

/// One output row: the original bar and its derived range figures.
///
/// Derived values use `f64::NAN` for "undefined" (flat window, missing close).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRow {
    #[serde(flatten)]
    pub bar: Bar,
    pub high_52w: f64,
    pub low_52w: f64,
    pub percentile_52w: f64,
    pub percentile_52w_sma21: f64,
    pub ticker: String,
}

impl EnrichedRow {
    /// True when every derived column holds a number.
    pub fn is_fully_defined(&self) -> bool {
        !(self.high_52w.is_nan()
            || self.low_52w.is_nan()
            || self.percentile_52w.is_nan()
            || self.percentile_52w_sma21.is_nan())
    }
}

/// Enriched rows for a single instrument, ascending by date, warm-up removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedSeries {
    ticker: String,
    rows: Vec<EnrichedRow>,
}

impl EnrichedSeries {
    pub fn new(ticker: impl Into<String>, rows: Vec<EnrichedRow>) -> Self {
        Self {
            ticker: ticker.into(),
            rows,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn rows(&self) -> &[EnrichedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&EnrichedRow> {
        self.rows.last()
    }

    /// Strip the derived columns, leaving the original bars.
    ///
    /// Rows are already date-ordered, so this cannot fail.
    pub fn to_price_series(&self) -> PriceSeries {
        PriceSeries::new(self.rows.iter().map(|r| r.bar.clone()).collect())
            .unwrap_or_default()
    }
}
