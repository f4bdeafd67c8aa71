//! Bar — one trading day of provider data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar as delivered by the data provider.
///
/// Only `close` feeds the range computation. The other fields are passed
/// through to the enriched output untouched. A value the provider did not
/// report is stored as `f64::NAN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adj_close: f64,
}

impl Bar {
    /// Bar carrying only a date and a close. Other price fields are NaN.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: f64::NAN,
            high: f64::NAN,
            low: f64::NAN,
            close,
            volume: 0,
            adj_close: f64::NAN,
        }
    }

    /// Returns true if the close is usable in a window computation.
    pub fn has_close(&self) -> bool {
        self.close.is_finite()
    }
}
