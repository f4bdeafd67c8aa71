//! PriceSeries — a date-ordered run of bars for one instrument.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use super::bar::Bar;

/// Problems with caller-supplied input that make a computation meaningless.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("dates must be strictly increasing: row {index} ({date}) follows {previous}")]
    NonIncreasingDate {
        index: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("close at row {index} ({date}) is missing or not a finite number")]
    NonFiniteClose { index: usize, date: NaiveDate },

    #[error("window `{name}` must be at least 1")]
    ZeroWindow { name: &'static str },

    #[error("date range is empty: start {start} is not before end {end}")]
    EmptyDateRange { start: NaiveDate, end: NaiveDate },
}

/// Daily bars ordered strictly ascending by date.
///
/// The ordering is checked on construction and never repaired: a series that
/// arrives out of order is rejected rather than sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<Bar>) -> Result<Self, InputError> {
        for (index, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(InputError::NonIncreasingDate {
                    index: index + 1,
                    previous: pair[0].date,
                    date: pair[1].date,
                });
            }
        }
        Ok(Self { bars })
    }

    /// Build a series from `(date, close)` pairs.
    pub fn from_closes(
        points: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self, InputError> {
        Self::new(
            points
                .into_iter()
                .map(|(date, close)| Bar::from_close(date, close))
                .collect(),
        )
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Close column for the window computations. Infinite closes count as
    /// missing and come back as NaN.
    pub fn closes(&self) -> Vec<f64> {
        self.bars
            .iter()
            .map(|b| if b.has_close() { b.close } else { f64::NAN })
            .collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// First row whose close is NaN or infinite.
    pub fn first_non_finite_close(&self) -> Option<(usize, NaiveDate)> {
        self.bars
            .iter()
            .enumerate()
            .find(|(_, b)| !b.has_close())
            .map(|(i, b)| (i, b.date))
    }
}
