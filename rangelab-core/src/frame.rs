//! Polars adapter: price series and enriched series as DataFrames.
//!
//! Output column order: `date, open, high, low, close, volume, adj_close,
//! high_52w, low_52w, percentile_52w, percentile_52w_sma21, ticker`.
//! Downstream consumers key on these names, so they live in [`columns`].
//!
//! Reading a frame only needs `date` (Date) and `close` (numeric). Any derived
//! columns already present are ignored and recomputed from `close`.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use thiserror::Error;

use crate::analyzer::{enrich, AnalyzerError};
use crate::config::AnalyzerConfig;
use crate::domain::{Bar, EnrichedSeries, InputError, PriceSeries};

pub mod columns {
    pub const DATE: &str = "date";
    pub const OPEN: &str = "open";
    pub const HIGH: &str = "high";
    pub const LOW: &str = "low";
    pub const CLOSE: &str = "close";
    pub const VOLUME: &str = "volume";
    pub const ADJ_CLOSE: &str = "adj_close";
    pub const HIGH_52W: &str = "high_52w";
    pub const LOW_52W: &str = "low_52w";
    pub const PERCENTILE_52W: &str = "percentile_52w";
    pub const PERCENTILE_52W_SMA21: &str = "percentile_52w_sma21";
    pub const TICKER: &str = "ticker";

    /// Columns produced by enrichment, in output order.
    pub const DERIVED: [&str; 5] = [
        HIGH_52W,
        LOW_52W,
        PERCENTILE_52W,
        PERCENTILE_52W_SMA21,
        TICKER,
    ];
}

// Days from 0001-01-01 (CE) to 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("column `{column}` must be {expected}, got {actual}")]
    TypeMismatch {
        column: &'static str,
        expected: &'static str,
        actual: DataType,
    },

    #[error("null date at row {0}")]
    NullDate(usize),

    #[error("date out of range at row {index}: {days} days from epoch")]
    InvalidDate { index: usize, days: i32 },

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}

fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

fn days_to_date(index: usize, days: i32) -> Result<NaiveDate, FrameError> {
    NaiveDate::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE)
        .ok_or(FrameError::InvalidDate { index, days })
}

fn required<'a>(df: &'a DataFrame, name: &'static str) -> Result<&'a Column, FrameError> {
    df.column(name).map_err(|_| FrameError::MissingColumn(name))
}

/// Read a numeric column as f64, nulls → NaN. Missing optional column → all NaN.
fn float_column(df: &DataFrame, name: &'static str, required_col: bool) -> Result<Vec<f64>, FrameError> {
    let column = match df.column(name) {
        Ok(c) => c,
        Err(_) if !required_col => return Ok(vec![f64::NAN; df.height()]),
        Err(_) => return Err(FrameError::MissingColumn(name)),
    };
    if !(column.dtype().is_float() || column.dtype().is_integer()) {
        return Err(FrameError::TypeMismatch {
            column: name,
            expected: "numeric",
            actual: column.dtype().clone(),
        });
    }
    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

fn volume_column(df: &DataFrame) -> Result<Vec<u64>, FrameError> {
    let Ok(column) = df.column(columns::VOLUME) else {
        return Ok(vec![0; df.height()]);
    };
    let series = column.as_materialized_series().cast(&DataType::UInt64)?;
    Ok(series.u64()?.into_iter().map(|v| v.unwrap_or(0)).collect())
}

fn date_column(df: &DataFrame) -> Result<Vec<NaiveDate>, FrameError> {
    let column = required(df, columns::DATE)?;
    if column.dtype() != &DataType::Date {
        return Err(FrameError::TypeMismatch {
            column: columns::DATE,
            expected: "Date",
            actual: column.dtype().clone(),
        });
    }
    let days = column.as_materialized_series().cast(&DataType::Int32)?;
    days.i32()?
        .into_iter()
        .enumerate()
        .map(|(index, d)| {
            let d = d.ok_or(FrameError::NullDate(index))?;
            days_to_date(index, d)
        })
        .collect()
}

/// Build a `PriceSeries` from a frame's price columns.
pub fn price_series_from_frame(df: &DataFrame) -> Result<PriceSeries, FrameError> {
    let dates = date_column(df)?;
    let close = float_column(df, columns::CLOSE, true)?;
    let open = float_column(df, columns::OPEN, false)?;
    let high = float_column(df, columns::HIGH, false)?;
    let low = float_column(df, columns::LOW, false)?;
    let adj_close = float_column(df, columns::ADJ_CLOSE, false)?;
    let volume = volume_column(df)?;

    let bars = (0..df.height())
        .map(|i| Bar {
            date: dates[i],
            open: open[i],
            high: high[i],
            low: low[i],
            close: close[i],
            volume: volume[i],
            adj_close: adj_close[i],
        })
        .collect();

    Ok(PriceSeries::new(bars)?)
}

fn bar_columns<'a>(bars: impl Iterator<Item = &'a Bar> + Clone) -> Result<Vec<Column>, FrameError> {
    let f = |name: &str, get: fn(&Bar) -> f64| -> Column {
        Series::new(name.into(), bars.clone().map(get).collect::<Vec<f64>>()).into()
    };

    let days: Vec<i32> = bars.clone().map(|b| date_to_days(b.date)).collect();
    let date = Series::new(columns::DATE.into(), days).cast(&DataType::Date)?;
    let volume: Vec<u64> = bars.clone().map(|b| b.volume).collect();

    Ok(vec![
        date.into(),
        f(columns::OPEN, |b| b.open),
        f(columns::HIGH, |b| b.high),
        f(columns::LOW, |b| b.low),
        f(columns::CLOSE, |b| b.close),
        Series::new(columns::VOLUME.into(), volume).into(),
        f(columns::ADJ_CLOSE, |b| b.adj_close),
    ])
}

impl PriceSeries {
    /// The price columns as a DataFrame.
    pub fn to_dataframe(&self) -> Result<DataFrame, FrameError> {
        Ok(DataFrame::new(bar_columns(self.bars().iter())?)?)
    }
}

impl EnrichedSeries {
    /// Price columns followed by the derived columns and the ticker label.
    pub fn to_dataframe(&self) -> Result<DataFrame, FrameError> {
        let rows = self.rows();
        let mut cols = bar_columns(rows.iter().map(|r| &r.bar))?;

        let derived = |name: &str, values: Vec<f64>| -> Column { Series::new(name.into(), values).into() };
        cols.push(derived(columns::HIGH_52W, rows.iter().map(|r| r.high_52w).collect()));
        cols.push(derived(columns::LOW_52W, rows.iter().map(|r| r.low_52w).collect()));
        cols.push(derived(
            columns::PERCENTILE_52W,
            rows.iter().map(|r| r.percentile_52w).collect(),
        ));
        cols.push(derived(
            columns::PERCENTILE_52W_SMA21,
            rows.iter().map(|r| r.percentile_52w_sma21).collect(),
        ));
        let tickers: Vec<&str> = rows.iter().map(|r| r.ticker.as_str()).collect();
        cols.push(Series::new(columns::TICKER.into(), tickers).into());

        Ok(DataFrame::new(cols)?)
    }
}

/// Recompute the range columns for a frame and return the enriched frame.
///
/// Any derived columns already in `df` are ignored, so running this on its own
/// output recomputes the same values from `close`.
pub fn enrich_frame(
    df: &DataFrame,
    ticker: &str,
    config: &AnalyzerConfig,
) -> Result<DataFrame, FrameError> {
    let series = price_series_from_frame(df)?;
    let enriched = enrich(&series, ticker, config)?;
    enriched.to_dataframe()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WindowParams;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap() + chrono::Duration::days(n)
    }

    fn sample_series(n: usize) -> PriceSeries {
        PriceSeries::new(
            (0..n)
                .map(|i| Bar {
                    date: day(i as i64),
                    open: 99.0 + i as f64,
                    high: 101.0 + i as f64,
                    low: 98.0 + i as f64,
                    close: 100.0 + ((i * 7) % 11) as f64,
                    volume: 1_000 + i as u64,
                    adj_close: 100.0 + ((i * 7) % 11) as f64,
                })
                .collect(),
        )
        .unwrap()
    }

    fn small() -> AnalyzerConfig {
        AnalyzerConfig {
            windows: WindowParams::new(5, 3).unwrap(),
            ..AnalyzerConfig::default()
        }
    }

    #[test]
    fn epoch_conversion() {
        assert_eq!(date_to_days(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()), 0);
        assert_eq!(date_to_days(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()), 1);
        assert_eq!(days_to_date(0, 19_724).unwrap(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn price_frame_round_trips_through_series() {
        let series = sample_series(10);
        let df = series.to_dataframe().unwrap();
        assert_eq!(df.height(), 10);
        assert_eq!(df.column(columns::DATE).unwrap().dtype(), &DataType::Date);
        let back = price_series_from_frame(&df).unwrap();
        assert_eq!(back, series);
    }

    #[test]
    fn enriched_frame_has_contract_columns() {
        let enriched = enrich(&sample_series(20), "XYZ", &small()).unwrap();
        let df = enriched.to_dataframe().unwrap();

        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "date",
                "open",
                "high",
                "low",
                "close",
                "volume",
                "adj_close",
                "high_52w",
                "low_52w",
                "percentile_52w",
                "percentile_52w_sma21",
                "ticker",
            ]
        );
        // 20 rows - (5 + 3 - 2) warm-up
        assert_eq!(df.height(), 14);
        let tickers = df.column(columns::TICKER).unwrap().as_materialized_series().clone();
        assert!(tickers.str().unwrap().into_iter().all(|t| t == Some("XYZ")));
    }

    #[test]
    fn enrich_frame_ignores_existing_derived_columns() {
        let first = enrich_frame(&sample_series(40).to_dataframe().unwrap(), "XYZ", &small()).unwrap();
        let second = enrich_frame(&first, "XYZ", &small()).unwrap();

        // Second pass loses another warm-up's worth of rows from the front.
        assert_eq!(second.height(), first.height() - 6);
        let offset = 6;
        for name in [columns::HIGH_52W, columns::LOW_52W, columns::PERCENTILE_52W_SMA21] {
            let a = float_column(&first, name, true).unwrap();
            let b = float_column(&second, name, true).unwrap();
            for (i, v) in b.iter().enumerate() {
                assert_eq!(*v, a[i + offset], "{name} differs at row {i}");
            }
        }
    }

    #[test]
    fn close_only_frame_is_accepted() {
        let days: Vec<i32> = (0..3).map(|i| date_to_days(day(i))).collect();
        let df = DataFrame::new(vec![
            Series::new("date".into(), days).cast(&DataType::Date).unwrap().into(),
            Series::new("close".into(), &[1.0, 2.0, 3.0]).into(),
        ])
        .unwrap();
        let series = price_series_from_frame(&df).unwrap();
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
        assert!(series.bars()[0].open.is_nan());
        assert_eq!(series.bars()[0].volume, 0);
    }

    #[test]
    fn missing_close_column_is_rejected() {
        let days: Vec<i32> = (0..2).map(|i| date_to_days(day(i))).collect();
        let df = DataFrame::new(vec![Series::new("date".into(), days)
            .cast(&DataType::Date)
            .unwrap()
            .into()])
        .unwrap();
        assert!(matches!(
            price_series_from_frame(&df).unwrap_err(),
            FrameError::MissingColumn("close")
        ));
    }

    #[test]
    fn non_numeric_close_is_rejected() {
        let days: Vec<i32> = (0..2).map(|i| date_to_days(day(i))).collect();
        let df = DataFrame::new(vec![
            Series::new("date".into(), days).cast(&DataType::Date).unwrap().into(),
            Series::new("close".into(), &["a", "b"]).into(),
        ])
        .unwrap();
        assert!(matches!(
            price_series_from_frame(&df).unwrap_err(),
            FrameError::TypeMismatch { column: "close", .. }
        ));
    }

    #[test]
    fn null_close_becomes_nan() {
        let days: Vec<i32> = (0..2).map(|i| date_to_days(day(i))).collect();
        let df = DataFrame::new(vec![
            Series::new("date".into(), days).cast(&DataType::Date).unwrap().into(),
            Series::new("close".into(), &[Some(1.0), None]).into(),
        ])
        .unwrap();
        let series = price_series_from_frame(&df).unwrap();
        assert!(series.bars()[1].close.is_nan());
    }

    #[test]
    fn unordered_frame_is_rejected() {
        let days: Vec<i32> = [2, 1].iter().map(|&i| date_to_days(day(i))).collect();
        let df = DataFrame::new(vec![
            Series::new("date".into(), days).cast(&DataType::Date).unwrap().into(),
            Series::new("close".into(), &[1.0, 2.0]).into(),
        ])
        .unwrap();
        assert!(matches!(
            price_series_from_frame(&df).unwrap_err(),
            FrameError::Input(InputError::NonIncreasingDate { .. })
        ));
    }
}
