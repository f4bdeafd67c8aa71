//! RangeLab Core — rolling 52-week range and range percentile for one instrument.
//!
//! - Domain types (bars, ordered price series, enriched series)
//! - Trailing-window indicators (rolling max/min, SMA, range percentile)
//! - The Rolling Range Analyzer (`enrich`, `analyze`)
//! - Data provider trait and the Yahoo Finance provider
//! - Polars DataFrame adapter for tabular input and output

pub mod analyzer;
pub mod config;
pub mod data;
pub mod domain;
pub mod frame;
pub mod indicators;

pub use analyzer::{analyze, enrich, AnalyzerError};
pub use config::{AnalyzerConfig, CloseValidation, ProviderConfig, UndefinedPolicy, WindowParams};
pub use domain::{Bar, EnrichedRow, EnrichedSeries, InputError, PriceSeries};
