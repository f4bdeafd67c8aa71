//! Rolling Range Analyzer.
//!
//! Two steps composed by the caller: a provider fetches a `PriceSeries`, then
//! `enrich` turns it into an `EnrichedSeries`. `analyze` runs both.

pub mod enrich;
pub mod error;

pub use enrich::{analyze, enrich, range_columns, RangeColumns};
pub use error::AnalyzerError;
