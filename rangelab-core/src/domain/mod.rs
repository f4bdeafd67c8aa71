//! Domain types for RangeLab

pub mod bar;
pub mod enriched;
pub mod series;

pub use bar::Bar;
pub use enriched::{EnrichedRow, EnrichedSeries};
pub use series::{InputError, PriceSeries};
