use thiserror::Error;

use crate::data::DataError;
use crate::domain::InputError;

/// Failures of the fetch → enrich pipeline.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Surfaced unchanged from the data provider; never retried here.
    #[error("provider error: {0}")]
    Provider(#[from] DataError),

    #[error("not enough history: {rows} rows, at least {required} needed for one full window")]
    DataUnavailable { rows: usize, required: usize },

    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),
}
