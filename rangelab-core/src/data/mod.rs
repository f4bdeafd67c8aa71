//! Price data acquisition

pub mod circuit_breaker;
pub mod provider;
pub mod yahoo;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use provider::{DataError, DataProvider};
pub use yahoo::YahooProvider;
