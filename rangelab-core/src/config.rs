//! Serializable analyzer and provider settings.
//!
//! Every field has a default, so an empty config (or a missing section in a
//! config file) reproduces the standard 252/21 computation against Yahoo.

use serde::{Deserialize, Serialize};

use crate::domain::InputError;

/// Trading days in the range band (one trading year).
pub const BAND_WINDOW: usize = 252;

/// Trading days in the percentile smoothing window (one trading month).
pub const SMOOTH_WINDOW: usize = 21;

/// Trailing window lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowParams {
    /// Rows in the high/low band window.
    pub band: usize,
    /// Rows in the percentile SMA window.
    pub smooth: usize,
}

impl Default for WindowParams {
    fn default() -> Self {
        Self {
            band: BAND_WINDOW,
            smooth: SMOOTH_WINDOW,
        }
    }
}

impl WindowParams {
    pub fn new(band: usize, smooth: usize) -> Result<Self, InputError> {
        let params = Self { band, smooth };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.band == 0 {
            return Err(InputError::ZeroWindow { name: "band" });
        }
        if self.smooth == 0 {
            return Err(InputError::ZeroWindow { name: "smooth" });
        }
        Ok(())
    }

    /// Leading rows with no smoothed value: `band + smooth - 2` (271 by default).
    pub fn warmup_rows(&self) -> usize {
        (self.band + self.smooth).saturating_sub(2)
    }

    /// Fewest input rows that yield one output row (272 by default).
    pub fn min_rows(&self) -> usize {
        self.warmup_rows() + 1
    }
}

/// What to do with post-warm-up rows whose derived values are NaN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedPolicy {
    /// Keep the row; NaN stays in the derived columns.
    #[default]
    Retain,
    /// Remove the row, like a blanket `dropna` over the output.
    Drop,
}

/// How non-finite closes are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseValidation {
    /// NaN closes flow through the windows and yield NaN results.
    #[default]
    Propagate,
    /// Any NaN or infinite close fails the computation.
    Strict,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub windows: WindowParams,
    pub undefined_policy: UndefinedPolicy,
    pub close_validation: CloseValidation,
}

/// HTTP and circuit-breaker settings for the Yahoo provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub cooldown_secs: u64,
    pub failure_threshold: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            base_delay_ms: 500,
            cooldown_secs: 30 * 60,
            failure_threshold: 3,
        }
    }
}
