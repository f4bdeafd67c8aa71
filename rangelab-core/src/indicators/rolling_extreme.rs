//! Rolling max / min over a trailing window.
//!
//! - Max: max(values[t-period+1..=t])
//! - Min: min(values[t-period+1..=t])
//!
//! Lookback: period - 1.
//!
//! `compute` keeps a monotonic deque of window indices, so each row costs
//! amortized O(1). `rolling_extreme_naive` rescans the window per row
//! (O(n * period)) and is the reference the deque is checked against.

use std::collections::VecDeque;

use super::indicator::Indicator;

/// Which end of the trailing window to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Max,
    Min,
}

impl Extreme {
    /// True if `candidate` should evict `incumbent` from the back of the deque.
    fn dominates(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Extreme::Max => candidate >= incumbent,
            Extreme::Min => candidate <= incumbent,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RollingExtreme {
    period: usize,
    extreme: Extreme,
    name: String,
}

impl RollingExtreme {
    pub fn max(period: usize) -> Self {
        assert!(period >= 1, "rolling window period must be >= 1");
        Self {
            period,
            extreme: Extreme::Max,
            name: format!("rolling_max_{period}"),
        }
    }

    pub fn min(period: usize) -> Self {
        assert!(period >= 1, "rolling window period must be >= 1");
        Self {
            period,
            extreme: Extreme::Min,
            name: format!("rolling_min_{period}"),
        }
    }
}

impl Indicator for RollingExtreme {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        // Indices of finite candidates, values monotone from front to back.
        let mut deque: VecDeque<usize> = VecDeque::with_capacity(self.period);
        let mut nan_in_window = 0usize;

        for (i, &value) in values.iter().enumerate() {
            if value.is_nan() {
                nan_in_window += 1;
            } else {
                while let Some(&back) = deque.back() {
                    if self.extreme.dominates(value, values[back]) {
                        deque.pop_back();
                    } else {
                        break;
                    }
                }
                deque.push_back(i);
            }

            if i >= self.period {
                let leaving = i - self.period;
                if values[leaving].is_nan() {
                    nan_in_window -= 1;
                } else if deque.front() == Some(&leaving) {
                    deque.pop_front();
                }
            }

            if i + 1 >= self.period && nan_in_window == 0 {
                if let Some(&front) = deque.front() {
                    result[i] = values[front];
                }
            }
        }

        result
    }
}

/// Brute-force rolling extreme: rescans the full window for every row.
pub fn rolling_extreme_naive(values: &[f64], period: usize, extreme: Extreme) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[(i + 1 - period)..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = match extreme {
            Extreme::Max => window.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Extreme::Min => window.iter().copied().fold(f64::INFINITY, f64::min),
        };
    }

    result
}
