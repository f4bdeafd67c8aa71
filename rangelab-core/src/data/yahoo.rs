//! Yahoo Finance data provider.
//!
//! Fetches daily bars from Yahoo's v8 chart API. Handles retries with
//! exponential backoff, rate limiting, response parsing, and the circuit
//! breaker. Yahoo has no official API and changes its format without notice,
//! so every parse failure surfaces as `DataError::ResponseFormatChanged`.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataProvider};
use crate::config::ProviderConfig;
use crate::domain::{Bar, PriceSeries};

const CHART_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Exponential backoff before retry `attempt` (1-based), capped at `MAX_BACKOFF`.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    2u32.checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| base.checked_mul(factor))
        .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
}

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(config: &ProviderConfig, circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
        })
    }

    /// Build the chart API URL. `period2` is midnight UTC of `end`, which
    /// makes `end` exclusive. `period1` starts a day early: exchanges east of
    /// UTC stamp the `start` bar before its UTC midnight. `parse_response`
    /// trims the extra row.
    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let first = start.pred_opt().unwrap_or(start);
        let start_ts = first.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        format!(
            "{CHART_BASE_URL}/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true&events=div%2Csplits"
        )
    }

    /// Parse the chart API response into bars within `[start, end)`.
    ///
    /// Rows where every quote field is null (holidays) are skipped. When Yahoo
    /// reports the same trading date twice (the live bar for today alongside
    /// the settled one) the later row wins.
    fn parse_response(
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        resp: ChartResponse,
    ) -> Result<Vec<Bar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let gmt_offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);

        // A valid range with no trading days comes back without timestamps.
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut bars: Vec<Bar> = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts + gmt_offset, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            if date < start || date >= end {
                continue;
            }

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();
            let adj_close = adj_closes
                .as_ref()
                .and_then(|v| v.get(i).copied().flatten());

            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            let bar = Bar {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0),
                adj_close: adj_close.unwrap_or(f64::NAN),
            };

            match bars.last_mut() {
                Some(last) if last.date == date => *last = bar,
                _ => bars.push(bar),
            }
        }

        Ok(bars)
    }

    /// Execute the request with retry and circuit breaker logic.
    fn fetch_with_retry(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let url = Self::chart_url(symbol, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.base_delay, attempt);
                tracing::warn!(
                    symbol,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = ?last_error,
                    "retrying Yahoo request"
                );
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            tracing::debug!(symbol, %url, "requesting chart data");

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        self.circuit_breaker.trip();
                        return Err(DataError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(DataError::AuthenticationRequired(
                            "Yahoo Finance requires authentication".into(),
                        ));
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if !status.is_success() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;

                    let bars = Self::parse_response(symbol, start, end, chart)?;
                    self.circuit_breaker.record_success();
                    return Ok(bars);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries, DataError> {
        let bars = self.fetch_with_retry(symbol, start, end)?;
        if bars.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }

        let series = PriceSeries::new(bars)?;
        tracing::info!(
            symbol,
            rows = series.len(),
            first = ?series.first_date(),
            last = ?series.last_date(),
            "fetched daily bars"
        );
        Ok(series)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn parse(json: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response("SPY", start, end, resp)
    }

    // 2024-01-02 and 2024-01-03 at 14:30 UTC, plus a holiday row of nulls.
    const THREE_ROWS: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "gmtoffset": -18000 },
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open":   [470.0, 471.0, null],
                        "high":   [472.0, 473.0, null],
                        "low":    [469.0, 468.5, null],
                        "close":  [471.5, null,  null],
                        "volume": [1000,  2000,  null]
                    }],
                    "adjclose": [{ "adjclose": [470.1, null, null] }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_rows_and_skips_empty_ones() {
        let bars = parse(THREE_ROWS, date(2024, 1, 1), date(2024, 2, 1)).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, date(2024, 1, 2));
        assert_eq!(bars[0].close, 471.5);
        assert_eq!(bars[0].adj_close, 470.1);
        assert_eq!(bars[1].date, date(2024, 1, 3));
        assert!(bars[1].close.is_nan());
        assert_eq!(bars[1].volume, 2000);
    }

    #[test]
    fn end_date_is_exclusive() {
        let bars = parse(THREE_ROWS, date(2024, 1, 1), date(2024, 1, 3)).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, date(2024, 1, 2));
    }

    #[test]
    fn duplicate_trading_date_keeps_latest_row() {
        let json = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1704205800, 1704229200],
                    "indicators": {
                        "quote": [{
                            "open": [1.0, 1.0], "high": [2.0, 2.0], "low": [0.5, 0.5],
                            "close": [1.5, 1.8], "volume": [10, 20]
                        }]
                    }
                }],
                "error": null
            }
        }"#;
        let bars = parse(json, date(2024, 1, 1), date(2024, 2, 1)).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 1.8);
        assert!(bars[0].adj_close.is_nan());
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let json = r#"{
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        }"#;
        let err = parse(json, date(2024, 1, 1), date(2024, 2, 1)).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn other_error_maps_to_format_changed() {
        let json = r#"{
            "chart": { "result": null, "error": { "code": "Bad Request", "description": "invalid range" } }
        }"#;
        let err = parse(json, date(2024, 1, 1), date(2024, 2, 1)).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(msg) if msg.contains("invalid range")));
    }

    #[test]
    fn missing_timestamps_means_no_rows() {
        let json = r#"{
            "chart": {
                "result": [{ "indicators": { "quote": [{}] } }],
                "error": null
            }
        }"#;
        let bars = parse(json, date(2024, 1, 1), date(2024, 2, 1)).unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn chart_url_uses_midnight_bounds() {
        let url = YahooProvider::chart_url("SPY", date(2024, 1, 2), date(2024, 1, 3));
        assert!(url.starts_with("https://query2.finance.yahoo.com/v8/finance/chart/SPY?"));
        // period1 is midnight UTC of the day before start
        assert!(url.contains("period1=1704067200"));
        assert!(url.contains("period2=1704240000"));
        assert!(url.contains("interval=1d"));
    }

    // Tokyo (UTC+9) stamps the 2024-01-04 bar at 2024-01-04 00:00 JST,
    // i.e. 2024-01-03 15:00 UTC, before midnight UTC of the start date.
    const EAST_OF_UTC: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "gmtoffset": 32400 },
                "timestamp": [1704207600, 1704294000],
                "indicators": {
                    "quote": [{
                        "open": [1.0, 1.1], "high": [1.2, 1.3], "low": [0.9, 1.0],
                        "close": [1.1, 1.2], "volume": [10, 20]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn start_bar_east_of_utc_is_requested_and_kept() {
        let start = date(2024, 1, 4);
        let start_midnight_utc = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        assert!(1704294000 < start_midnight_utc);

        let url = YahooProvider::chart_url("7203.T", start, date(2024, 1, 10));
        let period1: i64 = url
            .split("period1=")
            .nth(1)
            .and_then(|s| s.split('&').next())
            .unwrap()
            .parse()
            .unwrap();
        assert!(period1 <= 1704294000);

        // The day-before row in the widened window is trimmed by the date filter.
        let bars = parse(EAST_OF_UTC, start, date(2024, 1, 10)).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, start);
        assert_eq!(bars[0].close, 1.2);
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(2000));
        assert_eq!(backoff_delay(base, 8), MAX_BACKOFF);
        assert_eq!(backoff_delay(base, 33), MAX_BACKOFF);
        assert_eq!(backoff_delay(base, u32::MAX), MAX_BACKOFF);
    }
}
