//! Output rendering — terminal table, CSV, and JSON.
//!
//! CSV uses the enriched series' column names as its header; undefined (NaN)
//! values are written as empty fields. JSON writes them as `null`.

use std::path::Path;

use anyhow::{Context, Result};
use rangelab_core::frame::columns;
use rangelab_core::{EnrichedRow, EnrichedSeries};

fn fmt_value(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

fn fmt_cell(v: f64, decimals: usize) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v:.decimals$}")
    }
}

// ─── CSV export ─────────────────────────────────────────────────────

pub fn export_csv(series: &EnrichedSeries) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let header = [
        columns::DATE,
        columns::OPEN,
        columns::HIGH,
        columns::LOW,
        columns::CLOSE,
        columns::VOLUME,
        columns::ADJ_CLOSE,
    ]
    .into_iter()
    .chain(columns::DERIVED);
    wtr.write_record(header)?;

    for row in series.rows() {
        wtr.write_record(csv_record(row))?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

fn csv_record(row: &EnrichedRow) -> [String; 12] {
    let bar = &row.bar;
    [
        bar.date.to_string(),
        fmt_value(bar.open),
        fmt_value(bar.high),
        fmt_value(bar.low),
        fmt_value(bar.close),
        bar.volume.to_string(),
        fmt_value(bar.adj_close),
        fmt_value(row.high_52w),
        fmt_value(row.low_52w),
        fmt_value(row.percentile_52w),
        fmt_value(row.percentile_52w_sma21),
        row.ticker.clone(),
    ]
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(series: &EnrichedSeries) -> Result<String> {
    serde_json::to_string_pretty(series).context("failed to serialize enriched series to JSON")
}

// ─── Terminal table ─────────────────────────────────────────────────

/// Fixed-width table of the last `limit` rows.
pub fn render_table(series: &EnrichedSeries, limit: usize) -> String {
    let mut out = format!(
        "{:<10}  {:>10}  {:>10}  {:>10}  {:>8}  {:>8}\n",
        "date", "close", "low_52w", "high_52w", "pct", "pct_sma"
    );
    let skip = series.len().saturating_sub(limit);
    for row in series.rows().iter().skip(skip) {
        out.push_str(&format!(
            "{:<10}  {:>10}  {:>10}  {:>10}  {:>8}  {:>8}\n",
            row.bar.date,
            fmt_cell(row.bar.close, 2),
            fmt_cell(row.low_52w, 2),
            fmt_cell(row.high_52w, 2),
            fmt_cell(row.percentile_52w, 4),
            fmt_cell(row.percentile_52w_sma21, 4),
        ));
    }
    out
}

pub fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}
