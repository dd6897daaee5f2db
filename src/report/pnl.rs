//! 由倉位報表計算累積已實現損益

use chrono::DateTime;
use chrono_tz::Tz;
use polars::prelude::*;
use statrs::statistics::Statistics;
use thiserror::Error;
use tracing::debug;

use crate::utils::{unix_nanos_to_utc, MarketClock};

pub const REALIZED_PNL_COLUMN: &str = "realized_pnl";
pub const TS_CLOSED_COLUMN: &str = "ts_closed";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("報表缺少欄位: {0}")]
    MissingColumn(String),

    #[error("Polars 錯誤: {0}")]
    Polars(#[from] PolarsError),
}

/// 累積損益曲線上的一點（市場時區）
#[derive(Debug, Clone, PartialEq)]
pub struct PnlPoint {
    pub closed_at: DateTime<Tz>,
    pub realized: f64,
    pub cumulative: f64,
}

// "65.62 USD" -> 65.62
fn parse_money(value: &str) -> Option<f64> {
    value.split_whitespace().next()?.parse().ok()
}

fn realized_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    match series.dtype() {
        DataType::String => Ok(series
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_money))
            .collect()),
        _ => Ok(series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .collect()),
    }
}

fn closed_nanos(series: &Series) -> PolarsResult<Vec<Option<i64>>> {
    match series.dtype() {
        DataType::String => Ok(series
            .str()?
            .into_iter()
            .map(|v| v.and_then(|s| s.trim().parse::<i64>().ok()))
            .collect()),
        _ => Ok(series
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .collect()),
    }
}

fn required<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series, ReportError> {
    df.column(name)
        .map(Column::as_materialized_series)
        .map_err(|_| ReportError::MissingColumn(name.to_string()))
}

/// 按平倉時間排序後累加 `realized_pnl`
///
/// `realized_pnl` 可為數值或 "65.62 USD" 形式的字串，`ts_closed` 為 UNIX 奈秒；
/// 任一欄位為空或無法解析的行會被略過；沒有任何倉位或報表沒有 `realized_pnl`
/// 欄位時回傳空序列。
pub fn cumulative_pnl(positions: &DataFrame, clock: &MarketClock) -> Result<Vec<PnlPoint>, ReportError> {
    if positions.height() == 0 {
        return Ok(Vec::new());
    }
    if positions.column(REALIZED_PNL_COLUMN).is_err() {
        debug!("倉位報表沒有 {} 欄位", REALIZED_PNL_COLUMN);
        return Ok(Vec::new());
    }

    let realized = realized_values(required(positions, REALIZED_PNL_COLUMN)?)?;
    let closed = closed_nanos(required(positions, TS_CLOSED_COLUMN)?)?;

    let mut rows: Vec<(i64, f64)> = closed
        .into_iter()
        .zip(realized)
        .filter_map(|(ts, pnl)| Some((ts?, pnl?)))
        .collect();
    let skipped = positions.height() - rows.len();
    if skipped > 0 {
        debug!("略過 {} 筆缺少損益或平倉時間的倉位", skipped);
    }

    rows.sort_by_key(|(ts, _)| *ts);

    let mut cumulative = 0.0;
    Ok(rows
        .into_iter()
        .map(|(ts, realized)| {
            cumulative += realized;
            PnlPoint {
                closed_at: clock.utc_to_local(unix_nanos_to_utc(ts)),
                realized,
                cumulative,
            }
        })
        .collect())
}

/// 已實現損益的基本統計
#[derive(Debug, Clone, PartialEq)]
pub struct PnlStatistics {
    pub count: usize,
    pub total: f64,
    pub mean: f64,
    /// 樣本標準差，少於兩筆時為 None
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub win_rate: f64,
}

pub fn pnl_statistics(values: &[f64]) -> Option<PnlStatistics> {
    if values.is_empty() {
        return None;
    }

    let count = values.len();
    let wins = values.iter().filter(|v| **v > 0.0).count();

    Some(PnlStatistics {
        count,
        total: values.iter().sum(),
        mean: values.iter().mean(),
        std_dev: (count > 1).then(|| values.iter().std_dev()),
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        win_rate: wins as f64 / count as f64,
    })
}
