//! 回測執行的識別與元數據

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::frequency::BarFrequency;
use super::parameters::{RunParameters, NOT_AVAILABLE};
use super::trading_hours::TradingHours;
use crate::utils::MarketClock;

/// 回測執行識別碼：對應 `{TICKER}/{DATE}/{TIME_RUNID}` 目錄
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunIdentifier {
    ticker: String,
    date: NaiveDate,
    run_id: String,
}

impl RunIdentifier {
    pub fn new(ticker: impl Into<String>, date: NaiveDate, run_id: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            date,
            run_id: run_id.into(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// 從執行目錄名稱取出啟動時間，例如 "093000_run1" -> 09:30:00
    pub fn start_time(&self) -> Option<NaiveTime> {
        let token = self.run_id.split('_').next()?;
        if !token.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        match token.len() {
            6 => NaiveTime::parse_from_str(token, "%H%M%S").ok(),
            4 => NaiveTime::parse_from_str(token, "%H%M").ok(),
            _ => None,
        }
    }
}

impl fmt::Display for RunIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.ticker, self.date.format("%Y-%m-%d"), self.run_id)
    }
}

/// 掃描階段產生的回測執行元數據
///
/// 衍生欄位在建立時計算一次，之後不可變；載入器只讀取，不修改。
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetadata {
    id: RunIdentifier,
    path: PathBuf,
    parameters: RunParameters,
    frequency: Option<BarFrequency>,
    run_timestamp: Option<DateTime<Utc>>,
    trading_hours: Option<TradingHours>,
    metrics: BTreeMap<String, f64>,
}

impl RunMetadata {
    pub fn new(
        id: RunIdentifier,
        path: impl Into<PathBuf>,
        parameters: RunParameters,
        clock: &MarketClock,
    ) -> Self {
        let frequency = parameters
            .get_str("frequency")
            .and_then(BarFrequency::parse_label)
            .or_else(|| parameters.get_str("bar_type").and_then(BarFrequency::from_bar_type));

        let run_timestamp = id
            .start_time()
            .map(|time| clock.naive_local_to_utc(id.date().and_time(time)));

        let trading_hours = TradingHours::from_parameters(&parameters);

        Self {
            id,
            path: path.into(),
            parameters,
            frequency,
            run_timestamp,
            trading_hours,
            metrics: BTreeMap::new(),
        }
    }

    /// 附加掃描時讀取的 PnL 指標
    pub fn with_metrics(mut self, metrics: BTreeMap<String, f64>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn id(&self) -> &RunIdentifier {
        &self.id
    }

    pub fn ticker(&self) -> &str {
        self.id.ticker()
    }

    pub fn date(&self) -> NaiveDate {
        self.id.date()
    }

    pub fn run_id(&self) -> &str {
        self.id.run_id()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parameters(&self) -> &RunParameters {
        &self.parameters
    }

    pub fn frequency(&self) -> Option<BarFrequency> {
        self.frequency
    }

    /// 頻率顯示標籤，無法推導時為 "N/A"
    pub fn frequency_label(&self) -> String {
        self.frequency
            .map(|f| f.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    pub fn run_timestamp(&self) -> Option<DateTime<Utc>> {
        self.run_timestamp
    }

    pub fn trading_hours(&self) -> Option<TradingHours> {
        self.trading_hours
    }

    pub fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.metrics
    }
}
