//! K 線頻率定義
//!
//! 回測參數以兩種形式記錄頻率：明確的 `frequency`（例如 "1-MINUTE"），
//! 或嵌在 bar type 中（例如 "MSFT.POLYGON-1-MINUTE-LAST-EXTERNAL"）。
//! 兩者都會正規化為 [`BarFrequency`]，顯示為 "1-MINUTE"。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

/// K 線聚合單位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BarUnit {
    Tick,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

impl BarUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarUnit::Tick => "TICK",
            BarUnit::Second => "SECOND",
            BarUnit::Minute => "MINUTE",
            BarUnit::Hour => "HOUR",
            BarUnit::Day => "DAY",
            BarUnit::Week => "WEEK",
            BarUnit::Month => "MONTH",
        }
    }

    /// 單位對應的秒數
    pub fn seconds(&self) -> u64 {
        match self {
            BarUnit::Tick => 0,
            BarUnit::Second => 1,
            BarUnit::Minute => 60,
            BarUnit::Hour => 3600,
            BarUnit::Day => 86400,
            BarUnit::Week => 604800,
            BarUnit::Month => 2592000, // 簡化，使用30天
        }
    }
}

impl FromStr for BarUnit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().trim_end_matches('S') {
            "TICK" => Ok(BarUnit::Tick),
            "SECOND" => Ok(BarUnit::Second),
            "MINUTE" => Ok(BarUnit::Minute),
            "HOUR" => Ok(BarUnit::Hour),
            "DAY" => Ok(BarUnit::Day),
            "WEEK" => Ok(BarUnit::Week),
            "MONTH" => Ok(BarUnit::Month),
            _ => Err(()),
        }
    }
}

/// K 線頻率：步長加單位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BarFrequency {
    pub step: u32,
    pub unit: BarUnit,
}

impl BarFrequency {
    pub fn new(step: u32, unit: BarUnit) -> Self {
        Self { step, unit }
    }

    /// 解析 "1-MINUTE" 形式的頻率標籤（大小寫不拘）
    pub fn parse_label(label: &str) -> Option<Self> {
        let (step, unit) = label.trim().split_once('-')?;
        Self::from_parts(step, unit)
    }

    /// 從 bar type 取出頻率，例如 "MSFT.POLYGON-1-MINUTE-LAST-EXTERNAL" -> 1-MINUTE
    pub fn from_bar_type(bar_type: &str) -> Option<Self> {
        let mut parts = bar_type.split('-').skip(1);
        let step = parts.next()?;
        let unit = parts.next()?;
        Self::from_parts(step, unit)
    }

    fn from_parts(step: &str, unit: &str) -> Option<Self> {
        let step = step.trim().parse::<u32>().ok()?;
        let unit = unit.parse::<BarUnit>().ok()?;
        Some(Self::new(step, unit))
    }

    /// 轉換為表示該頻率的 std::time::Duration
    pub fn to_std_duration(&self) -> StdDuration {
        StdDuration::from_secs(self.unit.seconds() * self.step as u64)
    }
}

impl fmt::Display for BarFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.step, self.unit.as_str())
    }
}
