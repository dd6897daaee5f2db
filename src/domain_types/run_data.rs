//! 載入後的回測執行數據

use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::parameters::{normalize_metric_key, ParamValue};
use super::run::RunMetadata;

/// 每次回測執行的表格報表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReportKind {
    Orders,
    Positions,
    Fills,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [ReportKind::Orders, ReportKind::Positions, ReportKind::Fills];

    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::Orders => "orders",
            ReportKind::Positions => "positions",
            ReportKind::Fills => "fills",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ReportKind::Orders => "orders.csv",
            ReportKind::Positions => "positions.csv",
            ReportKind::Fills => "fills.csv",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 策略事件日誌中的一筆記錄
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyEvent {
    pub timestamp: DateTime<Utc>,
    pub fields: Map<String, Value>,
}

impl StrategyEvent {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// PnL 摘要（扁平記錄）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PnlSummary {
    values: BTreeMap<String, ParamValue>,
}

impl PnlSummary {
    pub fn new(values: BTreeMap<String, ParamValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 數值指標，鍵名已正規化
    pub fn metrics(&self) -> BTreeMap<String, f64> {
        self.values
            .iter()
            .filter_map(|(k, v)| v.as_f64().map(|f| (normalize_metric_key(k), f)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// 單次回測執行的完整數據
///
/// 成功載入後三種報表皆存在；元數據以 `Arc` 共享，不複製。
#[derive(Debug, Clone)]
pub struct RunData {
    pub metadata: Arc<RunMetadata>,
    pub events: Vec<StrategyEvent>,
    pub reports: BTreeMap<ReportKind, DataFrame>,
    pub summary: Option<PnlSummary>,
}

impl RunData {
    pub fn report(&self, kind: ReportKind) -> Option<&DataFrame> {
        self.reports.get(&kind)
    }

    pub fn orders(&self) -> Option<&DataFrame> {
        self.report(ReportKind::Orders)
    }

    pub fn positions(&self) -> Option<&DataFrame> {
        self.report(ReportKind::Positions)
    }

    pub fn fills(&self) -> Option<&DataFrame> {
        self.report(ReportKind::Fills)
    }
}

impl PartialEq for RunData {
    fn eq(&self, other: &Self) -> bool {
        self.metadata == other.metadata
            && self.events == other.events
            && self.summary == other.summary
            && self.reports.len() == other.reports.len()
            && self.reports.iter().all(|(kind, df)| {
                other
                    .reports
                    .get(kind)
                    .is_some_and(|other_df| df.equals_missing(other_df))
            })
    }
}
