//! 回測參數映射
//!
//! 上游系統寫出的 `run_parameters.json` 是鬆散型別的 JSON 物件。
//! 這裡將其轉為明確的純量型別，並統一「缺少鍵」時的預設行為：
//! 型別存取器在鍵不存在或型別不符時一律回傳 `None`，不做隱式轉型。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// 缺值時顯示用的佔位字串
pub const NOT_AVAILABLE: &str = "N/A";

/// 參數純量值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// 從 JSON 值轉換
    ///
    /// `null` 視為缺值；巢狀物件與陣列保留為緊湊的 JSON 文字。
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(ParamValue::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(ParamValue::Int(i)),
                None => n.as_f64().map(ParamValue::Float),
            },
            Value::String(s) => Some(ParamValue::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => Some(ParamValue::Text(value.to_string())),
        }
    }

    /// 數值型參數轉為 f64（整數會被放寬）
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ParamValue::Int(_) | ParamValue::Float(_))
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// 將 JSON 物件轉為扁平的純量映射
pub(crate) fn flatten_object(object: &Map<String, Value>) -> BTreeMap<String, ParamValue> {
    object
        .iter()
        .filter_map(|(key, value)| ParamValue::from_json(value).map(|v| (key.clone(), v)))
        .collect()
}

/// 正規化指標名稱，例如 "PnL (total)" -> "pnl_total"
pub fn normalize_metric_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace(['(', ')'], "")
}

/// 回測執行參數
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunParameters {
    values: BTreeMap<String, ParamValue>,
}

impl RunParameters {
    pub fn new(values: BTreeMap<String, ParamValue>) -> Self {
        Self { values }
    }

    /// 從 JSON 物件建立，非物件會回傳 `None`
    pub fn from_json(value: &Value) -> Option<Self> {
        value.as_object().map(|object| Self::new(flatten_object(object)))
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(ParamValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(ParamValue::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(ParamValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// 取得參數，缺少時回傳預設值
    pub fn get_or(&self, key: &str, default: ParamValue) -> ParamValue {
        self.get(key).cloned().unwrap_or(default)
    }

    /// 顯示用字串，缺少時為 "N/A"
    pub fn display(&self, key: &str) -> String {
        self.get(key)
            .map(ToString::to_string)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_value_types() {
        let params = RunParameters::from_json(&json!({
            "frequency": "1-MINUTE",
            "max_position_bars": 30,
            "entry_bound_p_top": 0.95,
            "use_stops": true,
            "nested": {"a": 1},
            "missing": null
        }))
        .unwrap();

        assert_eq!(params.get_str("frequency"), Some("1-MINUTE"));
        assert_eq!(params.get_i64("max_position_bars"), Some(30));
        assert_eq!(params.get_f64("max_position_bars"), Some(30.0));
        assert_eq!(params.get_f64("entry_bound_p_top"), Some(0.95));
        assert_eq!(params.get_bool("use_stops"), Some(true));
        assert_eq!(params.get_str("nested"), Some(r#"{"a":1}"#));
        assert!(!params.contains_key("missing"));
        assert_eq!(params.len(), 5);
    }

    #[test]
    fn test_typed_access_does_not_coerce() {
        let params = RunParameters::from_json(&json!({"threshold": "0.5"})).unwrap();
        assert_eq!(params.get_f64("threshold"), None);
        assert_eq!(params.get_i64("threshold"), None);
        assert_eq!(params.get_bool("threshold"), None);
    }

    #[test]
    fn test_defaults_on_missing_key() {
        let params = RunParameters::default();
        assert!(params.is_empty());
        assert_eq!(params.display("bar_type"), NOT_AVAILABLE);
        assert_eq!(params.get_or("bar_type", ParamValue::Int(1)), ParamValue::Int(1));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(RunParameters::from_json(&json!([1, 2, 3])).is_none());
        assert!(RunParameters::from_json(&json!("text")).is_none());
    }

    #[test]
    fn test_normalize_metric_key() {
        assert_eq!(normalize_metric_key("PnL (total)"), "pnl_total");
        assert_eq!(normalize_metric_key("Win Rate"), "win_rate");
    }
}
