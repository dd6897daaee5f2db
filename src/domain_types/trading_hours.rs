//! 交易時段

use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::parameters::RunParameters;

// 上游以 Python repr 字串寫出，例如 "{'start': datetime.time(8, 0), 'end': datetime.time(16, 0)}"
static REPR_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"'start':\s*datetime\.time\((\d+),\s*(\d+)(?:,\s*(\d+))?\)").expect("有效的正則")
});
static REPR_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"'end':\s*datetime\.time\((\d+),\s*(\d+)(?:,\s*(\d+))?\)").expect("有效的正則")
});

/// 交易時段（市場當地時間）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingHours {
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
}

impl TradingHours {
    /// 從回測參數推導交易時段
    ///
    /// 依序嘗試 `trading_hours`（repr 字串或 JSON 物件），
    /// 再退回舊格式的 `trading_start_time` / `trading_end_time`。
    pub fn from_parameters(params: &RunParameters) -> Option<Self> {
        let hours = match params.get_str("trading_hours") {
            Some(raw) => Self::parse_repr(raw).or_else(|| Self::parse_json(raw)),
            None => None,
        };

        hours.or_else(|| {
            let start = params.get_str("trading_start_time").and_then(parse_clock);
            let end = params.get_str("trading_end_time").and_then(parse_clock);
            Self::from_bounds(start, end)
        })
    }

    fn from_bounds(start: Option<NaiveTime>, end: Option<NaiveTime>) -> Option<Self> {
        if start.is_none() && end.is_none() {
            None
        } else {
            Some(Self { start, end })
        }
    }

    fn parse_repr(raw: &str) -> Option<Self> {
        let capture = |re: &Regex| {
            re.captures(raw).and_then(|caps| {
                let hour = caps.get(1)?.as_str().parse().ok()?;
                let minute = caps.get(2)?.as_str().parse().ok()?;
                let second = caps.get(3).map_or(Some(0), |m| m.as_str().parse().ok())?;
                NaiveTime::from_hms_opt(hour, minute, second)
            })
        };
        Self::from_bounds(capture(&REPR_START), capture(&REPR_END))
    }

    // 參數值為巢狀物件時已被保留為 JSON 文字
    fn parse_json(raw: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;
        let object = value.as_object()?;
        let bound = |key: &str| object.get(key).and_then(Value::as_str).and_then(parse_clock);
        Self::from_bounds(bound("start"), bound("end"))
    }

    pub fn start_label(&self) -> String {
        format_clock(self.start)
    }

    pub fn end_label(&self) -> String {
        format_clock(self.end)
    }
}

impl fmt::Display for TradingHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_label(), self.end_label())
    }
}

fn parse_clock(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

// "8:00" 形式，缺值為 "N/A"
fn format_clock(time: Option<NaiveTime>) -> String {
    use chrono::Timelike;
    match time {
        Some(t) => format!("{}:{:02}", t.hour(), t.minute()),
        None => super::parameters::NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: serde_json::Value) -> RunParameters {
        RunParameters::from_json(&value).unwrap()
    }

    #[test]
    fn test_parse_python_repr() {
        let hours = TradingHours::from_parameters(&params(json!({
            "trading_hours": "{'start': datetime.time(8, 0), 'end': datetime.time(16, 0)}"
        })))
        .unwrap();
        assert_eq!(hours.start, NaiveTime::from_hms_opt(8, 0, 0));
        assert_eq!(hours.end, NaiveTime::from_hms_opt(16, 0, 0));
        assert_eq!(hours.to_string(), "8:00-16:00");
    }

    #[test]
    fn test_parse_json_object() {
        let hours = TradingHours::from_parameters(&params(json!({
            "trading_hours": {"start": "09:30", "end": "15:59:00"}
        })))
        .unwrap();
        assert_eq!(hours.start_label(), "9:30");
        assert_eq!(hours.end_label(), "15:59");
    }

    #[test]
    fn test_legacy_fields() {
        let hours = TradingHours::from_parameters(&params(json!({
            "trading_start_time": "09:30:00"
        })))
        .unwrap();
        assert_eq!(hours.start_label(), "9:30");
        assert_eq!(hours.end_label(), "N/A");
    }

    #[test]
    fn test_absent_trading_hours() {
        assert!(TradingHours::from_parameters(&RunParameters::default()).is_none());
    }
}
