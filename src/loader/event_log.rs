//! 策略事件日誌（JSON Lines）解析

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::io::BufRead;

use crate::domain_types::StrategyEvent;
use crate::utils::{epoch_to_utc, fractional_epoch_to_utc};

/// 事件時間戳的預設候選欄位，依序嘗試
pub const DEFAULT_TIMESTAMP_KEYS: [&str; 4] = ["ts_event", "timestamp", "ts_init", "time"];

/// 逐行解析事件日誌，回傳依時間排序的事件
///
/// 空白行略過；錯誤訊息帶有 1 起算的行號。
pub fn parse_event_log<R: BufRead>(
    reader: R,
    timestamp_keys: &[String],
) -> Result<Vec<StrategyEvent>, String> {
    let mut events = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| format!("第 {} 行讀取失敗: {}", line_no, e))?;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(&line)
            .map_err(|e| format!("第 {} 行不是有效的 JSON: {}", line_no, e))?;
        let Value::Object(fields) = value else {
            return Err(format!("第 {} 行不是 JSON 物件", line_no));
        };

        let timestamp = extract_timestamp(&fields, timestamp_keys).ok_or_else(|| {
            format!(
                "第 {} 行缺少有效的時間戳欄位（候選: {}）",
                line_no,
                timestamp_keys.join(", ")
            )
        })?;

        events.push(StrategyEvent { timestamp, fields });
    }

    // 穩定排序，時間相同時保留檔案順序
    events.sort_by_key(|event| event.timestamp);
    Ok(events)
}

fn extract_timestamp(fields: &Map<String, Value>, keys: &[String]) -> Option<DateTime<Utc>> {
    keys.iter()
        .filter_map(|key| fields.get(key))
        .find_map(parse_timestamp_value)
}

// 數字為 Unix 時間戳（單位依大小推斷，小數部分保留），字串為 RFC 3339 或純數字
fn parse_timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(epoch) => epoch_to_utc(epoch),
            None => n.as_f64().and_then(fractional_epoch_to_utc),
        },
        Value::String(s) => {
            let s = s.trim();
            if let Ok(epoch) = s.parse::<i64>() {
                return epoch_to_utc(epoch);
            }
            if let Ok(epoch) = s.parse::<f64>() {
                return fractional_epoch_to_utc(epoch);
            }
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Cursor;

    fn keys() -> Vec<String> {
        DEFAULT_TIMESTAMP_KEYS.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_events_are_sorted_by_time() {
        let log = r#"{"ts_event": 1704465060000000000, "signal": 0.4}

{"ts_event": 1704465000000000000, "signal": 0.1}
{"timestamp": "2024-01-05T14:30:30Z", "signal": 0.2}
"#;
        let events = parse_event_log(Cursor::new(log), &keys()).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 5, 14, 30, 0).unwrap()
        );
        assert_eq!(events[1].get("signal"), Some(&serde_json::json!(0.2)));
        assert_eq!(events[2].get("signal"), Some(&serde_json::json!(0.4)));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let log = "{\"ts_event\": 1704465000}\n{not json}\n";
        let err = parse_event_log(Cursor::new(log), &keys()).unwrap_err();
        assert!(err.contains("第 2 行"), "{}", err);
    }

    #[test]
    fn test_missing_timestamp_is_an_error() {
        let log = "{\"signal\": 1}\n";
        assert!(parse_event_log(Cursor::new(log), &keys()).is_err());

        let log = "[1, 2]\n";
        assert!(parse_event_log(Cursor::new(log), &keys()).is_err());
    }

    #[test]
    fn test_float_epoch_keeps_milliseconds() {
        let log = "{\"ts_event\": 1704465000.25}\n{\"ts_event\": 1704465000.5}\n";
        let events = parse_event_log(Cursor::new(log), &keys()).unwrap();
        let base = Utc.with_ymd_and_hms(2024, 1, 5, 14, 30, 0).unwrap();
        assert_eq!(events[0].timestamp, base + chrono::Duration::milliseconds(250));
        assert_eq!(events[1].timestamp, base + chrono::Duration::milliseconds(500));

        let ts = parse_timestamp_value(&serde_json::json!("1704465000.5")).unwrap();
        assert_eq!(ts.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_custom_timestamp_key() {
        let log = "{\"bar_time\": \"1704465000\"}\n";
        let events = parse_event_log(Cursor::new(log), &["bar_time".to_string()]).unwrap();
        assert_eq!(events.len(), 1);
    }
}
