// time_utils.rs
//
// 提供市場時區相關的時間轉換工具函數。
// 主要功能：
// 1. UTC 與市場當地時間（預設紐約）之間的轉換，正確處理夏令時切換
// 2. Unix 時間戳（秒、納秒）轉換
// 3. 交易日（平日）列舉

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
    Weekday,
};
use chrono_tz::Tz;
use thiserror::Error;

/// 預設的交易所時區（美股）
pub const DEFAULT_MARKET_TIMEZONE: Tz = chrono_tz::America::New_York;

/// 時間處理錯誤
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    #[error("無效的時區名稱: {0}")]
    InvalidTimezone(String),

    #[error("無效的日期: {0}，預期格式為 YYYY-MM-DD 或 YYYYMMDD")]
    InvalidDate(String),
}

/// 市場時鐘：以指定的民用時區進行時間轉換
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketClock {
    tz: Tz,
}

impl Default for MarketClock {
    fn default() -> Self {
        Self::new(DEFAULT_MARKET_TIMEZONE)
    }
}

impl MarketClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// 從 IANA 時區名稱建立，例如 "America/New_York"
    pub fn from_name(name: &str) -> Result<Self, TimeError> {
        name.parse::<Tz>()
            .map(Self::new)
            .map_err(|_| TimeError::InvalidTimezone(name.to_string()))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// UTC 時間轉換為市場當地時間
    pub fn utc_to_local(&self, utc_dt: DateTime<Utc>) -> DateTime<Tz> {
        utc_dt.with_timezone(&self.tz)
    }

    /// 市場當地時間轉換為 UTC，為 `utc_to_local` 的精確反函數
    pub fn local_to_utc(&self, local_dt: DateTime<Tz>) -> DateTime<Utc> {
        local_dt.with_timezone(&Utc)
    }

    /// 將不帶時區的牆上時間視為市場當地時間並轉換為 UTC
    ///
    /// 秋季回撥造成的重複時段取標準時間（較晚的時刻）；
    /// 春季跳躍造成的不存在時段以切換前的偏移量換算，等同往後推移缺口長度。
    pub fn naive_local_to_utc(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(_, latest) => latest.with_timezone(&Utc),
            LocalResult::None => {
                let offset = self
                    .tz
                    .offset_from_utc_datetime(&(naive - Duration::hours(12)))
                    .fix();
                let utc_naive = naive - Duration::seconds(offset.local_minus_utc() as i64);
                Utc.from_utc_datetime(&utc_naive)
            }
        }
    }

    /// Unix 秒數（可含小數）轉換為市場當地時間
    pub fn utc_timestamp_to_local(&self, seconds: f64) -> Option<DateTime<Tz>> {
        float_seconds_to_utc(seconds).map(|dt| self.utc_to_local(dt))
    }
}

//
// 預設市場時區（紐約）的便利函數
//

/// UTC 時間轉換為紐約當地時間
pub fn utc_to_local(utc_dt: DateTime<Utc>) -> DateTime<Tz> {
    MarketClock::default().utc_to_local(utc_dt)
}

/// 紐約當地時間轉換為 UTC
pub fn local_to_utc(local_dt: DateTime<Tz>) -> DateTime<Utc> {
    MarketClock::default().local_to_utc(local_dt)
}

/// 紐約牆上時間轉換為 UTC
pub fn naive_local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    MarketClock::default().naive_local_to_utc(naive)
}

/// Unix 秒數轉換為紐約當地時間
pub fn utc_timestamp_to_local(seconds: f64) -> Option<DateTime<Tz>> {
    MarketClock::default().utc_timestamp_to_local(seconds)
}

//
// 時間戳轉換函數
//

/// 將 Unix 納秒時間戳轉換為 DateTime<Utc>
pub fn unix_nanos_to_utc(nanos: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_nanos(nanos)
}

/// 依數值大小推斷 Unix 時間戳單位（秒、毫秒、微秒、納秒）並轉換
pub fn epoch_to_utc(value: i64) -> Option<DateTime<Utc>> {
    let magnitude = value.unsigned_abs();
    if magnitude < 100_000_000_000 {
        DateTime::from_timestamp(value, 0)
    } else if magnitude < 100_000_000_000_000 {
        DateTime::from_timestamp_millis(value)
    } else if magnitude < 100_000_000_000_000_000 {
        DateTime::from_timestamp_micros(value)
    } else {
        Some(unix_nanos_to_utc(value))
    }
}

/// 浮點秒數轉 UTC，保留小數部分到奈秒
pub fn float_seconds_to_utc(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}

/// 帶小數的 Unix 時間戳轉 UTC，單位推斷與 [`epoch_to_utc`] 相同
pub fn fractional_epoch_to_utc(value: f64) -> Option<DateTime<Utc>> {
    let magnitude = value.abs();
    let seconds = if magnitude < 1e11 {
        value
    } else if magnitude < 1e14 {
        value / 1e3
    } else if magnitude < 1e17 {
        value / 1e6
    } else {
        value / 1e9
    };
    float_seconds_to_utc(seconds)
}

//
// 日期函數
//

/// 解析日期字串，接受 YYYY-MM-DD 與 YYYYMMDD
pub fn parse_date(value: &str) -> Result<NaiveDate, TimeError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .map_err(|_| TimeError::InvalidDate(value.to_string()))
}

/// 列出兩個日期之間（含兩端）的所有平日
///
/// `start_date > end_date` 時回傳空序列。
pub fn weekdays_between(start_date: NaiveDate, end_date: NaiveDate) -> Vec<NaiveDate> {
    start_date
        .iter_days()
        .take_while(|day| *day <= end_date)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Timelike};
    use proptest::prelude::*;

    fn naive(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            NaiveTime::parse_from_str(time, "%H:%M:%S").unwrap(),
        )
    }

    #[test]
    fn test_utc_to_local_applies_daylight_saving() {
        // 冬令時 UTC-5
        let winter = Utc.with_ymd_and_hms(2024, 1, 5, 14, 30, 0).unwrap();
        assert_eq!(utc_to_local(winter).hour(), 9);

        // 夏令時 UTC-4
        let summer = Utc.with_ymd_and_hms(2024, 7, 5, 13, 30, 0).unwrap();
        assert_eq!(utc_to_local(summer).hour(), 9);
    }

    #[test]
    fn test_round_trip_across_spring_forward() {
        // 2024-03-10 07:00Z 為紐約切換夏令時的時刻
        let start = Utc.with_ymd_and_hms(2024, 3, 10, 6, 0, 0).unwrap();
        for minutes in (0..180).step_by(15) {
            let t = start + Duration::minutes(minutes);
            assert_eq!(local_to_utc(utc_to_local(t)), t);
        }
    }

    #[test]
    fn test_naive_ambiguous_time_resolves_to_standard_time() {
        // 2024-11-03 01:30 在紐約出現兩次，取 EST（UTC-5）
        let utc = naive_local_to_utc(naive("2024-11-03", "01:30:00"));
        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 11, 3, 6, 30, 0).unwrap());
    }

    #[test]
    fn test_naive_nonexistent_time_shifts_forward() {
        // 2024-03-10 02:30 不存在，以切換前的 UTC-5 換算
        let utc = naive_local_to_utc(naive("2024-03-10", "02:30:00"));
        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 0).unwrap());
        assert_eq!(utc_to_local(utc).hour(), 3);
    }

    #[test]
    fn test_utc_timestamp_to_local() {
        // 2024-01-05 14:30:00Z
        let local = utc_timestamp_to_local(1_704_465_000.0).unwrap();
        assert_eq!((local.hour(), local.minute()), (9, 30));
        assert!(utc_timestamp_to_local(f64::NAN).is_none());
    }

    #[test]
    fn test_fractional_epoch_keeps_sub_second() {
        let base = Utc.with_ymd_and_hms(2024, 1, 5, 14, 30, 0).unwrap();
        let half = chrono::Duration::milliseconds(500);

        assert_eq!(fractional_epoch_to_utc(1_704_465_000.5), Some(base + half));
        assert_eq!(fractional_epoch_to_utc(1_704_465_000_500.0), Some(base + half));
        assert_eq!(fractional_epoch_to_utc(1_704_465_000.0), epoch_to_utc(1_704_465_000));
        assert!(fractional_epoch_to_utc(f64::INFINITY).is_none());
    }

    #[test]
    fn test_epoch_unit_inference() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 5, 14, 30, 0).unwrap();
        assert_eq!(epoch_to_utc(1_704_465_000), Some(expected));
        assert_eq!(epoch_to_utc(1_704_465_000_000), Some(expected));
        assert_eq!(epoch_to_utc(1_704_465_000_000_000), Some(expected));
        assert_eq!(epoch_to_utc(1_704_465_000_000_000_000), Some(expected));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(parse_date("2024-01-05"), Ok(expected));
        assert_eq!(parse_date("20240105"), Ok(expected));
        assert!(parse_date("latest").is_err());
    }

    #[test]
    fn test_weekdays_between_skips_weekend() {
        let friday = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        let days = weekdays_between(friday, tuesday);
        assert_eq!(
            days,
            vec![
                friday,
                NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
                tuesday
            ]
        );
    }

    #[test]
    fn test_weekdays_between_edge_cases() {
        let friday = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        assert_eq!(weekdays_between(friday, friday), vec![friday]);
        assert!(weekdays_between(saturday, saturday).is_empty());
        assert!(weekdays_between(saturday, friday).is_empty());
    }

    #[test]
    fn test_market_clock_from_name() {
        let clock = MarketClock::from_name("Asia/Taipei").unwrap();
        let utc = Utc.with_ymd_and_hms(2024, 1, 5, 1, 0, 0).unwrap();
        assert_eq!(clock.utc_to_local(utc).hour(), 9);
        assert!(MarketClock::from_name("Mars/Olympus").is_err());
    }

    proptest! {
        #[test]
        fn prop_local_round_trip(secs in 0i64..4_102_444_800i64) {
            let t = DateTime::from_timestamp(secs, 0).unwrap();
            prop_assert_eq!(local_to_utc(utc_to_local(t)), t);
        }

        #[test]
        fn prop_naive_round_trip_outside_fall_back(secs in 0i64..4_102_444_800i64) {
            let t = DateTime::from_timestamp(secs, 0).unwrap();
            let local = utc_to_local(t);
            // 重複時段中的夏令時時刻無法由牆上時間還原
            let ambiguous = matches!(
                DEFAULT_MARKET_TIMEZONE.from_local_datetime(&local.naive_local()),
                LocalResult::Ambiguous(_, _)
            );
            prop_assume!(!ambiguous);
            prop_assert_eq!(naive_local_to_utc(local.naive_local()), t);
        }
    }
}
