// utils.rs - 公共工具模組
//
// 提供各種通用的工具函數和輔助方法，用於簡化系統其他部分的代碼。

pub mod time_utils;

// 重新導出時間工具函數，使其可以通過 utils::function_name 直接訪問
pub use time_utils::{
    // 時區轉換
    local_to_utc,
    naive_local_to_utc,
    utc_timestamp_to_local,
    utc_to_local,
    MarketClock,
    DEFAULT_MARKET_TIMEZONE,

    // 時間戳與日期
    epoch_to_utc,
    float_seconds_to_utc,
    fractional_epoch_to_utc,
    parse_date,
    unix_nanos_to_utc,
    weekdays_between,
    TimeError,
};
