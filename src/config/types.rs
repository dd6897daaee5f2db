use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::validation::{ValidationError, ValidationUtils, Validator};
use crate::loader::{LoaderOptions, ReportCsvConfig, DEFAULT_TIMESTAMP_KEYS};
use crate::scanner::ScanOptions;
use crate::utils::MarketClock;

/// 應用程序配置結構
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub scan: ScanConfig,
    pub load: LoadConfig,
    pub market: MarketConfig,
    pub log: LogConfig,
}

impl Validator for ApplicationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證各個部分的配置
        self.scan.validate()?;
        self.load.validate()?;
        self.market.validate()?;
        self.log.validate()?;

        Ok(())
    }
}

impl ApplicationConfig {
    /// 轉換為掃描器選項
    pub fn scan_options(&self) -> Result<ScanOptions, ValidationError> {
        Ok(ScanOptions::default()
            .with_summary_metrics(self.scan.include_summary_metrics)
            .with_clock(self.market.clock()?))
    }

    /// 轉換為載入器選項
    pub fn loader_options(&self) -> Result<LoaderOptions, ValidationError> {
        Ok(LoaderOptions::default()
            .with_timestamp_keys(self.load.timestamp_keys.clone())
            .with_csv(self.load.csv_config()?))
    }
}

/// 掃描配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 預設的回測輸出根目錄
    pub root: Option<PathBuf>,
    /// 掃描時是否一併讀取 PnL 摘要指標
    pub include_summary_metrics: bool,
}

impl Validator for ScanConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(root) = &self.root {
            ValidationUtils::not_empty(&root.to_string_lossy(), "scan.root")?;
        }
        Ok(())
    }
}

/// 載入配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// 事件時間戳候選欄位，依序嘗試
    pub timestamp_keys: Vec<String>,
    /// 報表 CSV 分隔符（單一 ASCII 字元）
    pub csv_separator: String,
    /// 推斷欄位型別時讀取的行數，未設定時掃描整個檔案
    pub infer_schema_rows: Option<usize>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            timestamp_keys: DEFAULT_TIMESTAMP_KEYS.iter().map(|k| k.to_string()).collect(),
            csv_separator: ",".to_string(),
            infer_schema_rows: None,
        }
    }
}

impl LoadConfig {
    pub fn csv_config(&self) -> Result<ReportCsvConfig, ValidationError> {
        let separator = match self.csv_separator.as_bytes() {
            [byte] if byte.is_ascii() => *byte,
            _ => {
                return Err(ValidationError::InvalidValue(format!(
                    "load.csv_separator 必須是單一 ASCII 字元: {:?}",
                    self.csv_separator
                )))
            }
        };
        if self.infer_schema_rows == Some(0) {
            return Err(ValidationError::InvalidValue(
                "load.infer_schema_rows 必須大於 0".to_string(),
            ));
        }

        Ok(ReportCsvConfig {
            separator,
            infer_schema_length: self.infer_schema_rows,
        })
    }
}

impl Validator for LoadConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.timestamp_keys.is_empty() {
            return Err(ValidationError::MissingField("load.timestamp_keys".to_string()));
        }
        for key in &self.timestamp_keys {
            ValidationUtils::not_empty(key, "load.timestamp_keys")?;
        }
        self.csv_config().map(|_| ())
    }
}

/// 市場配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// 交易所所在的 IANA 時區
    pub timezone: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            timezone: "America/New_York".to_string(),
        }
    }
}

impl MarketConfig {
    pub fn clock(&self) -> Result<MarketClock, ValidationError> {
        MarketClock::from_name(&self.timezone)
            .map_err(|e| ValidationError::InvalidValue(format!("market.timezone: {}", e)))
    }
}

impl Validator for MarketConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::not_empty(&self.timezone, "market.timezone")?;
        self.clock().map(|_| ())
    }
}

/// 日誌配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Validator for LogConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證日誌級別
        ValidationUtils::one_of(
            &self.level.to_lowercase(),
            &["trace", "debug", "info", "warn", "error"].iter().map(|s| s.to_string()).collect::<Vec<String>>(),
            "log.level",
        )?;

        // 驗證日誌格式
        ValidationUtils::one_of(
            &self.format.to_lowercase(),
            &["pretty", "json"].iter().map(|s| s.to_string()).collect::<Vec<String>>(),
            "log.format",
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ApplicationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.market.timezone, "America/New_York");
        assert!(!config.scan.include_summary_metrics);
    }

    #[test]
    fn test_invalid_timezone_is_rejected() {
        let mut config = ApplicationConfig::default();
        config.market.timezone = "Nowhere/City".to_string();
        assert!(config.validate().is_err());
        assert!(config.scan_options().is_err());
    }

    #[test]
    fn test_invalid_log_level_is_rejected() {
        let mut config = ApplicationConfig::default();
        config.log.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_timestamp_keys_rejected() {
        let mut config = ApplicationConfig::default();
        config.load.timestamp_keys.clear();
        assert!(matches!(config.validate(), Err(ValidationError::MissingField(_))));
    }

    #[test]
    fn test_options_conversion() {
        let mut config = ApplicationConfig::default();
        config.scan.include_summary_metrics = true;
        config.load.timestamp_keys = vec!["ts".to_string()];

        let scan = config.scan_options().unwrap();
        assert!(scan.include_summary_metrics);
        let load = config.loader_options().unwrap();
        assert_eq!(load.timestamp_keys, vec!["ts".to_string()]);
        assert_eq!(load.csv, ReportCsvConfig::default());
    }

    #[test]
    fn test_csv_settings() {
        let mut config = ApplicationConfig::default();
        config.load.csv_separator = ";".to_string();
        config.load.infer_schema_rows = Some(5000);
        let csv = config.loader_options().unwrap().csv;
        assert_eq!(csv.separator, b';');
        assert_eq!(csv.infer_schema_length, Some(5000));

        config.load.csv_separator = "||".to_string();
        assert!(config.validate().is_err());

        config.load.csv_separator = ",".to_string();
        config.load.infer_schema_rows = Some(0);
        assert!(config.validate().is_err());
    }
}
