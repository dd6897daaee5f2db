/// 配置管理模組
///
/// 本模組負責加載、驗證和管理工具配置。
/// 配置來源依序為：預設值、`config/{環境}.toml`、`BACKTEST_ANALYSIS__*` 環境變數。
// 宣告子模組
pub mod loader;
pub mod manager;
pub mod types;
pub mod validation;

// 重新導出常用組件
pub use loader::{ConfigLoader, Environment};
pub use manager::{get_config, init_config};
pub use types::*;
pub use validation::{validate_config, ValidationError, ValidationUtils, Validator};

#[cfg(test)]
mod tests {
    #[test]
    fn test_module_exports() {
        // 確保重要的導出可用
        let _ = super::Environment::Development;
        let _ = super::ValidationUtils::not_empty("test", "field");

        // 類型檢查
        fn _ensure_config_works(cfg: &super::ApplicationConfig) {
            let _ = &cfg.scan;
            let _ = &cfg.load;
            let _ = &cfg.market;
            let _ = &cfg.log;
        }
    }

    #[test]
    fn test_validate_config() {
        let cfg = super::ApplicationConfig::default();
        assert!(super::validate_config(&cfg).is_ok());
    }
}
