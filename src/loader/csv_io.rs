//! 訂單、倉位、成交報表的 CSV 讀取

use polars::prelude::*;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("檔案讀取錯誤: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV 解析錯誤: {0}")]
    PolarsError(#[from] PolarsError),
}

pub type CsvResult<T> = Result<T, CsvError>;

/// 報表 CSV 讀取設定
///
/// 報表一律帶標題行。`infer_schema_length` 為 `None` 時掃描整個檔案推斷欄位型別，
/// 避免前段全為數字、後段出現文字的欄位（例如訂單編號）解析失敗。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportCsvConfig {
    pub separator: u8,
    pub infer_schema_length: Option<usize>,
}

impl Default for ReportCsvConfig {
    fn default() -> Self {
        Self {
            separator: b',',
            infer_schema_length: None,
        }
    }
}

/// 報表讀取器
#[derive(Debug, Clone, Default)]
pub struct ReportReader {
    config: ReportCsvConfig,
}

impl ReportReader {
    pub fn new(config: ReportCsvConfig) -> Self {
        Self { config }
    }

    /// 讀取單一報表檔案；0 位元組的檔案視為沒有任何欄位的空表
    pub fn read_file(&self, path: &Path) -> CsvResult<DataFrame> {
        if fs::metadata(path)?.len() == 0 {
            return Ok(DataFrame::empty());
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_parse_options(CsvParseOptions::default().with_separator(self.config.separator))
            .with_infer_schema_length(self.config.infer_schema_length)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        Ok(df)
    }
}
