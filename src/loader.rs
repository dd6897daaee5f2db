//! 回測執行載入器
//!
//! 依掃描產生的元數據，完整讀取單次執行的事件日誌、報表與 PnL 摘要。
//! 載入是即時且獨立的：不快取、不共享可變狀態，不同執行可在不同執行緒並行載入。

pub mod csv_io;
pub mod error;
pub mod event_log;

pub use csv_io::{CsvError, CsvResult, ReportCsvConfig, ReportReader};
pub use error::{LoadError, LoadResult};
pub use event_log::{parse_event_log, DEFAULT_TIMESTAMP_KEYS};

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;

use polars::prelude::DataFrame;
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info};

use crate::domain_types::{
    parameters::flatten_object, PnlSummary, ReportKind, RunData, RunMetadata, StrategyEvent,
};
use crate::layout::{PNL_SUMMARY_FILE, STRATEGY_DATA_FILE};

/// 載入選項
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// 事件時間戳候選欄位
    pub timestamp_keys: Vec<String>,
    /// 報表 CSV 讀取配置
    pub csv: ReportCsvConfig,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            timestamp_keys: DEFAULT_TIMESTAMP_KEYS.iter().map(|k| k.to_string()).collect(),
            csv: ReportCsvConfig::default(),
        }
    }
}

impl LoaderOptions {
    pub fn with_timestamp_keys(mut self, keys: Vec<String>) -> Self {
        self.timestamp_keys = keys;
        self
    }

    pub fn with_csv(mut self, csv: ReportCsvConfig) -> Self {
        self.csv = csv;
        self
    }
}

/// 回測執行載入器
#[derive(Debug, Clone, Default)]
pub struct RunLoader {
    options: LoaderOptions,
}

impl RunLoader {
    pub fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// 載入單次回測執行的完整數據
    pub fn load(&self, metadata: &Arc<RunMetadata>) -> LoadResult<RunData> {
        let run_dir = metadata.path();
        if !run_dir.is_dir() {
            return Err(LoadError::NotFound {
                path: run_dir.to_path_buf(),
            });
        }

        let events = self.load_events(run_dir)?;

        let mut reports = BTreeMap::new();
        for kind in ReportKind::ALL {
            let df = self.load_report(run_dir, kind)?;
            debug!("{} {}: {} 行 x {} 欄", metadata.id(), kind, df.height(), df.width());
            reports.insert(kind, df);
        }

        let summary = load_summary(run_dir)?;

        info!(
            "載入回測執行 {}: {} 筆事件, 摘要{}",
            metadata.id(),
            events.len(),
            if summary.is_some() { "存在" } else { "不存在" }
        );

        Ok(RunData {
            metadata: Arc::clone(metadata),
            events,
            reports,
            summary,
        })
    }

    /// 並行載入多次回測執行，結果順序與輸入一致
    pub fn load_many(&self, runs: &[Arc<RunMetadata>]) -> Vec<LoadResult<RunData>> {
        runs.par_iter().map(|run| self.load(run)).collect()
    }

    fn load_events(&self, run_dir: &Path) -> LoadResult<Vec<StrategyEvent>> {
        let path = run_dir.join(STRATEGY_DATA_FILE);
        let file = File::open(&path).map_err(|e| file_error(run_dir, STRATEGY_DATA_FILE, e))?;

        parse_event_log(BufReader::new(file), &self.options.timestamp_keys).map_err(|reason| {
            LoadError::Parse {
                path,
                file: STRATEGY_DATA_FILE.to_string(),
                reason,
            }
        })
    }

    fn load_report(&self, run_dir: &Path, kind: ReportKind) -> LoadResult<DataFrame> {
        let path = run_dir.join(kind.file_name());
        let reader = ReportReader::new(self.options.csv.clone());

        reader.read_file(&path).map_err(|e| match e {
            CsvError::IoError(io_err) => file_error(run_dir, kind.file_name(), io_err),
            CsvError::PolarsError(polars_err) => LoadError::Parse {
                path,
                file: kind.file_name().to_string(),
                reason: polars_err.to_string(),
            },
        })
    }
}

// 摘要檔為可選：不存在時回傳 None，存在但格式錯誤則載入失敗
fn load_summary(run_dir: &Path) -> LoadResult<Option<PnlSummary>> {
    let path = run_dir.join(PNL_SUMMARY_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(LoadError::Io { path, source }),
    };

    let parse_error = |reason: String| LoadError::Parse {
        path: path.clone(),
        file: PNL_SUMMARY_FILE.to_string(),
        reason,
    };

    let value: Value = serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| parse_error("頂層必須是 JSON 物件".to_string()))?;

    Ok(Some(PnlSummary::new(flatten_object(object))))
}

fn file_error(run_dir: &Path, file: &str, err: io::Error) -> LoadError {
    let path = run_dir.join(file);
    if err.kind() == io::ErrorKind::NotFound {
        LoadError::MissingFile {
            path,
            file: file.to_string(),
        }
    } else {
        LoadError::Io { path, source: err }
    }
}
