//! 回測執行掃描器
//!
//! 走訪 `{root}/{TICKER}/{DATE}/{TIME_RUNID}/`，每個執行目錄只讀取參數檔
//! （以及明確要求時的 PnL 摘要），建立輕量的元數據目錄。
//! 大型數據檔（事件日誌、報表）在掃描期間絕不開啟，成本只與執行目錄數量成正比。

pub mod error;

pub use error::{DiscoveryWarning, ScanError, WarningKind};

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain_types::{
    normalize_metric_key, ParamValue, RunIdentifier, RunMetadata, RunParameters,
};
use crate::layout::{sorted_subdirs, PARAMETERS_FILE, PNL_SUMMARY_FILE};
use crate::utils::{parse_date, MarketClock};

/// 掃描選項
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// 是否在掃描時讀取 `pnl_summary.json` 的數值指標
    pub include_summary_metrics: bool,
    /// 推導執行時間戳使用的市場時區
    pub clock: MarketClock,
}

impl ScanOptions {
    pub fn with_summary_metrics(mut self, enabled: bool) -> Self {
        self.include_summary_metrics = enabled;
        self
    }

    pub fn with_clock(mut self, clock: MarketClock) -> Self {
        self.clock = clock;
        self
    }
}

/// 掃描結果：元數據目錄與非致命警告
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub runs: Vec<Arc<RunMetadata>>,
    pub warnings: Vec<DiscoveryWarning>,
    seen: HashMap<RunIdentifier, PathBuf>,
}

impl ScanOutcome {
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// 依條件篩選執行，回傳共享的元數據
    pub fn filter<F>(&self, predicate: F) -> Vec<Arc<RunMetadata>>
    where
        F: Fn(&RunMetadata) -> bool,
    {
        self.runs
            .iter()
            .filter(|run| predicate(run))
            .cloned()
            .collect()
    }

    /// 取出共享的元數據列表，供並行載入使用
    pub fn into_shared(self) -> Vec<Arc<RunMetadata>> {
        self.runs
    }

    /// 依識別碼查找
    pub fn find(&self, id: &RunIdentifier) -> Option<Arc<RunMetadata>> {
        self.runs.iter().find(|run| run.id() == id).cloned()
    }

    fn warn(&mut self, path: impl Into<PathBuf>, kind: WarningKind) {
        let warning = DiscoveryWarning::new(path, kind);
        warn!("略過回測執行: {}", warning);
        self.warnings.push(warning);
    }

    // 重複的識別碼保留第一個，其餘記錄為警告
    fn push(&mut self, run: RunMetadata) {
        if let Some(kept) = self.seen.get(run.id()).cloned() {
            let kind = WarningKind::DuplicateRun {
                id: run.id().to_string(),
                kept,
            };
            let path = run.path().to_path_buf();
            self.warn(path, kind);
            return;
        }

        debug!("發現回測執行: {} ({})", run.id(), run.frequency_label());
        self.seen.insert(run.id().clone(), run.path().to_path_buf());
        self.runs.push(Arc::new(run));
    }
}

/// 回測執行掃描器
#[derive(Debug, Clone, Default)]
pub struct RunScanner {
    options: ScanOptions,
}

impl RunScanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// 掃描指定股票代碼的所有回測執行
    pub fn scan(&self, root: impl AsRef<Path>, symbol: &str) -> Result<ScanOutcome, ScanError> {
        let mut outcome = ScanOutcome::default();
        self.scan_into(root.as_ref(), symbol, &mut outcome)?;
        info!(
            "掃描完成: {} 筆回測執行, {} 筆警告 ({})",
            outcome.len(),
            outcome.warnings.len(),
            symbol
        );
        Ok(outcome)
    }

    /// 掃描多個根目錄（例如回測與實盤輸出），合併為同一份目錄
    pub fn scan_roots<P: AsRef<Path>>(
        &self,
        roots: &[P],
        symbol: &str,
    ) -> Result<ScanOutcome, ScanError> {
        let mut outcome = ScanOutcome::default();
        for root in roots {
            self.scan_into(root.as_ref(), symbol, &mut outcome)?;
        }
        info!(
            "掃描 {} 個根目錄完成: {} 筆回測執行, {} 筆警告 ({})",
            roots.len(),
            outcome.len(),
            outcome.warnings.len(),
            symbol
        );
        Ok(outcome)
    }

    /// 掃描根目錄下所有股票代碼
    pub fn scan_all(&self, root: impl AsRef<Path>) -> Result<ScanOutcome, ScanError> {
        let root = check_root(root.as_ref())?;
        let tickers = sorted_subdirs(&root).map_err(|source| ScanError::Io {
            path: root.clone(),
            source,
        })?;

        let mut outcome = ScanOutcome::default();
        for (ticker, ticker_dir) in tickers {
            self.scan_ticker_dir(&ticker, &ticker_dir, &mut outcome);
        }
        info!(
            "掃描全部股票代碼完成: {} 筆回測執行, {} 筆警告",
            outcome.len(),
            outcome.warnings.len()
        );
        Ok(outcome)
    }

    fn scan_into(
        &self,
        root: &Path,
        symbol: &str,
        outcome: &mut ScanOutcome,
    ) -> Result<(), ScanError> {
        let symbol = check_symbol(symbol)?;
        let root = check_root(root)?;

        let ticker_dir = root.join(symbol);
        if !ticker_dir.is_dir() {
            debug!("根目錄 {} 下沒有 {} 的回測輸出", root.display(), symbol);
            return Ok(());
        }

        self.scan_ticker_dir(symbol, &ticker_dir, outcome);
        Ok(())
    }

    // 日期層 -> 執行層，恰好兩層
    fn scan_ticker_dir(&self, ticker: &str, ticker_dir: &Path, outcome: &mut ScanOutcome) {
        let date_dirs = match sorted_subdirs(ticker_dir) {
            Ok(dirs) => dirs,
            Err(e) => {
                outcome.warn(ticker_dir, WarningKind::UnreadableDirectory(e.to_string()));
                return;
            }
        };

        for (date_name, date_dir) in date_dirs {
            let date = match parse_date(&date_name) {
                Ok(date) => date,
                Err(_) => {
                    outcome.warn(&date_dir, WarningKind::InvalidDateDirectory(date_name));
                    continue;
                }
            };

            let run_dirs = match sorted_subdirs(&date_dir) {
                Ok(dirs) => dirs,
                Err(e) => {
                    outcome.warn(&date_dir, WarningKind::UnreadableDirectory(e.to_string()));
                    continue;
                }
            };

            for (run_name, run_dir) in run_dirs {
                let id = RunIdentifier::new(ticker, date, run_name);
                match self.read_run(id, &run_dir) {
                    Ok((run, summary_warning)) => {
                        if let Some(kind) = summary_warning {
                            outcome.warn(run_dir.join(PNL_SUMMARY_FILE), kind);
                        }
                        outcome.push(run);
                    }
                    Err(kind) => outcome.warn(&run_dir, kind),
                }
            }
        }
    }

    /// 讀取單一執行目錄的元數據
    fn read_run(
        &self,
        id: RunIdentifier,
        run_dir: &Path,
    ) -> Result<(RunMetadata, Option<WarningKind>), WarningKind> {
        let params_path = run_dir.join(PARAMETERS_FILE);
        let content = match fs::read_to_string(&params_path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(WarningKind::MissingParameters)
            }
            Err(e) => return Err(WarningKind::MalformedParameters(e.to_string())),
        };

        let value: Value = serde_json::from_str(&content)
            .map_err(|e| WarningKind::MalformedParameters(e.to_string()))?;
        let parameters = RunParameters::from_json(&value).ok_or_else(|| {
            WarningKind::MalformedParameters("頂層必須是 JSON 物件".to_string())
        })?;

        let metadata = RunMetadata::new(id, run_dir, parameters, &self.options.clock);

        if !self.options.include_summary_metrics {
            return Ok((metadata, None));
        }

        match read_summary_metrics(&run_dir.join(PNL_SUMMARY_FILE)) {
            Ok(metrics) => Ok((metadata.with_metrics(metrics), None)),
            Err(kind) => Ok((metadata, Some(kind))),
        }
    }
}

// 根目錄必須存在且為目錄，回傳絕對路徑
// 代碼必須是根目錄下的單一目錄名稱
fn check_symbol(symbol: &str) -> Result<&str, ScanError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(ScanError::EmptySymbol);
    }

    let mut components = Path::new(symbol).components();
    let single_name = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_name || symbol.contains(['/', '\\']) {
        return Err(ScanError::InvalidSymbol(symbol.to_string()));
    }
    Ok(symbol)
}

fn check_root(root: &Path) -> Result<PathBuf, ScanError> {
    if !root.exists() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::RootNotDirectory(root.to_path_buf()));
    }
    fs::canonicalize(root).map_err(|source| ScanError::Io {
        path: root.to_path_buf(),
        source,
    })
}

// 摘要檔不存在時回傳空指標
fn read_summary_metrics(path: &Path) -> Result<BTreeMap<String, f64>, WarningKind> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(WarningKind::MalformedSummary(e.to_string())),
    };

    let value: Value = serde_json::from_str(&content)
        .map_err(|e| WarningKind::MalformedSummary(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| WarningKind::MalformedSummary("頂層必須是 JSON 物件".to_string()))?;

    Ok(object
        .iter()
        .filter_map(|(key, value)| {
            ParamValue::from_json(value)
                .and_then(|v| v.as_f64())
                .map(|v| (normalize_metric_key(key), v))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_scan_rejects_empty_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let result = RunScanner::default().scan(dir.path(), "  ");
        assert_matches!(result, Err(ScanError::EmptySymbol));
    }

    #[test]
    fn test_scan_rejects_path_like_symbols() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("MSFT/2024-01-05")).unwrap();

        let scanner = RunScanner::default();
        for symbol in [".", "..", "MSFT/2024-01-05", "../MSFT", "/MSFT", "MSFT\\2024-01-05"] {
            assert_matches!(
                scanner.scan(dir.path(), symbol),
                Err(ScanError::InvalidSymbol(s)) if s == symbol,
                "{symbol}"
            );
        }
        assert_eq!(check_symbol(" MSFT ").unwrap(), "MSFT");
    }

    #[test]
    fn test_scan_rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let result = RunScanner::default().scan(&missing, "MSFT");
        assert_matches!(result, Err(ScanError::RootNotFound(path)) if path == missing);
    }

    #[test]
    fn test_scan_rejects_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("root.txt");
        fs::write(&file, "").unwrap();
        assert_matches!(
            RunScanner::default().scan(&file, "MSFT"),
            Err(ScanError::RootNotDirectory(_))
        );
    }

    #[test]
    fn test_unknown_symbol_yields_empty_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = RunScanner::default().scan(dir.path(), "MSFT").unwrap();
        assert!(outcome.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_read_summary_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PNL_SUMMARY_FILE);
        assert!(read_summary_metrics(&path).unwrap().is_empty());

        fs::write(&path, r#"{"PnL (total)": 12.5, "currency": "USD"}"#).unwrap();
        let metrics = read_summary_metrics(&path).unwrap();
        assert_eq!(metrics.get("pnl_total"), Some(&12.5));
        assert_eq!(metrics.len(), 1);

        fs::write(&path, "[1, 2]").unwrap();
        assert_matches!(read_summary_metrics(&path), Err(WarningKind::MalformedSummary(_)));
    }
}
