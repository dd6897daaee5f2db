//! 掃描錯誤與警告定義

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// 掃描入口錯誤：整次掃描無法進行
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("股票代碼不可為空")]
    EmptySymbol,

    #[error("無效的股票代碼: {0:?}")]
    InvalidSymbol(String),

    #[error("回測根目錄不存在: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("回測根路徑不是目錄: {}", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("無法讀取回測根目錄 {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 單一執行目錄被略過的原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    #[error("缺少參數檔 run_parameters.json")]
    MissingParameters,

    #[error("參數檔格式錯誤: {0}")]
    MalformedParameters(String),

    #[error("PnL 摘要檔格式錯誤: {0}")]
    MalformedSummary(String),

    #[error("無效的日期目錄名稱: {0}")]
    InvalidDateDirectory(String),

    #[error("無法讀取目錄: {0}")]
    UnreadableDirectory(String),

    #[error("重複的回測執行 {id}，保留先前發現的 {}", .kept.display())]
    DuplicateRun { id: String, kept: PathBuf },
}

/// 掃描過程中的非致命警告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryWarning {
    pub path: PathBuf,
    pub kind: WarningKind,
}

impl DiscoveryWarning {
    pub fn new(path: impl Into<PathBuf>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

impl fmt::Display for DiscoveryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.kind)
    }
}
