//! 載入錯誤定義

use std::path::PathBuf;
use thiserror::Error;

/// 單次載入失敗的原因；任何錯誤都不會回傳部分填充的數據
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("回測執行目錄已不存在: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("缺少必要檔案 {file}: {}", .path.display())]
    MissingFile { path: PathBuf, file: String },

    #[error("檔案 {file} 解析失敗 ({}): {reason}", .path.display())]
    Parse {
        path: PathBuf,
        file: String,
        reason: String,
    },

    #[error("讀取 {} 失敗: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    /// 出錯的檔案名稱（目錄層級錯誤時為 None）
    pub fn file(&self) -> Option<&str> {
        match self {
            LoadError::MissingFile { file, .. } | LoadError::Parse { file, .. } => Some(file),
            _ => None,
        }
    }

    pub fn path(&self) -> &PathBuf {
        match self {
            LoadError::NotFound { path }
            | LoadError::MissingFile { path, .. }
            | LoadError::Parse { path, .. }
            | LoadError::Io { path, .. } => path,
        }
    }
}

pub type LoadResult<T> = Result<T, LoadError>;
