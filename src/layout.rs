//! 回測輸出目錄結構
//!
//! 上游回測系統寫出的固定結構：
//!
//! ```text
//! {root}/{TICKER}/{DATE}/{TIME_RUNID}/
//!     run_parameters.json      掃描時讀取（必要）
//!     strategy_data.jsonl      載入時讀取（必要）
//!     orders.csv               載入時讀取（必要）
//!     positions.csv            載入時讀取（必要）
//!     fills.csv                載入時讀取（必要）
//!     pnl_summary.json         載入時讀取（可選）
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const PARAMETERS_FILE: &str = "run_parameters.json";
pub const STRATEGY_DATA_FILE: &str = "strategy_data.jsonl";
pub const PNL_SUMMARY_FILE: &str = "pnl_summary.json";

/// 列出目錄下的子目錄，依名稱排序
///
/// 型別取自目錄項本身，一般檔案不會被 stat 或開啟；只有符號連結會追蹤一次。
pub(crate) fn sorted_subdirs(dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut subdirs = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();

        let is_dir = file_type.is_dir() || (file_type.is_symlink() && path.is_dir());
        if !is_dir {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        subdirs.push((name, path));
    }

    subdirs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(subdirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_subdirs_skips_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("c.txt"), "x").unwrap();

        let names: Vec<_> = sorted_subdirs(dir.path())
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
