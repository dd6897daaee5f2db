//! 報表層：元數據目錄、比較表與累積損益
pub mod catalog;
pub mod pnl;
pub mod summary;

pub use catalog::catalog_frame;
pub use pnl::{cumulative_pnl, pnl_statistics, PnlPoint, PnlStatistics, ReportError};
pub use summary::{render_runs_summary, summary_frame, summary_rows, RunSummaryRow};
