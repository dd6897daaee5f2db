pub mod frequency;
pub mod parameters;
pub mod run;
pub mod run_data;
pub mod trading_hours;

pub use frequency::{BarFrequency, BarUnit};
pub use parameters::{normalize_metric_key, ParamValue, RunParameters, NOT_AVAILABLE};
pub use run::{RunIdentifier, RunMetadata};
pub use run_data::{PnlSummary, ReportKind, RunData, StrategyEvent};
pub use trading_hours::TradingHours;
