// 模組定義
pub mod audit;
pub mod config;
pub mod domain_types;
pub mod layout;
pub mod loader;
pub mod report;
pub mod scanner;
pub mod utils;

pub use domain_types::{RunData, RunIdentifier, RunMetadata, RunParameters};
pub use loader::{LoadError, LoaderOptions, RunLoader};
pub use scanner::{DiscoveryWarning, RunScanner, ScanError, ScanOptions, ScanOutcome};
