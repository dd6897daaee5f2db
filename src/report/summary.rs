//! 回測執行比較表與文字摘要

use polars::prelude::*;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::domain_types::{ParamValue, RunMetadata, NOT_AVAILABLE};

/// 比較表中的一行
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummaryRow {
    pub run: usize,
    pub ticker: String,
    pub frequency: String,
    pub burnin_start: String,
    pub burnin_end: String,
    pub backtest_end: String,
    pub trading_start: String,
    pub trading_end: String,
    pub entry_p_top: String,
    pub signal_long_top: String,
    pub max_position_bars: String,
    pub filepath: String,
}

impl RunSummaryRow {
    fn from_metadata(index: usize, run: &RunMetadata) -> Self {
        let params = run.parameters();
        let (trading_start, trading_end) = match run.trading_hours() {
            Some(hours) => (hours.start_label(), hours.end_label()),
            None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
        };

        Self {
            run: index + 1,
            ticker: run.ticker().to_string(),
            frequency: run.frequency_label(),
            burnin_start: params.display("burnin_start_date"),
            burnin_end: params.display("burnin_end_date"),
            backtest_end: params.display("backtest_end_date"),
            trading_start,
            trading_end,
            entry_p_top: params.display("entry_bound_p_top"),
            signal_long_top: params.display("signal_value_long_top"),
            max_position_bars: params.display("max_position_bars"),
            filepath: run.path().display().to_string(),
        }
    }
}

/// 從元數據建立比較表（Run 從 1 起算）
pub fn summary_rows(runs: &[Arc<RunMetadata>]) -> Vec<RunSummaryRow> {
    runs.iter()
        .enumerate()
        .map(|(i, run)| RunSummaryRow::from_metadata(i, run))
        .collect()
}

/// 比較表轉為 DataFrame
pub fn summary_frame(runs: &[Arc<RunMetadata>]) -> PolarsResult<DataFrame> {
    let rows = summary_rows(runs);
    let text = |name: &str, f: fn(&RunSummaryRow) -> &String| {
        Column::new(
            name.into(),
            rows.iter().map(|r| f(r).clone()).collect::<Vec<String>>(),
        )
    };

    DataFrame::new(vec![
        Column::new(
            "Run".into(),
            rows.iter().map(|r| r.run as u32).collect::<Vec<u32>>(),
        ),
        text("Ticker", |r| &r.ticker),
        text("Frequency", |r| &r.frequency),
        text("Burn-in Start", |r| &r.burnin_start),
        text("Burn-in End", |r| &r.burnin_end),
        text("Backtest End", |r| &r.backtest_end),
        text("Trading Start", |r| &r.trading_start),
        text("Trading End", |r| &r.trading_end),
        text("Entry P Top", |r| &r.entry_p_top),
        text("Sig Val Long Top", |r| &r.signal_long_top),
        text("Max Pos Bars", |r| &r.max_position_bars),
        text("Filepath", |r| &r.filepath),
    ])
}

// "entry_bound_p_top" -> "Entry Bound P Top"
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn format_value(value: &ParamValue) -> String {
    match value {
        ParamValue::Float(f) => format!("{:.6}", f),
        other => other.to_string(),
    }
}

/// 產生文字摘要
///
/// `show_all_keys` 為真時列出所有執行的參數與指標聯集，缺少的標示為 `<not available>`；
/// 否則只顯示關鍵欄位。
pub fn render_runs_summary(
    runs: &[Arc<RunMetadata>],
    max_runs: Option<usize>,
    show_all_keys: bool,
) -> String {
    let mut out = String::new();
    if runs.is_empty() {
        out.push_str("No runs found.\n");
        return out;
    }

    let rule = "=".repeat(120);
    let param_keys: BTreeSet<&str> = runs.iter().flat_map(|r| r.parameters().keys()).collect();
    let metric_keys: BTreeSet<&str> = runs
        .iter()
        .flat_map(|r| r.metrics().keys().map(String::as_str))
        .collect();

    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "FOUND {} RUNS", runs.len());
    let _ = writeln!(out, "{}\n", rule);

    let all_keys: Vec<String> = param_keys
        .iter()
        .map(|k| k.to_string())
        .chain(metric_keys.iter().map(|k| format!("metric_{}", k)))
        .collect();
    let _ = writeln!(out, "Available keys across all runs: {}", all_keys.len());
    let _ = writeln!(out, "Keys: {}\n", all_keys.join(", "));

    let display_count = max_runs.map_or(runs.len(), |max| max.min(runs.len()));

    for (i, run) in runs.iter().take(display_count).enumerate() {
        let _ = writeln!(out, "Run {}:", i + 1);
        let _ = writeln!(out, "  Ticker: {}", run.ticker());
        let _ = writeln!(out, "  Date: {}", run.date().format("%Y-%m-%d"));
        let _ = writeln!(out, "  Run Directory: {}", run.run_id());
        let _ = writeln!(out, "  Frequency: {}", run.frequency_label());

        if show_all_keys {
            for key in &param_keys {
                match run.parameters().get(key) {
                    Some(value) => {
                        let _ = writeln!(out, "  {}: {}", title_case(key), format_value(value));
                    }
                    None => {
                        let _ = writeln!(out, "  {}: <not available>", title_case(key));
                    }
                }
            }
        } else {
            let params = run.parameters();
            let _ = writeln!(out, "  Strategy: {}", params.display("strategy_class"));
            for key in ["bar_type", "entry_bound_p_top", "entry_bound_p_bottom"] {
                if let Some(value) = params.get(key) {
                    let _ = writeln!(out, "  {}: {}", title_case(key), value);
                }
            }
        }

        if !run.metrics().is_empty() {
            let _ = writeln!(out, "  Metrics:");
            for (name, value) in run.metrics() {
                let _ = writeln!(out, "    {}: {:.4}", title_case(name), value);
            }
        }
        out.push('\n');
    }

    if runs.len() > display_count {
        let _ = writeln!(out, "... and {} more runs", runs.len() - display_count);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_types::{RunIdentifier, RunParameters};
    use crate::utils::MarketClock;
    use chrono::NaiveDate;
    use serde_json::json;

    fn run(run_id: &str, params: serde_json::Value) -> Arc<RunMetadata> {
        Arc::new(RunMetadata::new(
            RunIdentifier::new("MSFT", NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(), run_id),
            format!("/data/MSFT/2024-01-05/{}", run_id),
            RunParameters::from_json(&params).unwrap(),
            &MarketClock::default(),
        ))
    }

    fn sample_runs() -> Vec<Arc<RunMetadata>> {
        vec![
            run(
                "093000_a",
                json!({
                    "bar_type": "MSFT.POLYGON-1-MINUTE-LAST-EXTERNAL",
                    "burnin_start_date": "2023-12-01",
                    "trading_hours": "{'start': datetime.time(8, 0), 'end': datetime.time(16, 0)}",
                    "entry_bound_p_top": 0.95
                }),
            ),
            run("100000_b", json!({"strategy_class": "Quiescence"})),
        ]
    }

    #[test]
    fn test_summary_rows() {
        let rows = summary_rows(&sample_runs());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].run, 1);
        assert_eq!(rows[0].frequency, "1-MINUTE");
        assert_eq!(rows[0].trading_start, "8:00");
        assert_eq!(rows[0].trading_end, "16:00");
        assert_eq!(rows[0].entry_p_top, "0.95");
        assert_eq!(rows[1].frequency, NOT_AVAILABLE);
        assert_eq!(rows[1].burnin_start, NOT_AVAILABLE);
    }

    #[test]
    fn test_summary_frame_shape() {
        let df = summary_frame(&sample_runs()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 12);
        assert!(df.column("Sig Val Long Top").is_ok());
    }

    #[test]
    fn test_render_all_keys() {
        let text = render_runs_summary(&sample_runs(), None, true);
        assert!(text.contains("FOUND 2 RUNS"));
        assert!(text.contains("Entry Bound P Top: 0.950000"));
        assert!(text.contains("Strategy Class: <not available>"));
    }

    #[test]
    fn test_render_simplified_with_limit() {
        let text = render_runs_summary(&sample_runs(), Some(1), false);
        assert!(text.contains("Run 1:"));
        assert!(!text.contains("Run 2:"));
        assert!(text.contains("... and 1 more runs"));
        assert!(text.contains("Strategy: N/A"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_runs_summary(&[], None, true), "No runs found.\n");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("entry_bound_p_top"), "Entry Bound P Top");
        assert_eq!(title_case("pnl_total"), "Pnl Total");
    }
}
