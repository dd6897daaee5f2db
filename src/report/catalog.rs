//! 元數據目錄轉為 DataFrame，供一般表格操作篩選

use polars::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain_types::RunMetadata;

const FIXED_COLUMNS: [&str; 7] = [
    "run_number",
    "ticker",
    "date",
    "run_id",
    "frequency",
    "run_timestamp",
    "path",
];

/// 每次執行一行：固定欄位、所有參數鍵（以字串呈現）、`metric_*` 指標
///
/// 某次執行缺少的參數或指標為 null；與固定欄位同名的參數會加上 `param_` 前綴。
pub fn catalog_frame(runs: &[Arc<RunMetadata>]) -> PolarsResult<DataFrame> {
    let mut columns: Vec<Column> = vec![
        Column::new(
            "run_number".into(),
            (1..=runs.len() as u32).collect::<Vec<u32>>(),
        ),
        Column::new(
            "ticker".into(),
            runs.iter().map(|r| r.ticker().to_string()).collect::<Vec<_>>(),
        ),
        Column::new(
            "date".into(),
            runs.iter()
                .map(|r| r.date().format("%Y-%m-%d").to_string())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "run_id".into(),
            runs.iter().map(|r| r.run_id().to_string()).collect::<Vec<_>>(),
        ),
        Column::new(
            "frequency".into(),
            runs.iter().map(|r| r.frequency_label()).collect::<Vec<_>>(),
        ),
        Column::new(
            "run_timestamp".into(),
            runs.iter()
                .map(|r| r.run_timestamp().map(|ts| ts.to_rfc3339()))
                .collect::<Vec<Option<String>>>(),
        ),
        Column::new(
            "path".into(),
            runs.iter()
                .map(|r| r.path().display().to_string())
                .collect::<Vec<_>>(),
        ),
    ];

    let param_keys: BTreeSet<&str> = runs.iter().flat_map(|r| r.parameters().keys()).collect();
    for key in param_keys {
        let name = if FIXED_COLUMNS.contains(&key) {
            format!("param_{}", key)
        } else {
            key.to_string()
        };
        let values: Vec<Option<String>> = runs
            .iter()
            .map(|r| r.parameters().get(key).map(ToString::to_string))
            .collect();
        columns.push(Column::new(name.into(), values));
    }

    let metric_keys: BTreeSet<&str> = runs
        .iter()
        .flat_map(|r| r.metrics().keys().map(String::as_str))
        .collect();
    for key in metric_keys {
        let values: Vec<Option<f64>> = runs.iter().map(|r| r.metrics().get(key).copied()).collect();
        columns.push(Column::new(format!("metric_{}", key).into(), values));
    }

    DataFrame::new(columns)
}
