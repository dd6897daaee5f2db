//! 券商審計軌跡 (FIX 訊息 XML) 轉換為訂單 / 成交表
//!
//! 審計檔由 `<Entry type=".." msgId="..">` 組成，每個條目內含多個
//! `<field tag=".." val=".."/>`。以串流方式讀取，檔案大小不影響記憶體用量。

pub mod fix;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use polars::prelude::*;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::{debug, info};

const ENTRY_TAG: &[u8] = b"Entry";
const FIELD_TAG: &[u8] = b"field";
const PROGRESS_INTERVAL: usize = 10_000;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("無法存取審計檔 {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML 解析錯誤 (位置 {position}): {reason}")]
    Xml { position: u64, reason: String },

    #[error("Polars 錯誤: {0}")]
    Polars(#[from] PolarsError),
}

/// 單一審計條目轉換後的欄位
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditRecord {
    fields: BTreeMap<String, String>,
}

impl AuditRecord {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn entry_type(&self) -> Option<&str> {
        self.get("EntryType")
    }

    pub fn symbol(&self) -> Option<&str> {
        self.get("Symbol")
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    // 代碼欄位補上說明，時間欄位轉為可讀格式
    fn decorate(&mut self) {
        let described = [
            ("OrdStatus", "OrdStatusDesc", fix::order_status as fn(&str) -> Option<&'static str>),
            ("Side", "SideDesc", fix::side),
            ("OrdType", "OrdTypeDesc", fix::order_type),
        ];
        for (column, desc_column, describe) in described {
            if let Some(code) = self.get(column) {
                let desc = describe(code).map(str::to_string).unwrap_or_else(|| code.to_string());
                self.insert(desc_column, desc);
            }
        }

        for column in ["SendingTime", "TransactTime"] {
            if let Some(value) = self.fields.get_mut(column) {
                *value = format_fix_time(value);
            }
        }
    }
}

/// 解析結果
#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    /// 讀到的條目總數（含被略過的類型）
    pub entries_seen: usize,
    pub records: Vec<AuditRecord>,
}

// FIX 時間 "20260130-14:30:05" -> "2026-01-30 14:30:05"，無法解析時保留原值
fn format_fix_time(value: &str) -> String {
    NaiveDateTime::parse_from_str(value, "%Y%m%d-%H:%M:%S")
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| value.to_string())
}

fn attribute<R>(reader: &Reader<R>, element: &BytesStart, name: &str) -> Result<Option<String>, AuditError> {
    let xml_error = |reason: String| AuditError::Xml {
        position: reader.buffer_position() as u64,
        reason,
    };
    match element.try_get_attribute(name) {
        Ok(Some(attr)) => attr
            .unescape_value()
            .map(|v| Some(v.into_owned()))
            .map_err(|e| xml_error(e.to_string())),
        Ok(None) => Ok(None),
        Err(e) => Err(xml_error(e.to_string())),
    }
}

// 開始一個條目；不相關的類型回傳 None，其欄位會被略過
fn open_entry<R>(reader: &Reader<R>, element: &BytesStart) -> Result<Option<AuditRecord>, AuditError> {
    let entry_type = attribute(reader, element, "type")?;
    let Some(entry_type) = entry_type.filter(|t| fix::RELEVANT_ENTRY_TYPES.contains(&t.as_str())) else {
        return Ok(None);
    };

    let mut record = AuditRecord::default();
    record.insert("EntryType", entry_type);
    if let Some(msg_id) = attribute(reader, element, "msgId")? {
        record.insert("MsgId", msg_id);
    }
    Ok(Some(record))
}

/// 串流解析審計 XML
pub fn parse_audit<R: BufRead>(input: R) -> Result<AuditTrail, AuditError> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut trail = AuditTrail::default();
    // 目前所在條目；Some(None) 表示條目類型不相關
    let mut current: Option<Option<AuditRecord>> = None;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| AuditError::Xml {
            position: reader.error_position() as u64,
            reason: e.to_string(),
        })?;

        match event {
            Event::Start(e) if e.name().as_ref() == ENTRY_TAG => {
                current = Some(open_entry(&reader, &e)?);
            }
            Event::Empty(e) if e.name().as_ref() == ENTRY_TAG => {
                let record = open_entry(&reader, &e)?;
                close_entry(&mut trail, record);
            }
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == FIELD_TAG => {
                if let Some(Some(record)) = current.as_mut() {
                    let tag = attribute(&reader, &e, "tag")?.unwrap_or_default();
                    let value = attribute(&reader, &e, "val")?.unwrap_or_default();
                    record.insert(fix::field_name(&tag), value);
                }
            }
            Event::End(e) if e.name().as_ref() == ENTRY_TAG => {
                if let Some(record) = current.take() {
                    close_entry(&mut trail, record);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    info!(
        "審計檔解析完成: {} 個條目, 擷取 {} 筆記錄",
        trail.entries_seen,
        trail.records.len()
    );
    Ok(trail)
}

fn close_entry(trail: &mut AuditTrail, record: Option<AuditRecord>) {
    trail.entries_seen += 1;
    if let Some(mut record) = record {
        record.decorate();
        trail.records.push(record);
    }
    if trail.entries_seen % PROGRESS_INTERVAL == 0 {
        debug!(
            "已處理 {} 個條目, 擷取 {} 筆記錄",
            trail.entries_seen,
            trail.records.len()
        );
    }
}

/// 解析審計檔
pub fn parse_audit_file(path: &Path) -> Result<AuditTrail, AuditError> {
    let io_error = |source| AuditError::Io {
        path: path.to_path_buf(),
        source,
    };
    let size = fs::metadata(path).map_err(io_error)?.len();
    info!("解析審計檔 {} ({:.2} MB)", path.display(), size as f64 / (1024.0 * 1024.0));

    let file = File::open(path).map_err(io_error)?;
    parse_audit(BufReader::new(file))
}

/// 欄位順序：優先欄位（存在者）在前，其餘按名稱排序
pub fn audit_columns(records: &[AuditRecord]) -> Vec<String> {
    let all: BTreeSet<&str> = records.iter().flat_map(AuditRecord::columns).collect();

    let mut columns: Vec<String> = fix::PRIORITY_COLUMNS
        .iter()
        .filter(|c| all.contains(*c))
        .map(|c| c.to_string())
        .collect();
    columns.extend(
        all.into_iter()
            .filter(|c| !fix::PRIORITY_COLUMNS.contains(c))
            .map(str::to_string),
    );
    columns
}

/// 轉為字串欄位的 DataFrame，某筆記錄缺少的欄位為 null
pub fn audit_frame(records: &[AuditRecord]) -> PolarsResult<DataFrame> {
    let columns = audit_columns(records)
        .into_iter()
        .map(|name| {
            let values: Vec<Option<&str>> = records.iter().map(|r| r.get(&name)).collect();
            Column::new(name.as_str().into(), values)
        })
        .collect();
    DataFrame::new(columns)
}

/// 寫出 CSV；沒有記錄時不產生檔案並回傳 false
pub fn write_audit_csv(records: &[AuditRecord], path: &Path) -> Result<bool, AuditError> {
    if records.is_empty() {
        info!("沒有可寫出的審計記錄");
        return Ok(false);
    }

    let io_error = |source| AuditError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let mut df = audit_frame(records)?;
    let mut file = File::create(path).map_err(io_error)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;

    info!("寫出 {} 筆審計記錄 ({} 欄) 至 {}", df.height(), df.width(), path.display());
    Ok(true)
}

/// 預設輸出路徑：副檔名換成 .csv
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("csv")
}

/// 依條目類型與代碼統計
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditSummary {
    pub by_entry_type: BTreeMap<String, usize>,
    /// 記錄最多的代碼，依數量遞減，同數量按名稱
    pub top_symbols: Vec<(String, usize)>,
}

pub fn audit_summary(records: &[AuditRecord], top: usize) -> AuditSummary {
    let mut by_entry_type = BTreeMap::new();
    let mut symbols: HashMap<&str, usize> = HashMap::new();

    for record in records {
        *by_entry_type
            .entry(record.entry_type().unwrap_or("Unknown").to_string())
            .or_insert(0) += 1;

        let symbol = record.symbol().unwrap_or("Unknown");
        if !symbol.is_empty() && symbol != "*" {
            *symbols.entry(symbol).or_insert(0) += 1;
        }
    }

    let mut top_symbols: Vec<(String, usize)> = symbols
        .into_iter()
        .map(|(symbol, count)| (symbol.to_string(), count))
        .collect();
    top_symbols.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_symbols.truncate(top);

    AuditSummary {
        by_entry_type,
        top_symbols,
    }
}
