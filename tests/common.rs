#![allow(dead_code)]

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const ORDERS_CSV: &str = "\
client_order_id,instrument_id,side,quantity,status,ts_init
O-1,MSFT.POLYGON,BUY,100,FILLED,1704465000000000000
O-2,MSFT.POLYGON,SELL,100,FILLED,1704465060000000000
O-3,MSFT.POLYGON,BUY,50,CANCELED,1704465120000000000
";

pub const POSITIONS_CSV: &str = "\
position_id,instrument_id,realized_pnl,ts_opened,ts_closed
P-1,MSFT.POLYGON,65.62 USD,1704465000000000000,1704465060000000000
P-2,MSFT.POLYGON,-10.00 USD,1704465120000000000,1704465180000000000
";

pub const FILLS_CSV: &str = "\
trade_id,client_order_id,last_px,last_qty,ts_event
T-1,O-1,375.10,100,1704465000000000000
T-2,O-2,375.75,100,1704465060000000000
";

// 故意不按時間排序
pub const STRATEGY_JSONL: &str = r#"{"ts_event": 1704465060000000000, "type": "signal", "value": 0.8}
{"ts_event": 1704465000000000000, "type": "signal", "value": 0.2}

{"ts_event": 1704465120000000000, "type": "exit", "value": null}
"#;

pub const PNL_SUMMARY_JSON: &str = r#"{"PnL (total)": 55.62, "Win Rate": 0.5, "currency": "USD"}"#;

/// 臨時回測輸出目錄 `{root}/{TICKER}/{DATE}/{RUN}/`
pub struct RunTree {
    dir: TempDir,
}

impl RunTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("無法建立臨時目錄"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// 建立空的執行目錄
    pub fn run_dir(&self, ticker: &str, date: &str, run: &str) -> PathBuf {
        let path = self.root().join(ticker).join(date).join(run);
        fs::create_dir_all(&path).expect("無法建立執行目錄");
        path
    }

    /// 建立完整的執行目錄（參數、事件日誌、三份報表）
    pub fn add_run(&self, ticker: &str, date: &str, run: &str, params: Value) -> PathBuf {
        let path = self.run_dir(ticker, date, run);
        write(&path, "run_parameters.json", &params.to_string());
        write(&path, "strategy_data.jsonl", STRATEGY_JSONL);
        write(&path, "orders.csv", ORDERS_CSV);
        write(&path, "positions.csv", POSITIONS_CSV);
        write(&path, "fills.csv", FILLS_CSV);
        path
    }
}

pub fn write(dir: &Path, file: &str, content: &str) {
    fs::write(dir.join(file), content).expect("無法寫入測試檔案");
}
