//! FIX 標籤與代碼對照表

/// 常用 FIX 標籤對應的欄位名稱
const FIX_TAGS: [(&str, &str); 21] = [
    ("11", "ClOrdID"),
    ("17", "ExecID"),
    ("31", "LastPx"),
    ("32", "LastQty"),
    ("37", "OrderID"),
    ("38", "OrderQty"),
    ("39", "OrdStatus"),
    ("40", "OrdType"),
    ("44", "Price"),
    ("52", "SendingTime"),
    ("54", "Side"),
    ("55", "Symbol"),
    ("59", "TimeInForce"),
    ("60", "TransactTime"),
    ("100", "ExDestination"),
    ("150", "ExecType"),
    ("151", "LeavesQty"),
    ("167", "SecurityType"),
    ("6010", "NautilusOrderID"),
    ("6119", "StrategyID"),
    ("6121", "ClientID"),
];

/// 只轉換這些類型的審計條目
pub const RELEVANT_ENTRY_TYPES: [&str; 6] = [
    "PlaceOrder",
    "Filled",
    "PartiallyFilled",
    "Canceled",
    "Rejected",
    "Acknowledged",
];

/// CSV 欄位的優先順序，其餘欄位按字母排在後面
pub const PRIORITY_COLUMNS: [&str; 19] = [
    "EntryType",
    "SendingTime",
    "TransactTime",
    "Symbol",
    "SideDesc",
    "OrdTypeDesc",
    "OrdStatusDesc",
    "OrderQty",
    "LastQty",
    "LeavesQty",
    "Price",
    "LastPx",
    "ClOrdID",
    "OrderID",
    "ExecID",
    "NautilusOrderID",
    "ExDestination",
    "StrategyID",
    "ClientID",
];

/// 標籤轉欄位名稱，未知標籤為 `Tag_<tag>`
pub fn field_name(tag: &str) -> String {
    FIX_TAGS
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("Tag_{}", tag))
}

pub fn order_status(code: &str) -> Option<&'static str> {
    Some(match code {
        "0" => "New",
        "1" => "PartiallyFilled",
        "2" => "Filled",
        "3" => "DoneForDay",
        "4" => "Canceled",
        "5" => "Replaced",
        "6" => "PendingCancel",
        "7" => "Stopped",
        "8" => "Rejected",
        "9" => "Suspended",
        "A" => "PendingNew",
        "C" => "Expired",
        _ => return None,
    })
}

pub fn side(code: &str) -> Option<&'static str> {
    match code {
        "1" => Some("Buy"),
        "2" => Some("Sell"),
        _ => None,
    }
}

pub fn order_type(code: &str) -> Option<&'static str> {
    match code {
        "1" => Some("Market"),
        "2" => Some("Limit"),
        "3" => Some("Stop"),
        "4" => Some("StopLimit"),
        _ => None,
    }
}
