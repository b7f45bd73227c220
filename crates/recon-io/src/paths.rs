//! 檔名規則

use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;

/// 修正檔 / 確認檔前綴
pub const PRODUCTION_PREFIX: &str = "Production";
/// 修正檔副檔名
pub const READY_EXTENSION: &str = "ready";

/// 找不到確認列的收件匣訊息
pub const UNMATCHED_REPORT: &str = "NoCnfRowFound.txt";
/// 分配後仍有剩餘數量的需求
pub const UNFULFILLED_REPORT: &str = "NoPlannedOrderFound.txt";
/// 零件清單
pub const PARTS_REPORT: &str = "Parts.txt";

const PRODUCTION_FILE_PATTERN: &str = r"^Production_(\d{14})\.(?:ready|outbound\.archive)$";
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

fn production_file_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PRODUCTION_FILE_PATTERN).expect("確認檔檔名正規表示式無效"))
}

/// 以目前時間產生可自然排序的檔名
///
/// 格式：`{prefix}_{%Y%m%d%H%M%S}.{ext}`
pub fn timestamped_file(prefix: &str, ext: &str) -> String {
    let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT);
    format!("{}_{}.{}", prefix, timestamp, ext)
}

/// 新修正檔檔名
pub fn new_production_file() -> String {
    timestamped_file(PRODUCTION_PREFIX, READY_EXTENSION)
}

/// 從確認檔檔名取出時間戳
///
/// 檔名不符或時間戳不是有效日期時回傳 `None`。
pub fn production_timestamp(file_name: &str) -> Option<NaiveDateTime> {
    let caps = production_file_regex().captures(file_name)?;
    NaiveDateTime::parse_from_str(&caps[1], TIMESTAMP_FORMAT).ok()
}
