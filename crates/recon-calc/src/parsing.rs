//! 原始資料列解析

use std::str::FromStr;
use std::sync::OnceLock;

use recon_core::{ConfirmationRow, Failure, ReconError, Result};
use regex::Regex;
use rust_decimal::Decimal;

/// 收件匣通知格式
const INBOX_PATTERN: &str = r"^Planned order not found for (\d{7}[a-zA-Z]-[\w-]+), (D-\d{7}-\d{5}), ([\d,]+)\.000, Sigmanest Program:([\d-]+)";

/// 掃描零件名稱：{工令末 3 碼}{結構}-..-..-{零件}
const SCAN_PART_PATTERN: &str = r"^(\d{3})([a-zA-Z])-\w+-\w+-(\w+)";

/// 確認檔工令欄位：S-{7 碼工令}
const DATA_FILE_JOB_PATTERN: &str = r"^S-(\d{7})";

/// 確認檔欄位位置
mod field {
    pub const PART: usize = 0;
    pub const JOB: usize = 1;
    pub const PART_WBS: usize = 2;
    pub const PART_QTY: usize = 4;
    pub const MATERIAL: usize = 6;
    pub const MATERIAL_WBS: usize = 7;
    pub const MATERIAL_QTY: usize = 8;
    pub const MATERIAL_LOCATION: usize = 10;
    pub const PLANT: usize = 11;
    pub const PROGRAM: usize = 12;

    /// 最少欄位數
    pub const COUNT: usize = PROGRAM + 1;
}

fn inbox_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(INBOX_PATTERN).expect("收件匣格式正規表示式無效"))
}

fn scan_part_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SCAN_PART_PATTERN).expect("零件名稱正規表示式無效"))
}

fn data_file_job_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DATA_FILE_JOB_PATTERN).expect("工令正規表示式無效"))
}

/// 零件名稱正規化結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartName {
    /// 以工令重新組成的名稱
    Mapped(String),
    /// 零件名稱不含結構尾碼，保留原值
    Unchanged(String),
    /// 零件名稱看似可轉換，但工令缺漏或不一致，保留原值
    Unmapped(String),
}

impl PartName {
    pub fn into_inner(self) -> String {
        match self {
            Self::Mapped(s) | Self::Unchanged(s) | Self::Unmapped(s) => s,
        }
    }

    pub fn is_unmapped(&self) -> bool {
        matches!(self, Self::Unmapped(_))
    }
}

/// 解析統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// 成功解析的列數
    pub parsed: usize,
    /// 被略過的列數
    pub rejected: usize,
    /// 零件名稱無法以工令轉換而保留原值的次數
    pub normalization_fallbacks: usize,
}

impl ParseStats {
    pub fn merge(&mut self, other: ParseStats) {
        self.parsed += other.parsed;
        self.rejected += other.rejected;
        self.normalization_fallbacks += other.normalization_fallbacks;
    }
}

/// 資料列解析器
#[derive(Debug, Clone, Copy)]
pub struct RecordParser {
    delimiter: char,
}

impl Default for RecordParser {
    fn default() -> Self {
        Self { delimiter: '\t' }
    }
}

impl RecordParser {
    /// 創建解析器（指定確認檔分隔字元）
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    /// 解析一則收件匣通知
    ///
    /// 格式：
    /// `Planned order not found for {mark}, {wbs}, {qty}.000, Sigmanest Program:{program}`
    pub fn parse_failure(&self, line: &str) -> Result<Failure> {
        let line = line.trim();
        let error = || ReconError::InboxParse {
            line: line.to_string(),
        };

        let caps = inbox_regex().captures(line).ok_or_else(error)?;

        let qty = caps[3]
            .replace(',', "")
            .parse::<u32>()
            .map_err(|_| error())?;

        Ok(Failure::new(caps[1].to_string(), caps[2].to_string(), qty, caps[4].to_string())
            .with_line(line.to_string()))
    }

    /// 解析多則收件匣通知，錯誤列另行收集
    pub fn parse_failures<I, S>(&self, lines: I) -> (Vec<Failure>, Vec<ReconError>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut failures = Vec::new();
        let mut errors = Vec::new();

        for line in lines {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }

            match self.parse_failure(line) {
                Ok(failure) => failures.push(failure),
                Err(e) => {
                    tracing::warn!("無法解析收件匣訊息: {}", line.trim());
                    errors.push(e);
                }
            }
        }

        (failures, errors)
    }

    /// 解析一列確認檔資料
    ///
    /// 整列先轉大寫並去除前後空白再切割欄位。零件數量為 0 視為無法解析。
    pub fn parse_confirmation(&self, line: &str) -> Result<ConfirmationRow> {
        self.parse_confirmation_with_stats(line, &mut ParseStats::default())
    }

    /// 解析一列確認檔資料並累計統計
    pub fn parse_confirmation_with_stats(
        &self,
        line: &str,
        stats: &mut ParseStats,
    ) -> Result<ConfirmationRow> {
        match self.build_confirmation(line) {
            Ok((row, part_name_unmapped)) => {
                stats.parsed += 1;
                if part_name_unmapped {
                    stats.normalization_fallbacks += 1;
                }
                Ok(row)
            }
            Err(e) => {
                stats.rejected += 1;
                Err(e)
            }
        }
    }

    fn build_confirmation(&self, line: &str) -> Result<(ConfirmationRow, bool)> {
        let upper = line.trim().to_uppercase();
        let fields: Vec<&str> = upper.split(self.delimiter).collect();

        let reject = |reason: String| ReconError::ConfirmationParse {
            line: line.trim().to_string(),
            reason,
        };

        if fields.len() < field::COUNT {
            return Err(reject(format!(
                "欄位數不足：需要 {}，實際 {}",
                field::COUNT,
                fields.len()
            )));
        }

        let part_qty = fields[field::PART_QTY]
            .trim()
            .parse::<u32>()
            .map_err(|_| reject(format!("零件數量無效 <{}>", fields[field::PART_QTY])))?;
        if part_qty == 0 {
            return Err(reject("零件數量為 0".to_string()));
        }

        let material_qty = parse_decimal(fields[field::MATERIAL_QTY])
            .ok_or_else(|| reject(format!("材料數量無效 <{}>", fields[field::MATERIAL_QTY])))?;

        let part_name = normalize_part_name(fields[field::PART], fields[field::JOB]);
        let unmapped = part_name.is_unmapped();
        if unmapped {
            tracing::debug!(
                "零件名稱無法以工令轉換，保留原值: {} ({})",
                fields[field::PART],
                fields[field::JOB]
            );
        }

        let row = ConfirmationRow::new(
            part_name.into_inner(),
            fields[field::JOB].to_string(),
            fields[field::PART_WBS].to_string(),
            part_qty,
            fields[field::PROGRAM].to_string(),
        )
        .with_material(
            fields[field::MATERIAL].to_string(),
            fields[field::MATERIAL_WBS].to_string(),
            material_qty,
            fields[field::MATERIAL_LOCATION].to_string(),
            fields[field::PLANT].to_string(),
        );

        Ok((row, unmapped))
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// 零件名稱正規化
///
/// 掃描名稱如 `252B-1B-X-M318A` 搭配工令 `S-1200252` 轉為 `1200252B-M318A`。
/// 任一樣式不符，或工令末碼與名稱前綴不一致時保留原值，不會失敗。
pub fn normalize_part_name(part: &str, job: &str) -> PartName {
    let Some(scan) = scan_part_regex().captures(part) else {
        return PartName::Unchanged(part.to_string());
    };

    let Some(job_caps) = data_file_job_regex().captures(job) else {
        return PartName::Unmapped(part.to_string());
    };

    let job_end = &scan[1];
    let structure = &scan[2];
    let piece = &scan[3];
    let job_number = &job_caps[1];

    if !job_number.ends_with(job_end) {
        return PartName::Unmapped(part.to_string());
    }

    PartName::Mapped(format!("{}{}-{}", job_number, structure, piece))
}
