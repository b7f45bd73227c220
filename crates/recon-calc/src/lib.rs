//! # Recon Calculation Engine
//!
//! 收件匣失敗需求對帳引擎：解析 → 彙總 → 比對確認列 → 分配計劃訂單 → 輸出

pub mod aggregation;
pub mod allocation;
pub mod matching;
pub mod output;
pub mod parsing;
pub mod reconciler;

// Re-export 主要類型
pub use aggregation::FailureAggregator;
pub use allocation::{AllocationSummary, QuantityAllocator};
pub use matching::{ConfirmationMatcher, MatchOutcome, MatchStats};
pub use output::{format_material_qty, CorrectionRow, OutputFormatter, UnfulfilledRecord};
pub use parsing::{normalize_part_name, ParseStats, PartName, RecordParser};
pub use reconciler::Reconciler;

use recon_core::{Failure, MatchedFailure, RunMode};

/// 執行階段
///
/// 依序推進；結果中的 `completed` 為最後完成的階段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    Parsed,
    Aggregated,
    Matched,
    Allocated,
    Reported,
}

/// 對帳結果
#[derive(Debug, Clone)]
pub struct ReconResult {
    /// 本次執行識別碼
    pub run_id: uuid::Uuid,

    pub mode: RunMode,

    /// 最後完成的階段
    pub completed: RunPhase,

    /// 零件清單（排序、去重）
    pub parts: Vec<String>,

    /// 彙總後的需求
    pub aggregated: Vec<Failure>,

    /// 找不到確認列的需求
    pub unmatched: Vec<Failure>,

    /// 已比對（及分配）的需求
    pub matched: Vec<MatchedFailure>,

    /// 分配結果；計劃訂單來源不可用時為 `None`
    pub allocation: Option<AllocationReport>,

    pub stats: RunStats,

    /// 警告信息
    pub warnings: Vec<ReconWarning>,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: Option<u128>,
}

impl ReconResult {
    /// 創建空的對帳結果
    pub fn empty(mode: RunMode) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4(),
            mode,
            completed: RunPhase::Parsed,
            parts: Vec::new(),
            aggregated: Vec::new(),
            unmatched: Vec::new(),
            matched: Vec::new(),
            allocation: None,
            stats: RunStats::default(),
            warnings: Vec::new(),
            calculation_time_ms: None,
        }
    }

    /// 添加警告
    pub fn add_warning(&mut self, warning: ReconWarning) {
        self.warnings.push(warning);
    }

    /// 是否有修正檔內容
    pub fn has_corrections(&self) -> bool {
        self.allocation
            .as_ref()
            .map(|a| !a.corrections.is_empty())
            .unwrap_or(false)
    }
}

/// 分配與輸出結果
#[derive(Debug, Clone)]
pub struct AllocationReport {
    /// 修正檔資料列
    pub corrections: Vec<CorrectionRow>,
    /// 未滿足數量報表
    pub unfulfilled: Vec<UnfulfilledRecord>,
    pub summary: AllocationSummary,
}

/// 執行統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// 成功解析的收件匣訊息數
    pub inbox_parsed: usize,
    /// 無法解析的收件匣訊息數
    pub inbox_rejected: usize,
    /// 彙總後的需求數
    pub aggregated: usize,
    /// 合併後數量溢位而略過的通知數
    pub aggregation_rejected: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// 確認檔比對統計
    pub matching: MatchStats,
    /// 計劃訂單候選數
    pub planned_orders: usize,
    /// 被略過的計劃訂單資料列
    pub planned_orders_rejected: usize,
    /// 修正檔列數
    pub correction_rows: usize,
    /// 材料用量無法計算而略過的需求數
    pub corrections_skipped: usize,
    /// 未滿足數量的需求數
    pub unfulfilled: usize,
}

/// 對帳警告
#[derive(Debug, Clone)]
pub struct ReconWarning {
    /// 相關對象（零件、檔名或階段）
    pub subject: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl ReconWarning {
    pub fn new(subject: String, message: String, severity: WarningSeverity) -> Self {
        Self {
            subject,
            message,
            severity,
        }
    }

    pub fn info(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Info)
    }

    pub fn warning(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Warning)
    }

    pub fn error(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}
