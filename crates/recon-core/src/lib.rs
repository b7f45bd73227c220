//! # Recon Core
//!
//! 核心資料模型與類型定義

pub mod candidate;
pub mod confirmation;
pub mod config;
pub mod failure;
pub mod source;

// Re-export 主要類型
pub use candidate::{Allocation, PlannedOrderCandidate};
pub use config::{ReconConfig, RunMode, SourceLimit};
pub use confirmation::ConfirmationRow;
pub use failure::{Failure, FailureKey, MatchedFailure};
pub use source::{
    ConfirmationSource, PlannedOrderColumns, PlannedOrderSource, TabularPlannedOrders,
};

/// 對帳錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    #[error("無法解析收件匣訊息: <{line}>")]
    InboxParse { line: String },

    #[error("無法解析確認檔資料列 ({reason}): <{line}>")]
    ConfirmationParse { line: String, reason: String },

    #[error("彙總鍵不一致，不可合併: {left} / {right}")]
    AggregationKeyMismatch { left: String, right: String },

    #[error("數量溢位: {0}")]
    QuantityOverflow(String),

    #[error("找不到計劃訂單來源: {0}")]
    MissingSource(String),

    #[error("計劃訂單表頭缺少欄位: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("計劃訂單資料列錯誤 (行 {row}): {message}")]
    PlannedOrderRow { row: usize, message: String },

    #[error("讀取來源失敗: {0}")]
    SourceRead(String),

    #[error("配置錯誤: {0}")]
    Config(String),

    #[error("I/O 錯誤: {0}")]
    Io(#[from] std::io::Error),
}

impl ReconError {
    /// 是否為「計劃訂單來源不可用」類錯誤
    ///
    /// 這類錯誤只略過分配階段，不中止整個執行。
    pub fn is_missing_source(&self) -> bool {
        matches!(self, Self::MissingSource(_) | Self::MissingColumns(_))
    }
}

pub type Result<T> = std::result::Result<T, ReconError>;
