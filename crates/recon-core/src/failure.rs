//! 失敗需求模型
//!
//! 一筆 [`Failure`] 代表收件匣中一則「找不到計劃訂單」的通知。它的生命週期分成兩個型別：
//!
//! - [`Failure`]：剛解析或已彙總，尚未找到確認列
//! - [`MatchedFailure`]：已連結確認列，可以接受計劃訂單數量的分配
//!
//! 分配只存在於 [`MatchedFailure`] 上，因此「未比對就分配」無法寫出來。

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::{Allocation, ConfirmationRow, ReconError, Result};

/// 彙總鍵（mark, program）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FailureKey {
    pub mark: String,
    pub program: String,
}

impl fmt::Display for FailureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.mark, self.program)
    }
}

/// 失敗需求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// 零件編號（mark）
    pub mark: String,

    /// 通知上的 WBS 元素
    pub wbs: String,

    /// 未滿足數量
    pub qty: u32,

    /// 生產程式編號
    pub program: String,

    /// 原始收件匣文字（回報未比對項目時使用）
    pub line: String,
}

impl Failure {
    /// 創建新的失敗需求
    pub fn new(mark: String, wbs: String, qty: u32, program: String) -> Self {
        Self {
            mark,
            wbs,
            qty,
            program,
            line: String::new(),
        }
    }

    /// 建構器模式：設置原始文字
    pub fn with_line(mut self, line: String) -> Self {
        self.line = line;
        self
    }

    /// 彙總鍵
    pub fn key(&self) -> FailureKey {
        FailureKey {
            mark: self.mark.clone(),
            program: self.program.clone(),
        }
    }

    /// 是否屬於同一彙總單位
    pub fn same_unit(&self, other: &Failure) -> bool {
        self.mark == other.mark && self.program == other.program
    }

    /// 標準排序鍵 (mark, program, wbs)
    pub fn sort_key(&self) -> (&str, &str, &str) {
        (&self.mark, &self.program, &self.wbs)
    }

    /// 合併同一彙總單位的另一筆失敗需求（數量相加，保留本筆識別欄位）
    ///
    /// 鍵不一致代表彙總邏輯錯誤，回傳 [`ReconError::AggregationKeyMismatch`]。
    pub fn try_merge(&mut self, other: Failure) -> Result<()> {
        if !self.same_unit(&other) {
            return Err(ReconError::AggregationKeyMismatch {
                left: self.key().to_string(),
                right: other.key().to_string(),
            });
        }

        self.qty = self
            .qty
            .checked_add(other.qty)
            .ok_or_else(|| ReconError::QuantityOverflow(self.key().to_string()))?;
        Ok(())
    }

    /// 檢查確認列是否對應此失敗需求
    ///
    /// 依序比較 program → mark → wbs。
    pub fn matches_confirmation(&self, row: &ConfirmationRow) -> bool {
        self.program == row.program && self.mark == row.part_name && self.wbs == row.part_wbs
    }

    /// 連結確認列，進入可分配狀態
    pub fn into_matched(self, confirmation: Rc<ConfirmationRow>) -> MatchedFailure {
        MatchedFailure {
            original_qty: self.qty,
            failure: self,
            confirmation,
            allocations: Vec::new(),
        }
    }
}

/// 已連結確認列的失敗需求
#[derive(Debug, Clone)]
pub struct MatchedFailure {
    failure: Failure,
    original_qty: u32,
    confirmation: Rc<ConfirmationRow>,
    allocations: Vec<Allocation>,
}

impl MatchedFailure {
    pub fn failure(&self) -> &Failure {
        &self.failure
    }

    pub fn mark(&self) -> &str {
        &self.failure.mark
    }

    pub fn wbs(&self) -> &str {
        &self.failure.wbs
    }

    pub fn program(&self) -> &str {
        &self.failure.program
    }

    /// 連結時的數量
    pub fn original_qty(&self) -> u32 {
        self.original_qty
    }

    /// 尚未分配的數量
    pub fn remaining_qty(&self) -> u32 {
        self.failure.qty
    }

    pub fn confirmation(&self) -> &ConfirmationRow {
        &self.confirmation
    }

    /// 已分配記錄（依分配順序）
    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    /// 已分配總量
    pub fn allocated_qty(&self) -> u32 {
        self.allocations.iter().map(|a| a.quantity).sum()
    }

    pub fn is_fulfilled(&self) -> bool {
        self.failure.qty == 0
    }

    /// 數量守恆：原始數量 = 剩餘 + 已分配
    pub fn is_conserved(&self) -> bool {
        u64::from(self.original_qty)
            == u64::from(self.failure.qty)
                + self.allocations.iter().map(|a| u64::from(a.quantity)).sum::<u64>()
    }

    /// 以一筆計劃訂單的可用數量消耗本需求
    ///
    /// 回傳計劃訂單剩下的數量。已滿足的需求不再消耗任何數量。
    pub fn consume(&mut self, wbs_element: &str, available: u32, plant: &str) -> u32 {
        if self.failure.qty == 0 || available == 0 {
            return available;
        }

        let consumed = available.min(self.failure.qty);
        self.allocations
            .push(Allocation::new(wbs_element.to_string(), consumed, plant.to_string()));
        self.failure.qty -= consumed;

        available - consumed
    }
}
