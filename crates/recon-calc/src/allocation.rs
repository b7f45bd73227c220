//! 計劃訂單數量分配

use std::collections::HashMap;

use recon_core::{MatchedFailure, PlannedOrderCandidate};

/// 分配統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationSummary {
    /// 處理的候選數
    pub candidates: usize,
    /// 產生的分配記錄數
    pub allocations: usize,
    /// 分配出去的總量
    pub allocated_qty: u64,
    /// 分配後候選剩餘的總量
    pub unconsumed_qty: u64,
    /// 找不到對應需求的候選數
    pub unmatched_candidates: usize,
}

/// 數量分配器
///
/// 貪婪、單次掃描：依候選的來源順序處理，每筆候選再依需求清單順序消耗，
/// 直到候選用完或需求滿足。不回溯，結果完全由兩個順序決定。
pub struct QuantityAllocator;

impl QuantityAllocator {
    /// 執行分配
    ///
    /// `candidates` 的順序即分配順序；同一零件的多筆需求依 `failures` 中的順序消耗。
    /// 呼叫後 `candidates` 的數量為未被消耗的剩餘量。
    pub fn allocate(
        candidates: &mut [PlannedOrderCandidate],
        failures: &mut [MatchedFailure],
    ) -> AllocationSummary {
        let mut summary = AllocationSummary {
            candidates: candidates.len(),
            ..Default::default()
        };

        // 依零件索引需求位置，保留原始順序
        let mut by_mark: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, failure) in failures.iter().enumerate() {
            by_mark
                .entry(failure.mark().to_string())
                .or_insert_with(Vec::new)
                .push(index);
        }

        for candidate in candidates.iter_mut() {
            let Some(indices) = by_mark.get(&candidate.part_id) else {
                summary.unmatched_candidates += 1;
                summary.unconsumed_qty += u64::from(candidate.quantity);
                continue;
            };

            for &index in indices {
                if candidate.is_exhausted() {
                    break;
                }

                let failure = &mut failures[index];
                let offered = candidate.quantity;
                candidate.quantity =
                    failure.consume(&candidate.wbs_element, offered, &candidate.plant);

                let consumed = offered - candidate.quantity;
                if consumed > 0 {
                    summary.allocations += 1;
                    summary.allocated_qty += u64::from(consumed);
                    tracing::debug!(
                        "分配 {} → {} ({}): {} 件，需求剩餘 {}",
                        candidate.wbs_element,
                        failure.mark(),
                        failure.program(),
                        consumed,
                        failure.remaining_qty()
                    );
                }
            }

            summary.unconsumed_qty += u64::from(candidate.quantity);
        }

        summary
    }
}
