//! 失敗需求彙總

use recon_core::{Failure, ReconError};

/// 失敗需求彙總器
pub struct FailureAggregator;

impl FailureAggregator {
    /// 依 (mark, program) 彙總失敗需求
    ///
    /// 先以 (mark, program, wbs) 穩定排序，再合併相鄰的同鍵項目；
    /// 數量相加，識別欄位沿用每組第一筆。
    ///
    /// 合併後數量溢位的通知不併入，與錯誤一起回傳；彙總鍵不一致直接回傳錯誤。
    pub fn aggregate(
        mut failures: Vec<Failure>,
    ) -> recon_core::Result<(Vec<Failure>, Vec<ReconError>)> {
        let total = failures.len();
        failures.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let mut aggregated: Vec<Failure> = Vec::with_capacity(failures.len());
        let mut rejected = Vec::new();
        for failure in failures {
            if let Some(current) = aggregated.last_mut() {
                if current.same_unit(&failure) {
                    match current.try_merge(failure) {
                        Ok(()) => {}
                        Err(e @ ReconError::QuantityOverflow(_)) => {
                            tracing::warn!("略過收件匣訊息: {}", e);
                            rejected.push(e);
                        }
                        Err(e) => return Err(e),
                    }
                    continue;
                }
            }
            aggregated.push(failure);
        }

        tracing::debug!("彙總失敗需求: {} 筆 → {} 筆", total, aggregated.len());

        Ok((aggregated, rejected))
    }

    /// 零件清單（排序、去重）
    pub fn parts_list(failures: &[Failure]) -> Vec<String> {
        let mut marks: Vec<String> = failures.iter().map(|f| f.mark.clone()).collect();
        marks.sort();
        marks.dedup();
        marks
    }
}
