//! 對帳主流程

use recon_core::{ConfirmationSource, PlannedOrderSource, ReconConfig, RunMode};

use crate::aggregation::FailureAggregator;
use crate::allocation::QuantityAllocator;
use crate::matching::ConfirmationMatcher;
use crate::output::OutputFormatter;
use crate::parsing::RecordParser;
use crate::{AllocationReport, ReconResult, ReconWarning, RunPhase};

/// 對帳器
pub struct Reconciler {
    config: ReconConfig,
    parser: RecordParser,
}

impl Reconciler {
    /// 創建對帳器（配置不合理時回傳錯誤）
    pub fn new(config: ReconConfig) -> recon_core::Result<Self> {
        config.validate()?;
        let parser = RecordParser::new(config.field_delimiter);
        Ok(Self { config, parser })
    }

    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    /// 主對帳入口
    ///
    /// 確認檔來源須由新到舊排列；計劃訂單來源只在分配階段讀取一次。
    /// 計劃訂單來源不可用時略過分配，結果的 `allocation` 為 `None`，
    /// 之前各階段的結果照常回傳。彙總數量溢位與材料用量溢位記為錯誤警告；
    /// 彙總鍵不一致屬程式錯誤，直接回傳錯誤。
    pub fn run<L, S, I, P>(
        &self,
        inbox_lines: L,
        sources: I,
        planned_orders: &mut P,
    ) -> recon_core::Result<ReconResult>
    where
        L: IntoIterator<Item = S>,
        S: AsRef<str>,
        I: IntoIterator,
        I::Item: ConfirmationSource,
        P: PlannedOrderSource + ?Sized,
    {
        let start_time = std::time::Instant::now();
        let mut result = ReconResult::empty(self.config.mode);

        tracing::info!("開始對帳 (run {}, 模式 {:?})", result.run_id, self.config.mode);

        // Step 1: 解析收件匣
        tracing::debug!("Step 1: 解析收件匣訊息");
        let (failures, errors) = self.parser.parse_failures(inbox_lines);
        result.stats.inbox_parsed = failures.len();
        result.stats.inbox_rejected = errors.len();
        for error in errors {
            result.add_warning(ReconWarning::warning("inbox".to_string(), error.to_string()));
        }
        tracing::info!(
            "收件匣訊息: 解析 {} 筆，略過 {} 筆",
            result.stats.inbox_parsed,
            result.stats.inbox_rejected
        );

        // Step 2: 彙總
        tracing::debug!("Step 2: 彙總失敗需求");
        let (aggregated, overflowed) = FailureAggregator::aggregate(failures)?;
        result.stats.aggregation_rejected = overflowed.len();
        for error in overflowed {
            result.add_warning(ReconWarning::error("aggregation".to_string(), error.to_string()));
        }
        result.parts = FailureAggregator::parts_list(&aggregated);
        result.stats.aggregated = aggregated.len();
        result.completed = RunPhase::Aggregated;

        if self.config.mode == RunMode::PartsOnly {
            result.aggregated = aggregated;
            result.calculation_time_ms = Some(start_time.elapsed().as_millis());
            tracing::info!("零件清單完成: {} 個零件", result.parts.len());
            return Ok(result);
        }

        // Step 3: 比對確認列
        tracing::debug!("Step 3: 比對確認列");
        result.aggregated = aggregated.clone();
        let matcher = ConfirmationMatcher::new(self.parser, self.config.source_limit);
        let outcome = matcher.run(sources, aggregated);

        result.stats.matching = outcome.stats;
        result.stats.matched = outcome.matched.len();
        result.stats.unmatched = outcome.unmatched.len();
        if outcome.stats.rows.normalization_fallbacks > 0 {
            tracing::debug!(
                "零件名稱保留原值 {} 次",
                outcome.stats.rows.normalization_fallbacks
            );
        }
        for failure in &outcome.unmatched {
            result.add_warning(ReconWarning::warning(
                failure.key().to_string(),
                "找不到確認列".to_string(),
            ));
        }
        result.unmatched = outcome.unmatched;
        let mut matched = outcome.matched;
        result.completed = RunPhase::Matched;

        tracing::info!(
            "確認列比對: 比對 {} 筆，未比對 {} 筆，掃描 {} 個確認檔",
            result.stats.matched,
            result.stats.unmatched,
            result.stats.matching.sources_scanned
        );

        // Step 4: 分配計劃訂單
        tracing::debug!("Step 4: 分配計劃訂單");
        let fetched = planned_orders.fetch_planned_orders();
        for rejected in planned_orders.take_rejected() {
            tracing::warn!("略過計劃訂單資料列: {}", rejected);
            result.stats.planned_orders_rejected += 1;
            result.add_warning(ReconWarning::warning(
                "planned-orders".to_string(),
                rejected.to_string(),
            ));
        }

        let mut candidates = match fetched {
            Ok(candidates) => candidates,
            Err(e) => {
                if e.is_missing_source() {
                    tracing::warn!("計劃訂單來源不可用，略過分配: {}", e);
                    result.add_warning(ReconWarning::warning(
                        "planned-orders".to_string(),
                        e.to_string(),
                    ));
                } else {
                    tracing::error!("讀取計劃訂單失敗，略過分配: {}", e);
                    result.add_warning(ReconWarning::error(
                        "planned-orders".to_string(),
                        e.to_string(),
                    ));
                }
                result.matched = matched;
                result.calculation_time_ms = Some(start_time.elapsed().as_millis());
                return Ok(result);
            }
        };

        result.stats.planned_orders = candidates.len();
        let summary = QuantityAllocator::allocate(&mut candidates, &mut matched);
        result.completed = RunPhase::Allocated;

        tracing::info!(
            "分配完成: 候選 {} 筆，分配 {} 筆，總量 {}",
            summary.candidates,
            summary.allocations,
            summary.allocated_qty
        );

        // Step 5: 輸出
        tracing::debug!("Step 5: 產生修正檔資料列");
        let formatter = OutputFormatter::new(&self.config);
        let (corrections, skipped) = formatter.corrections(&matched);
        result.stats.corrections_skipped = skipped.len();
        for error in skipped {
            result.add_warning(ReconWarning::error("corrections".to_string(), error.to_string()));
        }
        let unfulfilled = formatter.unfulfilled(&matched);

        result.stats.correction_rows = corrections.len();
        result.stats.unfulfilled = unfulfilled.len();
        for record in &unfulfilled {
            result.add_warning(ReconWarning::info(
                record.mark.clone(),
                format!("未滿足數量 {} (program {})", record.qty, record.program),
            ));
        }

        result.matched = matched;
        result.allocation = Some(AllocationReport {
            corrections,
            unfulfilled,
            summary,
        });
        result.completed = RunPhase::Reported;
        result.calculation_time_ms = Some(start_time.elapsed().as_millis());

        tracing::info!("對帳完成，耗時 {:?}", start_time.elapsed());
        tracing::info!(
            "修正檔列數: {}，未滿足需求: {}",
            result.stats.correction_rows,
            result.stats.unfulfilled
        );

        Ok(result)
    }
}
