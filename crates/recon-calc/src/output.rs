//! 修正檔與例外報表輸出

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use recon_core::{MatchedFailure, ReconConfig, ReconError, Result};

/// 修正檔資料列（13 欄，依序輸出，不含表頭）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionRow {
    pub part_name: String,
    pub part_job: String,
    pub wbs_element: String,
    pub part_location: String,
    pub quantity: u32,
    pub part_uom: String,
    pub material_master: String,
    pub material_wbs: String,
    /// 已依小數位數格式化的材料用量
    pub material_qty: String,
    pub material_uom: String,
    pub material_location: String,
    pub plant: String,
    pub program: String,
}

impl CorrectionRow {
    /// 依輸出順序排列的欄位
    pub fn fields(&self) -> [String; 13] {
        [
            self.part_name.clone(),
            self.part_job.clone(),
            self.wbs_element.clone(),
            self.part_location.clone(),
            self.quantity.to_string(),
            self.part_uom.clone(),
            self.material_master.clone(),
            self.material_wbs.clone(),
            self.material_qty.clone(),
            self.material_uom.clone(),
            self.material_location.clone(),
            self.plant.clone(),
            self.program.clone(),
        ]
    }
}

/// 未滿足數量報表資料列
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UnfulfilledRecord {
    pub mark: String,
    pub qty: u32,
    pub wbs: String,
    pub program: String,
}

/// 輸出格式化器
pub struct OutputFormatter<'a> {
    config: &'a ReconConfig,
}

impl<'a> OutputFormatter<'a> {
    pub fn new(config: &'a ReconConfig) -> Self {
        Self { config }
    }

    /// 產生修正檔資料列
    ///
    /// 需求依 (mark, program, wbs) 排序；同一需求的多筆分配維持分配順序。
    /// 材料用量無法計算的需求整筆略過，錯誤另行收集。
    pub fn corrections(
        &self,
        failures: &[MatchedFailure],
    ) -> (Vec<CorrectionRow>, Vec<ReconError>) {
        let mut rows = Vec::new();
        let mut errors = Vec::new();

        for failure in canonical_order(failures) {
            match self.failure_rows(failure) {
                Ok(failure_rows) => rows.extend(failure_rows),
                Err(e) => {
                    tracing::error!("略過 {} 的修正檔資料列: {}", failure.failure().key(), e);
                    errors.push(e);
                }
            }
        }

        (rows, errors)
    }

    fn failure_rows(&self, failure: &MatchedFailure) -> Result<Vec<CorrectionRow>> {
        let confirmation = failure.confirmation();
        let mut rows = Vec::with_capacity(failure.allocations().len());

        for allocation in failure.allocations() {
            let material_qty = confirmation.material_qty_for(allocation.quantity)?;

            rows.push(CorrectionRow {
                part_name: failure.mark().to_string(),
                part_job: confirmation.part_job.clone(),
                wbs_element: allocation.wbs_element.clone(),
                part_location: self.config.part_location.clone(),
                quantity: allocation.quantity,
                part_uom: self.config.part_uom.clone(),
                material_master: confirmation.material_master.clone(),
                material_wbs: confirmation.material_wbs.clone(),
                material_qty: format_material_qty(material_qty, self.config.material_precision),
                material_uom: self.config.material_uom.clone(),
                material_location: confirmation.material_location.clone(),
                plant: allocation.plant.clone(),
                program: failure.program().to_string(),
            });
        }

        Ok(rows)
    }

    /// 分配後仍有剩餘數量的需求
    pub fn unfulfilled(&self, failures: &[MatchedFailure]) -> Vec<UnfulfilledRecord> {
        canonical_order(failures)
            .into_iter()
            .filter(|f| !f.is_fulfilled())
            .map(|f| UnfulfilledRecord {
                mark: f.mark().to_string(),
                qty: f.remaining_qty(),
                wbs: f.wbs().to_string(),
                program: f.program().to_string(),
            })
            .collect()
    }
}

fn canonical_order(failures: &[MatchedFailure]) -> Vec<&MatchedFailure> {
    let mut ordered: Vec<&MatchedFailure> = failures.iter().collect();
    ordered.sort_by(|a, b| a.failure().sort_key().cmp(&b.failure().sort_key()));
    ordered
}

/// 材料用量格式化（四捨五入至固定小數位數並補零）
pub fn format_material_qty(value: Decimal, precision: u32) -> String {
    let rounded = value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", precision as usize, rounded)
}
