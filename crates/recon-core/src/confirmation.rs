//! 確認列模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ReconError, Result};

/// 確認檔中的一筆生產確認
///
/// 解析後即不可變；材料欄位描述這批零件消耗的原料。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRow {
    /// 零件編號
    pub part_name: String,

    /// 工令（`S-{job}`）
    pub part_job: String,

    /// 零件 WBS 元素
    pub part_wbs: String,

    /// 零件數量（不為 0）
    pub part_qty: u32,

    /// 材料主檔
    pub material_master: String,

    /// 材料 WBS 元素
    pub material_wbs: String,

    /// 材料消耗量（整批零件）
    pub material_qty: Decimal,

    /// 材料儲位
    pub material_location: String,

    /// 工廠
    pub material_plant: String,

    /// 生產程式編號
    pub program: String,
}

impl ConfirmationRow {
    /// 創建新的確認列（材料欄位為空）
    pub fn new(
        part_name: String,
        part_job: String,
        part_wbs: String,
        part_qty: u32,
        program: String,
    ) -> Self {
        Self {
            part_name,
            part_job,
            part_wbs,
            part_qty,
            material_master: String::new(),
            material_wbs: String::new(),
            material_qty: Decimal::ZERO,
            material_location: String::new(),
            material_plant: String::new(),
            program,
        }
    }

    /// 建構器模式：設置材料欄位
    pub fn with_material(
        mut self,
        master: String,
        wbs: String,
        qty: Decimal,
        location: String,
        plant: String,
    ) -> Self {
        self.material_master = master;
        self.material_wbs = wbs;
        self.material_qty = qty;
        self.material_location = location;
        self.material_plant = plant;
        self
    }

    /// 每件零件的材料用量
    pub fn material_qty_per_unit(&self) -> Result<Decimal> {
        self.material_qty
            .checked_div(Decimal::from(self.part_qty))
            .ok_or_else(|| ReconError::ConfirmationParse {
                line: format!("{} / {}", self.part_name, self.program),
                reason: "零件數量為 0，無法計算單位用量".to_string(),
            })
    }

    /// 指定零件數量所對應的材料用量
    pub fn material_qty_for(&self, qty: u32) -> Result<Decimal> {
        self.material_qty_per_unit()?
            .checked_mul(Decimal::from(qty))
            .ok_or_else(|| ReconError::ConfirmationParse {
                line: format!("{} / {}", self.part_name, self.program),
                reason: format!("材料用量 {} × {} 超出範圍", self.material_qty, qty),
            })
    }
}
