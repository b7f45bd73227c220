//! 計劃訂單候選與分配記錄

use serde::{Deserialize, Serialize};

/// 計劃訂單候選（外部來源，每次執行只讀取一次）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedOrderCandidate {
    /// 物料號碼（對應失敗需求的 mark）
    pub part_id: String,

    /// WBS 元素
    pub wbs_element: String,

    /// 可用數量（分配過程中遞減）
    pub quantity: u32,

    /// 工廠
    pub plant: String,
}

impl PlannedOrderCandidate {
    /// 創建新的候選
    pub fn new(part_id: String, wbs_element: String, quantity: u32, plant: String) -> Self {
        Self {
            part_id,
            wbs_element,
            quantity,
            plant,
        }
    }

    /// 是否已用完
    pub fn is_exhausted(&self) -> bool {
        self.quantity == 0
    }
}

/// 分配記錄 (WBS 元素, 數量, 工廠)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub wbs_element: String,
    pub quantity: u32,
    pub plant: String,
}

impl Allocation {
    pub fn new(wbs_element: String, quantity: u32, plant: String) -> Self {
        Self {
            wbs_element,
            quantity,
            plant,
        }
    }
}
