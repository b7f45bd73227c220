//! 外部來源介面
//!
//! 核心只透過這兩個 trait 取得確認檔與計劃訂單，不關心資料從哪裡來。

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::{PlannedOrderCandidate, ReconError, Result};

/// 確認檔來源
pub trait ConfirmationSource {
    /// 來源名稱（用於日誌）
    fn name(&self) -> &str;

    /// 逐行讀取原始資料列；只有在比對器真正掃描到此來源時才會呼叫
    fn lines(&mut self) -> Result<Box<dyn Iterator<Item = Result<String>> + '_>>;
}

/// 計劃訂單來源
pub trait PlannedOrderSource {
    /// 取得全部候選（依來源順序）
    ///
    /// 來源不存在或表頭不完整時回傳 [`ReconError::MissingSource`] /
    /// [`ReconError::MissingColumns`]，呼叫端應略過分配階段。
    fn fetch_planned_orders(&mut self) -> Result<Vec<PlannedOrderCandidate>>;

    /// 取走讀取時被略過的錯誤列
    fn take_rejected(&mut self) -> Vec<ReconError> {
        Vec::new()
    }
}

impl PlannedOrderSource for Vec<PlannedOrderCandidate> {
    fn fetch_planned_orders(&mut self) -> Result<Vec<PlannedOrderCandidate>> {
        Ok(self.clone())
    }
}

impl<S: PlannedOrderSource> PlannedOrderSource for Option<S> {
    fn fetch_planned_orders(&mut self) -> Result<Vec<PlannedOrderCandidate>> {
        match self {
            Some(source) => source.fetch_planned_orders(),
            None => Err(ReconError::MissingSource("未提供計劃訂單來源".to_string())),
        }
    }

    fn take_rejected(&mut self) -> Vec<ReconError> {
        self.as_mut().map(|s| s.take_rejected()).unwrap_or_default()
    }
}

/// 計劃訂單表頭欄位
pub const MATERIAL_COLUMN: &str = "Material Number";
pub const WBS_COLUMN: &str = "WBS Element";
pub const PLANT_COLUMN: &str = "Plant";
/// 數量欄位可接受的名稱（完全相符）
pub const QUANTITY_COLUMNS: [&str; 2] = ["Order quantity (GMEIN)", "Order quantity"];

/// 已解析的計劃訂單表頭（欄位索引）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedOrderColumns {
    pub material: usize,
    pub quantity: usize,
    pub wbs: usize,
    pub plant: usize,
}

impl PlannedOrderColumns {
    /// 依欄位名稱完全比對解析表頭
    pub fn resolve<S: AsRef<str>>(header: &[S]) -> Result<Self> {
        let find = |names: &[&str]| {
            header
                .iter()
                .position(|h| names.iter().any(|n| h.as_ref().trim() == *n))
        };

        let material = find(&[MATERIAL_COLUMN]);
        let quantity = find(&QUANTITY_COLUMNS);
        let wbs = find(&[WBS_COLUMN]);
        let plant = find(&[PLANT_COLUMN]);

        match (material, quantity, wbs, plant) {
            (Some(material), Some(quantity), Some(wbs), Some(plant)) => Ok(Self {
                material,
                quantity,
                wbs,
                plant,
            }),
            _ => {
                let mut missing = Vec::new();
                if material.is_none() {
                    missing.push(MATERIAL_COLUMN.to_string());
                }
                if quantity.is_none() {
                    missing.push(QUANTITY_COLUMNS[0].to_string());
                }
                if wbs.is_none() {
                    missing.push(WBS_COLUMN.to_string());
                }
                if plant.is_none() {
                    missing.push(PLANT_COLUMN.to_string());
                }
                Err(ReconError::MissingColumns(missing))
            }
        }
    }

    /// 解析一列資料
    ///
    /// 物料為空的列（表尾空白列）回傳 `Ok(None)`。
    pub fn parse_row<S: AsRef<str>>(
        &self,
        row_number: usize,
        row: &[S],
    ) -> Result<Option<PlannedOrderCandidate>> {
        let cell = |index: usize| row.get(index).map(|c| c.as_ref().trim()).unwrap_or("");

        let material = cell(self.material);
        if material.is_empty() {
            return Ok(None);
        }

        let quantity = parse_quantity(cell(self.quantity)).map_err(|message| {
            ReconError::PlannedOrderRow {
                row: row_number,
                message,
            }
        })?;

        Ok(Some(PlannedOrderCandidate::new(
            material.to_string(),
            cell(self.wbs).to_string(),
            quantity,
            cell(self.plant).to_string(),
        )))
    }
}

/// 解析數量（允許千分位與 `.000` 小數尾）
fn parse_quantity(raw: &str) -> std::result::Result<u32, String> {
    let cleaned = raw.replace(',', "");
    let value = Decimal::from_str(cleaned.trim())
        .map_err(|e| format!("數量無法解析 <{}>: {}", raw, e))?;

    if value.is_sign_negative() || !value.fract().is_zero() {
        return Err(format!("數量必須為非負整數 <{}>", raw));
    }

    value
        .to_u32()
        .ok_or_else(|| format!("數量超出範圍 <{}>", raw))
}

/// 已讀入記憶體的表格型計劃訂單來源
#[derive(Debug, Default)]
pub struct TabularPlannedOrders {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,

    /// 被略過的錯誤列
    pub rejected: Vec<ReconError>,
}

impl TabularPlannedOrders {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            header,
            rows,
            rejected: Vec::new(),
        }
    }
}

impl PlannedOrderSource for TabularPlannedOrders {
    fn fetch_planned_orders(&mut self) -> Result<Vec<PlannedOrderCandidate>> {
        let columns = PlannedOrderColumns::resolve(&self.header)?;

        let mut candidates = Vec::with_capacity(self.rows.len());
        for (index, row) in self.rows.iter().enumerate() {
            // 表頭為第 1 列
            match columns.parse_row(index + 2, row) {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => {}
                Err(e) => self.rejected.push(e),
            }
        }

        Ok(candidates)
    }

    fn take_rejected(&mut self) -> Vec<ReconError> {
        std::mem::take(&mut self.rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn header() -> Vec<String> {
        ["Order", "Material Number", "Order quantity (GMEIN)", "WBS Element", "Plant"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_resolve_header() {
        let columns = PlannedOrderColumns::resolve(&header()).unwrap();
        assert_eq!(
            columns,
            PlannedOrderColumns {
                material: 1,
                quantity: 2,
                wbs: 3,
                plant: 4
            }
        );
    }

    #[test]
    fn test_resolve_header_missing_columns() {
        let header = vec!["Material Number".to_string(), "Plant".to_string()];
        match PlannedOrderColumns::resolve(&header) {
            Err(ReconError::MissingColumns(missing)) => {
                assert_eq!(missing, vec!["Order quantity (GMEIN)".to_string(), "WBS Element".to_string()]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_header_requires_exact_names() {
        let header = vec![
            "Material".to_string(),
            "Order quantity".to_string(),
            "WBS Element".to_string(),
            "Plant".to_string(),
        ];
        let err = PlannedOrderColumns::resolve(&header).unwrap_err();
        assert!(err.is_missing_source());
    }

    #[rstest]
    #[case("60", Some(60))]
    #[case("1,200", Some(1200))]
    #[case("1,200.000", Some(1200))]
    #[case(" 7 ", Some(7))]
    #[case("2.5", None)]
    #[case("-3", None)]
    #[case("abc", None)]
    fn test_parse_quantity(#[case] raw: &str, #[case] expected: Option<u32>) {
        assert_eq!(parse_quantity(raw).ok(), expected);
    }

    #[test]
    fn test_tabular_source_skips_bad_rows() {
        let rows = vec![
            vec!["1".into(), "M1".into(), "30".into(), "A".into(), "P1".into()],
            vec!["2".into(), "M1".into(), "x".into(), "B".into(), "P2".into()],
            vec!["".into(), "".into(), "".into(), "".into(), "".into()],
            vec!["3".into(), "M2".into(), "40".into(), "C".into(), "P2".into()],
        ];
        let mut source = TabularPlannedOrders::new(header(), rows);

        let candidates = source.fetch_planned_orders().unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0], PlannedOrderCandidate::new("M1".into(), "A".into(), 30, "P1".into()));
        assert_eq!(candidates[1].part_id, "M2");
        assert_eq!(source.rejected.len(), 1);
        assert!(matches!(source.rejected[0], ReconError::PlannedOrderRow { row: 3, .. }));
    }

    #[test]
    fn test_missing_source() {
        let mut source: Option<Vec<PlannedOrderCandidate>> = None;
        assert!(source.fetch_planned_orders().unwrap_err().is_missing_source());
    }
}
