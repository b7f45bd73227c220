//! 計劃訂單檔案讀取
//!
//! 依副檔名選擇格式：
//! - `.csv`：逗號分隔
//! - `.tsv`：Tab 分隔
//! - `.txt`：SAP 清單匯出（`|` 分隔、虛線分隔列）
//! - `.xlsx` / `.xls`：第一個工作表

use std::fs::File;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use recon_core::{PlannedOrderCandidate, PlannedOrderSource, ReconError, TabularPlannedOrders};

use crate::error::{IoError, Result};

/// 讀取計劃訂單檔為表格（表頭 + 資料列）
pub fn load_planned_orders(path: &Path) -> Result<TabularPlannedOrders> {
    if !path.exists() {
        return Err(IoError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let table = match ext.as_str() {
        "csv" => read_delimited(path, b',')?,
        "tsv" => read_delimited(path, b'\t')?,
        "txt" => read_list_export(path)?,
        "xlsx" | "xls" => read_workbook(path)?,
        _ => return Err(IoError::UnsupportedFormat(ext)),
    };

    tracing::debug!(
        "讀取計劃訂單 {}: {} 欄，{} 列",
        path.display(),
        table.header.len(),
        table.rows.len()
    );

    Ok(table)
}

fn read_delimited(path: &Path, delimiter: u8) -> Result<TabularPlannedOrders> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // 允許行長度不一致
        .delimiter(delimiter)
        .from_reader(file);

    let header: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|v| v.trim().to_string()).collect());
    }

    Ok(TabularPlannedOrders::new(header, rows))
}

fn read_list_export(path: &Path) -> Result<TabularPlannedOrders> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);

    let mut table_rows = text.lines().filter_map(list_export_row);
    let header = table_rows
        .next()
        .ok_or_else(|| IoError::EmptyTable(path.display().to_string()))?;
    let rows: Vec<Vec<String>> = table_rows.collect();

    Ok(TabularPlannedOrders::new(header, rows))
}

/// 解析清單匯出的一列；標題列、虛線列與空白列回傳 `None`
fn list_export_row(line: &str) -> Option<Vec<String>> {
    let line = line.trim();
    if !line.starts_with('|') {
        return None;
    }

    let inner = line.trim_start_matches('|').trim_end_matches('|');
    if inner.chars().all(|c| c == '-' || c == '|') {
        return None;
    }

    Some(inner.split('|').map(|cell| cell.trim().to_string()).collect())
}

fn read_workbook(path: &Path) -> Result<TabularPlannedOrders> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IoError::Excel("Excel 檔案無工作表".to_string()))?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());

    let header = rows
        .next()
        .ok_or_else(|| IoError::EmptyTable(path.display().to_string()))?;

    Ok(TabularPlannedOrders::new(header, rows.collect()))
}

/// 儲存格轉文字；整數值的浮點數不帶小數（`30.0` → `30`）
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        other => other.to_string().trim().to_string(),
    }
}

/// 以檔案為來源的計劃訂單
///
/// 分配階段才讀檔；未指定檔案或檔案不存在時回報來源不可用。
#[derive(Debug, Default)]
pub struct PlannedOrderFile {
    path: Option<PathBuf>,
    rejected: Vec<ReconError>,
}

impl PlannedOrderFile {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            rejected: Vec::new(),
        }
    }
}

impl PlannedOrderSource for PlannedOrderFile {
    fn fetch_planned_orders(&mut self) -> recon_core::Result<Vec<PlannedOrderCandidate>> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| ReconError::MissingSource("未指定計劃訂單檔".to_string()))?;

        let mut table = load_planned_orders(path)?;
        let candidates = table.fetch_planned_orders()?;
        self.rejected.extend(table.take_rejected());

        tracing::info!("計劃訂單 {}: {} 筆候選", path.display(), candidates.len());
        Ok(candidates)
    }

    fn take_rejected(&mut self) -> Vec<ReconError> {
        std::mem::take(&mut self.rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const LIST_EXPORT: &str = "\
Planned orders 2022-01-05
---------------------------------------------------------------
|Material Number|Order quantity (GMEIN)|WBS Element    |Plant|
|-------------------------------------------------------------|
|1200252B-M318A |                 1,030|D-1200252-20001|HS01 |
|1200252B-M318A |                 40.000|D-1200252-20002|HS02 |
---------------------------------------------------------------
";

    #[test]
    fn test_load_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        fs::write(
            &path,
            "Material Number,Order quantity,WBS Element,Plant\n1200252B-M318A,30,D-1200252-20001,HS01\n",
        )
        .unwrap();

        let mut table = load_planned_orders(&path).unwrap();
        let candidates = table.fetch_planned_orders().unwrap();

        assert_eq!(
            candidates,
            vec![PlannedOrderCandidate::new(
                "1200252B-M318A".to_string(),
                "D-1200252-20001".to_string(),
                30,
                "HS01".to_string(),
            )]
        );
    }

    #[test]
    fn test_load_tsv_with_bad_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.tsv");
        fs::write(
            &path,
            "Plant\tWBS Element\tMaterial Number\tOrder quantity (GMEIN)\n\
             HS01\tW1\tM1\t5\n\
             HS01\tW2\tM1\t2.5\n\
             \t\t\t\n",
        )
        .unwrap();

        let mut table = load_planned_orders(&path).unwrap();
        let candidates = table.fetch_planned_orders().unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].wbs_element, "W1");
        assert_eq!(table.take_rejected().len(), 1);
    }

    #[test]
    fn test_load_list_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cohv.txt");
        fs::write(&path, LIST_EXPORT).unwrap();

        let mut table = load_planned_orders(&path).unwrap();
        assert_eq!(table.header[0], "Material Number");

        let candidates = table.fetch_planned_orders().unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].quantity, 1030);
        assert_eq!(candidates[1].quantity, 40);
        assert_eq!(candidates[1].plant, "HS02");
    }

    #[test]
    fn test_load_workbook() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        let header = ["Plant", "Material Number", "Order quantity (GMEIN)", "WBS Element"];
        for (col, name) in header.iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        sheet.write_string(1, 0, "HS01").unwrap();
        sheet.write_string(1, 1, "1200252B-M318A").unwrap();
        sheet.write_number(1, 2, 30.0).unwrap();
        sheet.write_string(1, 3, "D-1200252-20001").unwrap();
        sheet.write_string(2, 0, "HS02").unwrap();
        sheet.write_string(2, 1, "1200252B-M318A").unwrap();
        sheet.write_number(2, 2, 1030.0).unwrap();
        sheet.write_string(2, 3, "D-1200252-20002").unwrap();
        sheet.write_string(3, 0, "HS01").unwrap();
        sheet.write_string(3, 1, "1200252B-M320A").unwrap();
        sheet.write_number(3, 2, 2.5).unwrap();
        sheet.write_string(3, 3, "D-1200252-20003").unwrap();
        workbook.save(&path).unwrap();

        let mut table = load_planned_orders(&path).unwrap();
        assert_eq!(table.header, header.map(String::from).to_vec());
        assert_eq!(table.rows[0][2], "30");

        let candidates = table.fetch_planned_orders().unwrap();
        assert_eq!(
            candidates,
            vec![
                PlannedOrderCandidate::new(
                    "1200252B-M318A".to_string(),
                    "D-1200252-20001".to_string(),
                    30,
                    "HS01".to_string(),
                ),
                PlannedOrderCandidate::new(
                    "1200252B-M318A".to_string(),
                    "D-1200252-20002".to_string(),
                    1030,
                    "HS02".to_string(),
                ),
            ]
        );
        // 2.5 不是整數數量
        assert_eq!(table.take_rejected().len(), 1);
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(30.0)), "30");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::String(" HS01 ".to_string())), "HS01");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn test_unsupported_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.json");
        fs::write(&path, "{}").unwrap();

        assert!(matches!(
            load_planned_orders(&path).unwrap_err(),
            IoError::UnsupportedFormat(_)
        ));
    }

    #[test]
    fn test_planned_order_file_missing() {
        let mut unset = PlannedOrderFile::new(None);
        assert!(unset.fetch_planned_orders().unwrap_err().is_missing_source());

        let dir = tempdir().unwrap();
        let mut missing = PlannedOrderFile::new(Some(dir.path().join("orders.csv")));
        assert!(missing.fetch_planned_orders().unwrap_err().is_missing_source());
    }

    #[test]
    fn test_planned_order_file_missing_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        fs::write(&path, "Material Number,Plant\nM1,HS01\n").unwrap();

        let mut source = PlannedOrderFile::new(Some(path));
        let err = source.fetch_planned_orders().unwrap_err();

        assert!(err.is_missing_source());
        assert!(matches!(err, ReconError::MissingColumns(_)));
    }
}
