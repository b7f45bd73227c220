//! 修正檔與例外報表寫出

use std::fs;
use std::path::{Path, PathBuf};

use csv::{Terminator, WriterBuilder};
use recon_calc::{CorrectionRow, UnfulfilledRecord};
use recon_core::Failure;

use crate::error::Result;
use crate::paths::{PARTS_REPORT, UNFULFILLED_REPORT, UNMATCHED_REPORT};

/// 報表寫出器（所有檔案寫在同一個輸出資料夾）
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
    delimiter: u8,
}

impl ReportWriter {
    /// `delimiter` 為修正檔欄位分隔字元
    pub fn new(output_dir: impl Into<PathBuf>, delimiter: u8) -> Self {
        Self {
            output_dir: output_dir.into(),
            delimiter,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 零件清單：每行一個零件
    pub fn write_parts(&self, parts: &[String]) -> Result<PathBuf> {
        let path = self.output_dir.join(PARTS_REPORT);
        fs::write(&path, parts.join("\n"))?;

        tracing::info!("零件清單: {} ({} 個)", path.display(), parts.len());
        Ok(path)
    }

    /// 找不到確認列的收件匣原文
    pub fn write_unmatched(&self, unmatched: &[Failure]) -> Result<PathBuf> {
        let path = self.output_dir.join(UNMATCHED_REPORT);
        let mut content = String::new();
        for failure in unmatched {
            content.push_str(&failure.line);
            content.push('\n');
        }
        fs::write(&path, content)?;

        tracing::info!("未比對報表: {} ({} 筆)", path.display(), unmatched.len());
        Ok(path)
    }

    /// 未滿足數量報表（含 `Mark,Qty,Wbs,Program` 表頭）
    pub fn write_unfulfilled(&self, records: &[UnfulfilledRecord]) -> Result<PathBuf> {
        let path = self.output_dir.join(UNFULFILLED_REPORT);
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(b'\n'))
            .from_path(&path)?;

        writer.write_record(["Mark", "Qty", "Wbs", "Program"])?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        tracing::info!("未滿足數量報表: {} ({} 筆)", path.display(), records.len());
        Ok(path)
    }

    /// 修正檔（無表頭）
    pub fn write_corrections(&self, rows: &[CorrectionRow], file_name: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(file_name);
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .delimiter(self.delimiter)
            .terminator(Terminator::Any(b'\n'))
            .from_path(&path)?;

        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        tracing::info!("修正檔: {} ({} 列)", path.display(), rows.len());
        Ok(path)
    }
}
