//! 收件匣檔案

use std::path::Path;

use crate::error::{IoError, Result};

/// 讀取收件匣匯出檔，每行一則訊息
///
/// 非 UTF-8 位元組以替代字元處理，不中斷讀取。
pub fn read_inbox(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(IoError::FileNotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    let lines: Vec<String> = String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .collect();

    tracing::debug!("讀取收件匣 {}: {} 行", path.display(), lines.len());
    Ok(lines)
}
