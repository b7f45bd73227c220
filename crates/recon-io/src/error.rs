//! 檔案讀寫錯誤類型

use recon_core::ReconError;
use thiserror::Error;

/// 檔案讀寫錯誤
#[derive(Error, Debug)]
pub enum IoError {
    #[error("檔案不存在: {0}")]
    FileNotFound(String),

    #[error("檔案格式不支援: {0}（僅支援 .csv/.tsv/.txt/.xlsx/.xls）")]
    UnsupportedFormat(String),

    #[error("Excel 解析失敗: {0}")]
    Excel(String),

    #[error("CSV 讀寫失敗: {0}")]
    Csv(#[from] csv::Error),

    #[error("表格沒有表頭列: {0}")]
    EmptyTable(String),

    #[error("I/O 錯誤: {0}")]
    Io(#[from] std::io::Error),
}

impl From<calamine::Error> for IoError {
    fn from(e: calamine::Error) -> Self {
        Self::Excel(e.to_string())
    }
}

impl From<IoError> for ReconError {
    fn from(e: IoError) -> Self {
        match e {
            IoError::FileNotFound(path) => ReconError::MissingSource(path),
            IoError::Io(e) => ReconError::Io(e),
            other => ReconError::SourceRead(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, IoError>;
