//! 確認檔搜尋與讀取

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use recon_core::{ConfirmationSource, ReconError};

use crate::error::{IoError, Result};
use crate::paths::production_timestamp;

/// 一個確認檔
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationFile {
    pub path: PathBuf,
    pub name: String,
    /// 檔名中的時間戳
    pub timestamp: NaiveDateTime,
}

/// 列出資料夾中的確認檔，由新到舊排列
///
/// 只收檔名為 `Production_<14 位時間戳>.ready` 或 `.outbound.archive` 的檔案，
/// 時間戳不是有效日期的檔案略過。
pub fn discover_confirmation_files(dir: &Path) -> Result<Vec<ConfirmationFile>> {
    if !dir.is_dir() {
        return Err(IoError::FileNotFound(dir.display().to_string()));
    }

    let mut files: Vec<ConfirmationFile> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            let timestamp = production_timestamp(&name)?;
            Some(ConfirmationFile {
                path: entry.path(),
                name,
                timestamp,
            })
        })
        .collect();

    // 同一時間戳時依檔名排序，確保順序穩定
    files.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.name.cmp(&b.name)));

    tracing::debug!("確認檔資料夾 {}: {} 個確認檔", dir.display(), files.len());
    Ok(files)
}

/// 以檔案為來源的確認資料
///
/// 比對器真正掃描到時才開檔。
#[derive(Debug, Clone)]
pub struct FileConfirmationSource {
    file: ConfirmationFile,
}

impl FileConfirmationSource {
    pub fn new(file: ConfirmationFile) -> Self {
        Self { file }
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }
}

impl From<ConfirmationFile> for FileConfirmationSource {
    fn from(file: ConfirmationFile) -> Self {
        Self::new(file)
    }
}

impl ConfirmationSource for FileConfirmationSource {
    fn name(&self) -> &str {
        &self.file.name
    }

    fn lines(&mut self) -> recon_core::Result<Box<dyn Iterator<Item = recon_core::Result<String>> + '_>> {
        let file = File::open(&self.file.path)?;
        let reader = BufReader::new(file);

        Ok(Box::new(reader.split(b'\n').map(|line| {
            line.map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .map_err(ReconError::from)
        })))
    }
}

/// 搜尋並包裝成比對器可用的來源（由新到舊）
pub fn confirmation_sources(dir: &Path) -> Result<Vec<FileConfirmationSource>> {
    Ok(discover_confirmation_files(dir)?
        .into_iter()
        .map(FileConfirmationSource::from)
        .collect())
}
