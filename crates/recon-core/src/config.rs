//! 對帳配置模型

use serde::{Deserialize, Serialize};

use crate::{ReconError, Result};

/// 預設掃描的確認檔數量
pub const DEFAULT_SOURCE_LIMIT: usize = 200;

/// 對帳執行配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    /// 確認檔掃描上限（由新到舊）
    pub source_limit: SourceLimit,

    /// 執行模式
    pub mode: RunMode,

    /// 零件儲位標記（修正檔固定欄位）
    pub part_location: String,

    /// 零件單位
    pub part_uom: String,

    /// 材料單位
    pub material_uom: String,

    /// 材料用量小數位數
    pub material_precision: u32,

    /// 確認檔與修正檔的欄位分隔字元
    pub field_delimiter: char,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            source_limit: SourceLimit::Bounded(DEFAULT_SOURCE_LIMIT),
            mode: RunMode::Full,
            part_location: "PROD".to_string(),
            part_uom: "EA".to_string(),
            material_uom: "IN2".to_string(),
            material_precision: 3,
            field_delimiter: '\t',
        }
    }
}

impl ReconConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 從 JSON 讀取配置（缺少的欄位使用預設值）
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ReconError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 建構器模式：設置掃描上限
    pub fn with_source_limit(mut self, limit: SourceLimit) -> Self {
        self.source_limit = limit;
        self
    }

    /// 建構器模式：設置執行模式
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// 建構器模式：設置材料用量小數位數
    pub fn with_material_precision(mut self, precision: u32) -> Self {
        self.material_precision = precision;
        self
    }

    /// 建構器模式：設置欄位分隔字元
    pub fn with_field_delimiter(mut self, delimiter: char) -> Self {
        self.field_delimiter = delimiter;
        self
    }

    /// 檢查配置是否合理
    pub fn validate(&self) -> Result<()> {
        if let SourceLimit::Bounded(0) = self.source_limit {
            return Err(ReconError::Config("確認檔掃描上限必須大於 0".to_string()));
        }

        // rust_decimal 最多 28 位小數，實務上超過 10 位沒有意義
        if self.material_precision > 10 {
            return Err(ReconError::Config(format!(
                "材料用量小數位數過大: {}",
                self.material_precision
            )));
        }

        if !self.field_delimiter.is_ascii() {
            return Err(ReconError::Config(format!(
                "欄位分隔字元必須為 ASCII: {:?}",
                self.field_delimiter
            )));
        }

        Ok(())
    }

    /// 欄位分隔字元（位元組）
    pub fn delimiter_byte(&self) -> u8 {
        // validate() 保證為 ASCII
        self.field_delimiter as u8
    }
}

/// 確認檔掃描上限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceLimit {
    /// 最多掃描 n 個來源
    Bounded(usize),
    /// 掃描全部來源
    Unbounded,
}

impl SourceLimit {
    /// 從總數中取得實際要掃描的數量
    pub fn apply(&self, available: usize) -> usize {
        match self {
            Self::Bounded(n) => available.min(*n),
            Self::Unbounded => available,
        }
    }
}

/// 執行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// 完整對帳：比對、分配並產生修正檔
    Full,
    /// 只輸出零件清單
    PartsOnly,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReconConfig::new();

        assert_eq!(config.source_limit, SourceLimit::Bounded(200));
        assert_eq!(config.mode, RunMode::Full);
        assert_eq!(config.part_location, "PROD");
        assert_eq!(config.material_uom, "IN2");
        assert_eq!(config.delimiter_byte(), b'\t');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ReconConfig::new()
            .with_source_limit(SourceLimit::Unbounded)
            .with_mode(RunMode::PartsOnly)
            .with_material_precision(2)
            .with_field_delimiter(',');

        assert_eq!(config.source_limit, SourceLimit::Unbounded);
        assert_eq!(config.mode, RunMode::PartsOnly);
        assert_eq!(config.material_precision, 2);
        assert_eq!(config.delimiter_byte(), b',');
    }

    #[test]
    fn test_source_limit_apply() {
        assert_eq!(SourceLimit::Bounded(3).apply(10), 3);
        assert_eq!(SourceLimit::Bounded(30).apply(10), 10);
        assert_eq!(SourceLimit::Unbounded.apply(10), 10);
    }

    #[test]
    fn test_from_json() {
        let config = ReconConfig::from_json_str(r#"{"source_limit": "unbounded", "material_uom": "LB"}"#)
            .unwrap();

        assert_eq!(config.source_limit, SourceLimit::Unbounded);
        assert_eq!(config.material_uom, "LB");
        // 未指定的欄位沿用預設
        assert_eq!(config.part_uom, "EA");

        let bounded = ReconConfig::from_json_str(r#"{"source_limit": {"bounded": 50}}"#).unwrap();
        assert_eq!(bounded.source_limit, SourceLimit::Bounded(50));
    }

    #[test]
    fn test_invalid_config() {
        assert!(ReconConfig::from_json_str(r#"{"source_limit": {"bounded": 0}}"#).is_err());
        assert!(ReconConfig::new().with_material_precision(12).validate().is_err());
        assert!(ReconConfig::from_json_str("not json").is_err());
    }
}
