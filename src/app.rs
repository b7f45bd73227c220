//! 命令列介面與執行流程

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use recon_calc::{ReconResult, Reconciler, WarningSeverity};
use recon_core::{ReconConfig, RunMode, SourceLimit};
use recon_io::{
    confirmation_sources, new_production_file, read_inbox, PlannedOrderFile, ReportWriter,
};

/// 收件匣失敗訊息對帳工具
#[derive(Parser, Debug, Clone)]
#[command(name = "inbox-recon", version, about)]
pub struct Cli {
    /// 收件匣匯出檔
    #[arg(long, default_value = "inbox.txt")]
    pub inbox: PathBuf,

    /// 確認檔資料夾
    #[arg(long, env = "INBOX_RECON_CONFIRMATIONS")]
    pub confirmations: Option<PathBuf>,

    /// 計劃訂單檔（.csv / .tsv / .txt / .xlsx）
    #[arg(long)]
    pub planned_orders: Option<PathBuf>,

    /// 報表與修正檔輸出資料夾
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// 最多掃描的確認檔數（預設 200）
    #[arg(short, long)]
    pub max: Option<usize>,

    /// 掃描全部確認檔
    #[arg(short, long)]
    pub all: bool,

    /// 修正檔檔名（預設 Production_<時間戳>.ready）
    #[arg(short, long)]
    pub name: Option<String>,

    /// 只輸出零件清單
    #[arg(short, long)]
    pub parts: bool,

    /// JSON 配置檔（命令列參數優先）
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 顯示除錯日誌
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// 合併配置檔與命令列參數
    pub fn resolve_config(&self) -> Result<ReconConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("無法讀取配置檔 {}", path.display()))?;
                ReconConfig::from_json_str(&json)
                    .with_context(|| format!("配置檔格式錯誤 {}", path.display()))?
            }
            None => ReconConfig::default(),
        };

        if self.parts {
            config.mode = RunMode::PartsOnly;
        }
        if self.all {
            config.source_limit = SourceLimit::Unbounded;
        } else if let Some(max) = self.max {
            config.source_limit = SourceLimit::Bounded(max);
        }

        config.validate()?;
        Ok(config)
    }
}

/// 執行結果與寫出的檔案
#[derive(Debug)]
pub struct RunReport {
    pub result: ReconResult,
    /// 修正檔路徑；略過分配時為 `None`
    pub correction_file: Option<PathBuf>,
    /// 所有寫出的檔案
    pub written: Vec<PathBuf>,
}

/// 執行一次對帳並寫出報表
pub fn run(cli: &Cli) -> Result<RunReport> {
    let config = cli.resolve_config()?;
    let reconciler = Reconciler::new(config)?;
    let config = reconciler.config();

    let inbox = read_inbox(&cli.inbox)
        .with_context(|| format!("無法讀取收件匣 {}", cli.inbox.display()))?;

    let sources = match config.mode {
        RunMode::PartsOnly => Vec::new(),
        RunMode::Full => {
            let Some(dir) = cli.confirmations.as_deref() else {
                bail!("完整對帳需要指定確認檔資料夾 (--confirmations)");
            };
            confirmation_sources(dir)
                .with_context(|| format!("無法搜尋確認檔 {}", dir.display()))?
        }
    };

    let mut planned_orders = PlannedOrderFile::new(cli.planned_orders.clone());
    let result = reconciler
        .run(inbox, sources, &mut planned_orders)
        .context("對帳中止")?;

    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("無法建立輸出資料夾 {}", cli.output_dir.display()))?;
    let writer = ReportWriter::new(&cli.output_dir, config.delimiter_byte());

    let mut written = Vec::new();
    let mut correction_file = None;

    match config.mode {
        RunMode::PartsOnly => {
            written.push(writer.write_parts(&result.parts)?);
        }
        RunMode::Full => {
            written.push(writer.write_unmatched(&result.unmatched)?);

            if let Some(allocation) = &result.allocation {
                let file_name = cli.name.clone().unwrap_or_else(new_production_file);
                let path = writer.write_corrections(&allocation.corrections, &file_name)?;
                correction_file = Some(path.clone());
                written.push(path);
                written.push(writer.write_unfulfilled(&allocation.unfulfilled)?);
            }
        }
    }

    Ok(RunReport {
        result,
        correction_file,
        written,
    })
}

/// 輸出執行摘要
pub fn log_summary(report: &RunReport) {
    let result = &report.result;
    let stats = &result.stats;

    tracing::info!(
        "run {}: 階段 {:?}，收件匣 {} 筆（略過 {}），彙總 {} 筆",
        result.run_id,
        result.completed,
        stats.inbox_parsed,
        stats.inbox_rejected,
        stats.aggregated
    );

    if result.mode == RunMode::Full {
        tracing::info!(
            "比對 {} 筆，未比對 {} 筆；修正檔 {} 列，未滿足 {} 筆",
            stats.matched,
            stats.unmatched,
            stats.correction_rows,
            stats.unfulfilled
        );
    }

    let errors = result
        .warnings
        .iter()
        .filter(|w| w.severity == WarningSeverity::Error)
        .count();
    if errors > 0 {
        tracing::warn!("共 {} 個錯誤警告，請檢查日誌", errors);
    }

    for path in &report.written {
        tracing::info!("寫出 {}", path.display());
    }
    if let Some(ms) = result.calculation_time_ms {
        tracing::info!("耗時 {} ms", ms);
    }
}
