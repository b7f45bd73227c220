//! 確認列比對

use std::rc::Rc;

use recon_core::{ConfirmationSource, Failure, MatchedFailure, SourceLimit};

use crate::parsing::{ParseStats, RecordParser};

/// 比對統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// 實際讀取的來源數
    pub sources_scanned: usize,
    /// 讀取失敗的來源數
    pub sources_failed: usize,
    /// 確認列解析統計
    pub rows: ParseStats,
}

/// 比對結果
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// 找到確認列的需求（依比對先後）
    pub matched: Vec<MatchedFailure>,
    /// 掃描範圍內找不到確認列的需求
    pub unmatched: Vec<Failure>,
    pub stats: MatchStats,
}

/// 確認列比對器
pub struct ConfirmationMatcher {
    parser: RecordParser,
    limit: SourceLimit,
}

impl ConfirmationMatcher {
    /// 創建比對器
    pub fn new(parser: RecordParser, limit: SourceLimit) -> Self {
        Self { parser, limit }
    }

    /// 以確認檔來源比對失敗需求
    ///
    /// 來源須由新到舊排列，最多掃描 `limit` 個。每列確認資料只連結第一個
    /// (program, mark, wbs) 相符的需求，並把它移出待比對集合；
    /// 待比對集合清空後不再讀取後續來源。
    pub fn run<I>(&self, sources: I, failures: Vec<Failure>) -> MatchOutcome
    where
        I: IntoIterator,
        I::Item: ConfirmationSource,
    {
        let mut outstanding = failures;
        let mut matched = Vec::with_capacity(outstanding.len());
        let mut stats = MatchStats::default();

        for mut source in sources.into_iter().take(self.limit.apply(usize::MAX)) {
            if outstanding.is_empty() {
                tracing::debug!("所有需求皆已找到確認列，停止掃描");
                break;
            }

            stats.sources_scanned += 1;
            let before = matched.len();
            let name = source.name().to_string();

            let lines = match source.lines() {
                Ok(lines) => lines,
                Err(e) => {
                    tracing::warn!("無法讀取確認檔 {}: {}", name, e);
                    stats.sources_failed += 1;
                    continue;
                }
            };

            for line in lines {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!("讀取確認檔 {} 中斷: {}", name, e);
                        stats.sources_failed += 1;
                        break;
                    }
                };

                let row = match self.parser.parse_confirmation_with_stats(&line, &mut stats.rows) {
                    Ok(row) => row,
                    Err(e) => {
                        tracing::trace!("略過確認列: {}", e);
                        continue;
                    }
                };

                if let Some(index) = outstanding.iter().position(|f| f.matches_confirmation(&row)) {
                    let failure = outstanding.remove(index);
                    matched.push(failure.into_matched(Rc::new(row)));

                    if outstanding.is_empty() {
                        break;
                    }
                }
            }

            tracing::debug!(
                "確認檔 {}: 比對 {} 筆，剩餘 {} 筆",
                name,
                matched.len() - before,
                outstanding.len()
            );
        }

        for failure in &outstanding {
            tracing::warn!("找不到確認列: {}", failure.line);
        }

        MatchOutcome {
            matched,
            unmatched: outstanding,
            stats,
        }
    }
}
