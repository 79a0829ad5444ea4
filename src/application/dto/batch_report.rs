//! # Batch Report DTO
//!
//! バッチ処理とパッケージングの結果

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::entities::ledger::ErrorLedger;
use crate::domain::entities::outcome::ProcessingOutcome;

/// 行処理の結果（パッケージング前）
#[derive(Debug, Clone, Default)]
pub struct BatchRun {
    /// 入力順の処理結果
    pub outcomes: Vec<ProcessingOutcome>,
    /// 欠落画像の台帳
    pub ledger: ErrorLedger,
}

impl BatchRun {
    /// 全ての構成商品の画像を保存できた行の数
    pub fn complete_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_complete()).count()
    }
}

/// パッケージングに失敗したバッチ
///
/// 行処理の結果を保持しているため、取得をやり直さずにパッケージングだけを再実行できる。
#[derive(Debug, Error)]
#[error("{error:#}")]
pub struct PackagingFailed {
    pub run: BatchRun,
    /// `PipelineError::Packaging` を含むエラー
    pub error: anyhow::Error,
}

/// パッケージングの結果
#[derive(Debug, Clone)]
pub struct PackagedSession {
    pub archive_bytes: Vec<u8>,
    pub archive_path: PathBuf,
    /// バンドル処理の場合のみ
    pub manifest_csv: Option<Vec<u8>>,
    pub manifest_path: Option<PathBuf>,
    /// 失敗が1件以上ある場合のみ
    pub ledger_csv: Option<Vec<u8>>,
    pub ledger_path: Option<PathBuf>,
}

/// バッチ処理全体の結果
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outcomes: Vec<ProcessingOutcome>,
    pub ledger: ErrorLedger,
    pub package: PackagedSession,
}

impl BatchReport {
    pub fn new(run: BatchRun, package: PackagedSession) -> Self {
        Self {
            outcomes: run.outcomes,
            ledger: run.ledger,
            package,
        }
    }

    pub fn archive_bytes(&self) -> &[u8] {
        &self.package.archive_bytes
    }

    pub fn manifest_csv(&self) -> Option<&[u8]> {
        self.package.manifest_csv.as_deref()
    }

    pub fn ledger_csv(&self) -> Option<&[u8]> {
        self.package.ledger_csv.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::input_row::InputRow;

    #[test]
    fn test_packaging_failed_keeps_message() {
        let failed = PackagingFailed {
            run: BatchRun::default(),
            error: anyhow::anyhow!("disk full").context("Failed to package"),
        };

        assert_eq!(failed.to_string(), "Failed to package: disk full");
    }

    #[test]
    fn test_batch_run_complete_count() {
        let mut done = ProcessingOutcome::for_row(&InputRow::parse("B1", "100,100").unwrap());
        done.artifact_paths.push("bundle of 2/B1-h1.jpg".to_string());

        let mut failed = ProcessingOutcome::for_row(&InputRow::parse("B2", "200,300").unwrap());
        failed.artifact_paths.push("mixed_sets/B2/200.jpg".to_string());
        failed.failed_members.insert("300".to_string());

        let run = BatchRun {
            outcomes: vec![done, failed],
            ledger: ErrorLedger::new(),
        };

        assert_eq!(run.complete_count(), 1);
    }
}
