//! # Report Repository Trait
//!
//! CSVレポートの生成を抽象化

use anyhow::Result;

use crate::domain::entities::ledger::ErrorLedger;
use crate::domain::entities::outcome::ProcessingOutcome;

/// レポートリポジトリ
pub trait ReportRepository: Send + Sync {
    /// バンドルのマニフェスト（入力行と同じ順序で1行ずつ）
    fn render_manifest(&self, outcomes: &[ProcessingOutcome]) -> Result<Vec<u8>>;

    /// 欠落画像の台帳（バンドルごとに1行）
    fn render_ledger(&self, ledger: &ErrorLedger) -> Result<Vec<u8>>;
}
