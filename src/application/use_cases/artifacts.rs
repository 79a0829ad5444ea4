//! 成果物の保存と失敗の記録（バッチ処理とダウンロード処理で共通）

use log::warn;

use crate::domain::entities::ledger::ErrorLedger;
use crate::domain::entities::outcome::ProcessingOutcome;
use crate::domain::entities::session::SessionContext;
use crate::domain::repositories::session_repository::SessionRepository;

/// 行ごとの処理結果と台帳への記録
pub(super) struct RowRecorder<'a> {
    pub outcome: &'a mut ProcessingOutcome,
    pub ledger: &'a mut ErrorLedger,
}

impl RowRecorder<'_> {
    /// 商品コードを失敗として記録
    ///
    /// 同じ行で同じコードが既に失敗していれば台帳には追加しない。
    pub fn missing(&mut self, product_code: &str) {
        if self.outcome.failed_members.insert(product_code.to_string()) {
            self.ledger.record(&self.outcome.bundle_code, product_code);
        }
    }

    /// 成果物を保存し、成功すればパスを、失敗すれば台帳エントリを記録する
    pub async fn store<S: SessionRepository>(
        &mut self,
        sessions: &S,
        session: &SessionContext,
        relative_path: String,
        bytes: Vec<u8>,
        product_code: &str,
    ) {
        match sessions.write_artifact(session, &relative_path, bytes).await {
            Ok(()) => self.outcome.artifact_paths.push(relative_path),
            Err(e) => {
                warn!(
                    "Failed to write {} for {}: {:#}",
                    relative_path, self.outcome.bundle_code, e
                );
                self.missing(product_code);
            }
        }
    }
}
