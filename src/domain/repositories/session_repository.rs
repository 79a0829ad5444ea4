//! # Session Repository Trait
//!
//! セッション単位の作業ディレクトリを抽象化

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::entities::session::SessionContext;

/// セッションリポジトリ
///
/// セッションIDごとに独立したディレクトリを管理する。
/// 作成と削除は明示的なAPI呼び出しでのみ行う。
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// セッションを開く（存在しなければ作成）
    async fn open(&self, session_id: &str) -> Result<SessionContext>;

    /// 前回の実行で生成された成果物・アーカイブ・CSVを削除する
    async fn clear_artifacts(&self, session: &SessionContext) -> Result<()>;

    /// 成果物を書き込む
    ///
    /// # Arguments
    ///
    /// * `relative_path` - ファイルディレクトリからの相対パス（`/` 区切り）
    /// * `bytes` - ファイルの内容
    async fn write_artifact(
        &self,
        session: &SessionContext,
        relative_path: &str,
        bytes: Vec<u8>,
    ) -> Result<()>;

    /// ファイルディレクトリ配下のフォルダを削除する（存在しなければ何もしない）
    async fn remove_artifact_dir(&self, session: &SessionContext, relative_dir: &str)
        -> Result<()>;

    /// セッションルート直下にファイル（アーカイブ、CSV）を書き込む
    async fn write_output(&self, session: &SessionContext, file_name: &str, bytes: Vec<u8>)
        -> Result<()>;

    /// セッションディレクトリを丸ごと削除する
    async fn reset(&self, session: &SessionContext) -> Result<()>;
}
