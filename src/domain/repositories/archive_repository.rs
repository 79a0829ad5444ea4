//! # Archive Repository Trait
//!
//! ディレクトリのアーカイブ化を抽象化

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// アーカイブリポジトリ
#[async_trait]
pub trait ArchiveRepository: Send + Sync {
    /// ディレクトリをアーカイブする
    ///
    /// アーカイブのルートには固定名のフォルダが1つだけ含まれ、
    /// `source_dir` 配下の相対パスはそのフォルダの下に保持される。
    ///
    /// # Errors
    ///
    /// 一時領域へのコピーまたはアーカイブの作成に失敗した場合にエラーを返す
    async fn package(&self, source_dir: &Path) -> Result<Vec<u8>>;
}
