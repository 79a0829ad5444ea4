//! # Row Repository Trait
//!
//! 入力テーブルの読み込みを抽象化

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// 入力テーブル（検証前の生データ）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl RawTable {
    /// 列名の位置を探す（大文字小文字・前後の空白を無視）
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }
}

/// 行リポジトリ
///
/// 区切り文字付きテキストの読み込みを担当するリポジトリ
#[async_trait]
pub trait RowRepository: Send + Sync {
    /// 入力テーブルを読み込む
    ///
    /// # Arguments
    ///
    /// * `path` - 入力ファイルのパス
    ///
    /// # Errors
    ///
    /// ファイルの読み込みまたはパースに失敗した場合にエラーを返す
    async fn read_table(&self, path: &Path) -> Result<RawTable>;
}
