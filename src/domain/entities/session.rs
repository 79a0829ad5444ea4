//! # SessionContext Entity
//!
//! 1セッション分の作業領域

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::domain::error::PipelineError;

/// 成果物を格納するサブディレクトリ名
pub const FILES_DIR: &str = "files";
/// アーカイブのファイル名
pub const ARCHIVE_FILE: &str = "images.zip";
/// マニフェストCSVのファイル名
pub const MANIFEST_FILE: &str = "bundle_manifest.csv";
/// 欠落画像台帳CSVのファイル名
pub const LEDGER_FILE: &str = "missing_images.csv";

/// セッションコンテキスト
///
/// 1回の処理で生成される全ての成果物を所有する。
/// 同じセッションIDに対する同時実行は呼び出し側で直列化すること。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub session_id: String,
    pub root_dir: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl SessionContext {
    /// ベースディレクトリ配下にセッションコンテキストを作成（ディレクトリは作らない）
    ///
    /// # Errors
    ///
    /// セッションIDがパスの1要素として安全でない場合に `PipelineError::Validation` を返す
    pub fn new(base_dir: &Path, session_id: &str) -> Result<Self, PipelineError> {
        validate_session_id(session_id)?;
        Ok(Self {
            session_id: session_id.to_string(),
            root_dir: base_dir.join(session_id),
            created_at: Utc::now(),
        })
    }

    pub fn files_dir(&self) -> PathBuf {
        self.root_dir.join(FILES_DIR)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.root_dir.join(ARCHIVE_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root_dir.join(MANIFEST_FILE)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root_dir.join(LEDGER_FILE)
    }
}

fn validate_session_id(session_id: &str) -> Result<(), PipelineError> {
    let valid = !session_id.is_empty()
        && session_id != "."
        && session_id != ".."
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');

    if valid {
        Ok(())
    } else {
        Err(PipelineError::Validation(format!(
            "invalid session id: {:?}",
            session_id
        )))
    }
}
