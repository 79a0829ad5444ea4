//! File System Session Repository Implementation
//!
//! SessionRepositoryのファイルシステム実装（セッションIDごとのディレクトリ）

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::domain::entities::session::SessionContext;
use crate::domain::repositories::session_repository::SessionRepository;

/// ファイルシステムベースのセッションリポジトリ
pub struct FsSessionRepository {
    base_dir: PathBuf,
}

impl FsSessionRepository {
    /// 新しいリポジトリを作成
    ///
    /// # Arguments
    ///
    /// * `base_dir` - 全セッションのディレクトリを置くベースディレクトリ
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// セッションを開く（同期処理）
    fn open_sync(base_dir: &Path, session_id: &str) -> Result<SessionContext> {
        let mut session = SessionContext::new(base_dir, session_id)?;

        if session.root_dir.exists() {
            if let Ok(modified) = fs::metadata(&session.root_dir).and_then(|m| m.modified()) {
                session.created_at = DateTime::<Utc>::from(modified);
            }
            info!("Reopened session {}", session.session_id);
        } else {
            info!("Created session {}", session.session_id);
        }

        fs::create_dir_all(session.files_dir()).context(format!(
            "Failed to create session directory: {}",
            session.files_dir().display()
        ))?;

        Ok(session)
    }

    /// `/` 区切りの相対パスをディレクトリ配下のパスに解決する
    ///
    /// 絶対パスや `..` を含むパスは拒否する
    fn resolve(dir: &Path, relative: &str) -> Result<PathBuf> {
        let relative_path = Path::new(relative);
        let safe = !relative.is_empty()
            && relative_path
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            bail!("Invalid relative path: {:?}", relative);
        }
        Ok(dir.join(relative_path))
    }

    fn write_sync(path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(path, bytes).context(format!("Failed to write file: {}", path.display()))
    }

    fn remove_dir_sync(path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_dir_all(path)
                .context(format!("Failed to remove directory: {}", path.display()))?;
        }
        Ok(())
    }

    fn remove_file_sync(path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path).context(format!("Failed to remove file: {}", path.display()))?;
        }
        Ok(())
    }

    /// 前回の成果物を削除する（同期処理）
    fn clear_sync(session: &SessionContext) -> Result<()> {
        Self::remove_dir_sync(&session.files_dir())?;
        Self::remove_file_sync(&session.archive_path())?;
        Self::remove_file_sync(&session.manifest_path())?;
        Self::remove_file_sync(&session.ledger_path())?;
        fs::create_dir_all(session.files_dir()).context("Failed to recreate files directory")?;
        Ok(())
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to spawn blocking task: {}", e))?
}

#[async_trait]
impl SessionRepository for FsSessionRepository {
    async fn open(&self, session_id: &str) -> Result<SessionContext> {
        let base_dir = self.base_dir.clone();
        let session_id = session_id.to_string();
        run_blocking(move || Self::open_sync(&base_dir, &session_id)).await
    }

    async fn clear_artifacts(&self, session: &SessionContext) -> Result<()> {
        let session = session.clone();
        run_blocking(move || Self::clear_sync(&session)).await
    }

    async fn write_artifact(
        &self,
        session: &SessionContext,
        relative_path: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let path = Self::resolve(&session.files_dir(), relative_path)?;
        run_blocking(move || Self::write_sync(&path, &bytes)).await
    }

    async fn remove_artifact_dir(
        &self,
        session: &SessionContext,
        relative_dir: &str,
    ) -> Result<()> {
        let path = Self::resolve(&session.files_dir(), relative_dir)?;
        run_blocking(move || Self::remove_dir_sync(&path)).await
    }

    async fn write_output(
        &self,
        session: &SessionContext,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let path = Self::resolve(&session.root_dir, file_name)?;
        run_blocking(move || Self::write_sync(&path, &bytes)).await
    }

    async fn reset(&self, session: &SessionContext) -> Result<()> {
        let root = session.root_dir.clone();
        run_blocking(move || Self::remove_dir_sync(&root)).await?;
        info!("Reset session {}", session.session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::session::{ARCHIVE_FILE, LEDGER_FILE};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_files_dir() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FsSessionRepository::new(temp_dir.path().to_path_buf());

        let session = repo.open("session-1").await.unwrap();

        assert_eq!(session.session_id, "session-1");
        assert!(session.files_dir().is_dir());
        assert_eq!(session.root_dir, temp_dir.path().join("session-1"));
    }

    #[tokio::test]
    async fn test_open_rejects_unsafe_id() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FsSessionRepository::new(temp_dir.path().to_path_buf());

        assert!(repo.open("../escape").await.is_err());
    }

    #[tokio::test]
    async fn test_write_artifact_creates_subfolders() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FsSessionRepository::new(temp_dir.path().to_path_buf());
        let session = repo.open("s").await.unwrap();

        repo.write_artifact(&session, "mixed_sets/B2/200.jpg", vec![1, 2, 3])
            .await
            .unwrap();

        let written = fs::read(session.files_dir().join("mixed_sets/B2/200.jpg")).unwrap();
        assert_eq!(written, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_write_artifact_rejects_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FsSessionRepository::new(temp_dir.path().to_path_buf());
        let session = repo.open("s").await.unwrap();

        assert!(repo
            .write_artifact(&session, "../outside.jpg", vec![0])
            .await
            .is_err());
        assert!(repo
            .write_artifact(&session, "/etc/passwd", vec![0])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_remove_artifact_dir_missing_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FsSessionRepository::new(temp_dir.path().to_path_buf());
        let session = repo.open("s").await.unwrap();

        assert!(repo.remove_artifact_dir(&session, "mixed_sets").await.is_ok());

        repo.write_artifact(&session, "mixed_sets/B1/1.jpg", vec![0])
            .await
            .unwrap();
        repo.remove_artifact_dir(&session, "mixed_sets").await.unwrap();
        assert!(!session.files_dir().join("mixed_sets").exists());
    }

    #[tokio::test]
    async fn test_clear_artifacts_removes_previous_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FsSessionRepository::new(temp_dir.path().to_path_buf());
        let session = repo.open("s").await.unwrap();

        repo.write_artifact(&session, "bundle of 2/B1-h1.jpg", vec![0])
            .await
            .unwrap();
        repo.write_output(&session, ARCHIVE_FILE, vec![0]).await.unwrap();
        repo.write_output(&session, LEDGER_FILE, vec![0]).await.unwrap();

        repo.clear_artifacts(&session).await.unwrap();

        assert!(session.files_dir().is_dir());
        assert_eq!(fs::read_dir(session.files_dir()).unwrap().count(), 0);
        assert!(!session.archive_path().exists());
        assert!(!session.ledger_path().exists());
    }

    #[tokio::test]
    async fn test_reset_removes_everything() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FsSessionRepository::new(temp_dir.path().to_path_buf());
        let session = repo.open("s").await.unwrap();
        repo.write_artifact(&session, "products/1.jpg", vec![0])
            .await
            .unwrap();
        repo.write_output(&session, ARCHIVE_FILE, vec![0]).await.unwrap();

        repo.reset(&session).await.unwrap();

        assert!(!session.root_dir.exists());
        // Reset twice is harmless
        assert!(repo.reset(&session).await.is_ok());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FsSessionRepository::new(temp_dir.path().to_path_buf());
        let a = repo.open("a").await.unwrap();
        let b = repo.open("b").await.unwrap();

        repo.write_artifact(&a, "x.jpg", vec![1]).await.unwrap();
        repo.reset(&b).await.unwrap();

        assert!(a.files_dir().join("x.jpg").exists());
    }
}
