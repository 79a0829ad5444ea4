//! # Package Session Use Case
//!
//! セッションのアーカイブとCSVレポートの作成

use anyhow::Result;
use log::info;
use std::sync::Arc;

use crate::application::dto::batch_report::PackagedSession;
use crate::domain::entities::ledger::ErrorLedger;
use crate::domain::entities::outcome::ProcessingOutcome;
use crate::domain::entities::session::{
    SessionContext, ARCHIVE_FILE, LEDGER_FILE, MANIFEST_FILE,
};
use crate::domain::error::PipelineError;
use crate::domain::repositories::archive_repository::ArchiveRepository;
use crate::domain::repositories::report_repository::ReportRepository;
use crate::domain::repositories::session_repository::SessionRepository;

/// セッションパッケージングユースケース
///
/// セッションのファイルディレクトリをアーカイブし、マニフェストと台帳を出力する。
/// 全ての出力はセッションルートにも書き込まれる。失敗は `PipelineError::Packaging`
/// として返されるため、同じセッションに対して単独で再実行できる。
pub struct PackageSessionUseCase<S, A, R>
where
    S: SessionRepository,
    A: ArchiveRepository,
    R: ReportRepository,
{
    session_repository: Arc<S>,
    archive_repository: Arc<A>,
    report_repository: Arc<R>,
}

impl<S, A, R> PackageSessionUseCase<S, A, R>
where
    S: SessionRepository,
    A: ArchiveRepository,
    R: ReportRepository,
{
    pub fn new(
        session_repository: Arc<S>,
        archive_repository: Arc<A>,
        report_repository: Arc<R>,
    ) -> Self {
        Self {
            session_repository,
            archive_repository,
            report_repository,
        }
    }

    /// アーカイブとレポートを作成する
    ///
    /// # Arguments
    ///
    /// * `session` - 対象セッション
    /// * `outcomes` - マニフェストに出力する処理結果（`None` ならマニフェストを作らない）
    /// * `ledger` - 欠落画像の台帳（空なら台帳CSVを作らない）
    ///
    /// # Errors
    ///
    /// アーカイブ・レポートの作成や書き込みに失敗した場合に `PipelineError::Packaging` を返す
    pub async fn execute(
        &self,
        session: &SessionContext,
        outcomes: Option<&[ProcessingOutcome]>,
        ledger: &ErrorLedger,
    ) -> Result<PackagedSession> {
        let archive_bytes = self
            .archive_repository
            .package(&session.files_dir())
            .await
            .map_err(packaging)?;
        self.write(session, ARCHIVE_FILE, &archive_bytes).await?;
        info!(
            "Packaged session {} ({} bytes)",
            session.session_id,
            archive_bytes.len()
        );

        let manifest_csv = match outcomes {
            Some(outcomes) => {
                let csv = self
                    .report_repository
                    .render_manifest(outcomes)
                    .map_err(packaging)?;
                self.write(session, MANIFEST_FILE, &csv).await?;
                Some(csv)
            }
            None => None,
        };

        let ledger_csv = if ledger.is_empty() {
            None
        } else {
            let csv = self.report_repository.render_ledger(ledger).map_err(packaging)?;
            self.write(session, LEDGER_FILE, &csv).await?;
            Some(csv)
        };

        Ok(PackagedSession {
            archive_bytes,
            archive_path: session.archive_path(),
            manifest_path: manifest_csv.as_ref().map(|_| session.manifest_path()),
            manifest_csv,
            ledger_path: ledger_csv.as_ref().map(|_| session.ledger_path()),
            ledger_csv,
        })
    }

    async fn write(&self, session: &SessionContext, file_name: &str, bytes: &[u8]) -> Result<()> {
        self.session_repository
            .write_output(session, file_name, bytes.to_vec())
            .await
            .map_err(packaging)?;
        Ok(())
    }
}

fn packaging(err: anyhow::Error) -> PipelineError {
    PipelineError::Packaging(format!("{:#}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use crate::domain::entities::input_row::InputRow;

    #[derive(Default)]
    struct MockSessionRepository {
        outputs: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl SessionRepository for MockSessionRepository {
        async fn open(&self, session_id: &str) -> Result<SessionContext> {
            Ok(SessionContext::new(Path::new("/tmp/sessions"), session_id)?)
        }

        async fn clear_artifacts(&self, _session: &SessionContext) -> Result<()> {
            Ok(())
        }

        async fn write_artifact(
            &self,
            _session: &SessionContext,
            _relative_path: &str,
            _bytes: Vec<u8>,
        ) -> Result<()> {
            Ok(())
        }

        async fn remove_artifact_dir(
            &self,
            _session: &SessionContext,
            _relative_dir: &str,
        ) -> Result<()> {
            Ok(())
        }

        async fn write_output(
            &self,
            _session: &SessionContext,
            file_name: &str,
            bytes: Vec<u8>,
        ) -> Result<()> {
            self.outputs
                .lock()
                .unwrap()
                .insert(file_name.to_string(), bytes);
            Ok(())
        }

        async fn reset(&self, _session: &SessionContext) -> Result<()> {
            Ok(())
        }
    }

    struct MockArchiveRepository {
        should_succeed: bool,
    }

    #[async_trait]
    impl ArchiveRepository for MockArchiveRepository {
        async fn package(&self, source_dir: &Path) -> Result<Vec<u8>> {
            if self.should_succeed {
                Ok(source_dir.to_string_lossy().as_bytes().to_vec())
            } else {
                anyhow::bail!("disk full")
            }
        }
    }

    struct MockReportRepository;

    impl ReportRepository for MockReportRepository {
        fn render_manifest(&self, outcomes: &[ProcessingOutcome]) -> Result<Vec<u8>> {
            Ok(format!("manifest:{}", outcomes.len()).into_bytes())
        }

        fn render_ledger(&self, ledger: &ErrorLedger) -> Result<Vec<u8>> {
            Ok(format!("ledger:{}", ledger.len()).into_bytes())
        }
    }

    fn use_case(
        should_succeed: bool,
    ) -> (
        Arc<MockSessionRepository>,
        PackageSessionUseCase<MockSessionRepository, MockArchiveRepository, MockReportRepository>,
    ) {
        let sessions = Arc::new(MockSessionRepository::default());
        let uc = PackageSessionUseCase::new(
            sessions.clone(),
            Arc::new(MockArchiveRepository { should_succeed }),
            Arc::new(MockReportRepository),
        );
        (sessions, uc)
    }

    fn session() -> SessionContext {
        SessionContext::new(Path::new("/tmp/sessions"), "s1").unwrap()
    }

    #[tokio::test]
    async fn test_package_with_manifest_and_ledger() {
        let (sessions, uc) = use_case(true);
        let outcomes = vec![ProcessingOutcome::for_row(&InputRow::parse("B1", "100").unwrap())];
        let mut ledger = ErrorLedger::new();
        ledger.record("B1", "100");

        let packaged = uc
            .execute(&session(), Some(outcomes.as_slice()), &ledger)
            .await
            .unwrap();

        assert_eq!(
            packaged.archive_bytes,
            PathBuf::from("/tmp/sessions/s1/files")
                .to_string_lossy()
                .as_bytes()
        );
        assert_eq!(packaged.manifest_csv.as_deref(), Some(&b"manifest:1"[..]));
        assert_eq!(packaged.ledger_csv.as_deref(), Some(&b"ledger:1"[..]));
        assert_eq!(packaged.ledger_path, Some(session().ledger_path()));

        let outputs = sessions.outputs.lock().unwrap();
        assert_eq!(outputs.len(), 3);
        assert!(outputs.contains_key(ARCHIVE_FILE));
        assert!(outputs.contains_key(MANIFEST_FILE));
        assert!(outputs.contains_key(LEDGER_FILE));
    }

    #[tokio::test]
    async fn test_package_without_manifest_or_failures() {
        let (sessions, uc) = use_case(true);

        let packaged = uc.execute(&session(), None, &ErrorLedger::new()).await.unwrap();

        assert!(packaged.manifest_csv.is_none());
        assert!(packaged.manifest_path.is_none());
        assert!(packaged.ledger_csv.is_none());
        assert_eq!(sessions.outputs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_package_failure_is_packaging_error() {
        let (_, uc) = use_case(false);

        let err = uc
            .execute(&session(), None, &ErrorLedger::new())
            .await
            .unwrap_err();

        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::Packaging(message)) => assert!(message.contains("disk full")),
            other => panic!("expected packaging error, got {:?}", other),
        }
    }
}
