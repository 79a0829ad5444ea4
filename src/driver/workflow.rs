//! Workflow Orchestration
//!
//! ワークフローのオーケストレーション

use anyhow::Result;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::adapter::config::Config;
use crate::adapter::http::client::ReqwestImageClient;
use crate::adapter::repositories::csv_report_repository::CsvReportRepository;
use crate::adapter::repositories::csv_row_repository::CsvRowRepository;
use crate::adapter::repositories::fs_session_repository::FsSessionRepository;
use crate::adapter::repositories::vendor_image_repository::VendorImageRepository;
use crate::adapter::repositories::zip_archive_repository::ZipArchiveRepository;
use crate::application::dto::batch_report::{BatchReport, PackagingFailed};
use crate::application::dto::process_options::ProcessOptions;
use crate::application::use_cases::download_products::DownloadProductsUseCase;
use crate::application::use_cases::load_rows::LoadRowsUseCase;
use crate::application::use_cases::package_session::PackageSessionUseCase;
use crate::application::use_cases::process_bundles::ProcessBundlesUseCase;
use crate::domain::entities::fetch::FallbackMode;
use crate::domain::entities::input_row::InputRow;
use crate::domain::entities::session::SessionContext;
use crate::domain::error::PipelineError;
use crate::domain::repositories::image_repository::ImageRepository;
use crate::domain::repositories::session_repository::SessionRepository;

use super::cli::{Args, Flow};

type VendorImages = VendorImageRepository<ReqwestImageClient>;
type Packager =
    PackageSessionUseCase<FsSessionRepository, ZipArchiveRepository, CsvReportRepository>;

/// 進捗の割合を表示用のパーセントに変換
pub fn percent(fraction: f64) -> u32 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// セッションIDを決定（指定がなければ新しいUUID）
pub fn resolve_session_id(requested: Option<&str>) -> String {
    requested
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Bundle Image Workflow
pub struct BundleImageWorkflow {
    config: Config,
    load_use_case: LoadRowsUseCase<CsvRowRepository>,
    session_repository: Arc<FsSessionRepository>,
    packager: Packager,
}

impl BundleImageWorkflow {
    /// Create a new workflow instance with dependency injection
    pub fn new(config: Config) -> Self {
        let session_repo = Arc::new(FsSessionRepository::new(config.work_dir_path()));
        let load_use_case = LoadRowsUseCase::new(Arc::new(CsvRowRepository::new()));
        let packager = PackageSessionUseCase::new(
            session_repo.clone(),
            Arc::new(
                ZipArchiveRepository::new(config.archive_folder.clone())
                    .with_staging_parent(config.work_dir_path()),
            ),
            Arc::new(CsvReportRepository::new()),
        );

        Self {
            config,
            load_use_case,
            session_repository: session_repo,
            packager,
        }
    }

    /// Execute the selected flow
    pub async fn execute(&self, args: Args) -> Result<()> {
        info!("Starting imgbundle...");
        info!("Flow: {:?}, dry run: {}", args.flow, args.dry_run);

        if args.reset {
            return self.reset(args.session.as_deref()).await;
        }

        let input = args
            .input
            .as_deref()
            .ok_or_else(|| PipelineError::Validation("--input is required".to_string()))?;

        let concurrency = args.concurrency.unwrap_or(self.config.concurrency_limit);
        let fallback_mode = args
            .fallback
            .to_mode(&self.config.single_locale_tag, &self.config.locale_pair_tags);
        let options = ProcessOptions::new(args.layout, fallback_mode, self.config.jpeg_quality);

        println!("✓ Using configuration:");
        println!("  Base URL: {}", self.config.base_url);
        println!("  Layout: {}", options.layout);
        println!("  Fallback: {:?}", options.fallback_mode);
        println!("  Concurrency: {}", concurrency);

        let images = Arc::new(self.image_repository(concurrency)?);

        match args.flow {
            Flow::Bundles => {
                let rows = self.load_use_case.load_bundles(input).await?;
                println!("✓ Loaded {} bundle rows from {}", rows.len(), input.display());

                if args.dry_run {
                    print_bundle_candidates(images.as_ref(), &rows, &options.fallback_mode);
                    return Ok(());
                }

                let session = self.open_session(args.session.as_deref()).await?;
                let use_case =
                    ProcessBundlesUseCase::new(images, self.session_repository.clone());
                let result = use_case
                    .execute(&session, &rows, &options, &log_progress, &self.packager)
                    .await;
                let report = self.retry_packaging(&session, result, true).await?;
                print_report(&session, &report);
            }
            Flow::Products => {
                let codes = self.load_use_case.load_products(input).await?;
                println!("✓ Loaded {} product codes from {}", codes.len(), input.display());

                if args.dry_run {
                    print_product_candidates(images.as_ref(), &codes, &options.fallback_mode);
                    return Ok(());
                }

                let session = self.open_session(args.session.as_deref()).await?;
                let use_case =
                    DownloadProductsUseCase::new(images, self.session_repository.clone());
                let result = use_case
                    .execute(
                        &session,
                        &codes,
                        &options.fallback_mode,
                        &log_progress,
                        &self.packager,
                    )
                    .await;
                let report = self.retry_packaging(&session, result, false).await?;
                print_report(&session, &report);
            }
        }

        println!("✓ Done!");
        Ok(())
    }

    /// パッケージングだけが失敗した場合、保持された行処理の結果から1度だけ再実行する
    ///
    /// 行処理自体のエラーはそのまま返す。
    async fn retry_packaging(
        &self,
        session: &SessionContext,
        result: Result<BatchReport>,
        with_manifest: bool,
    ) -> Result<BatchReport> {
        let err = match result {
            Ok(report) => return Ok(report),
            Err(err) => err,
        };
        let failed = err.downcast::<PackagingFailed>()?;

        warn!("Packaging failed, retrying: {:#}", failed.error);
        println!("⚠ Packaging failed, retrying without refetching");

        let outcomes = with_manifest.then_some(failed.run.outcomes.as_slice());
        let package = self
            .packager
            .execute(session, outcomes, &failed.run.ledger)
            .await?;
        Ok(BatchReport::new(failed.run, package))
    }

    fn image_repository(&self, concurrency: usize) -> Result<VendorImages> {
        let client = ReqwestImageClient::new(
            concurrency,
            Duration::from_secs(self.config.request_timeout_secs),
            &self.config.user_agent,
        )?;

        Ok(VendorImageRepository::new(
            Arc::new(client),
            self.config.base_url.clone(),
            self.config.code_prefix.clone(),
            self.config.default_tags.clone(),
        ))
    }

    /// セッションを開き、同じセッションの前回の成果物を削除する
    async fn open_session(&self, requested: Option<&str>) -> Result<SessionContext> {
        let session_id = resolve_session_id(requested);
        let session = self
            .session_repository
            .open(&session_id)
            .await
            .map_err(session_error)?;
        self.session_repository
            .clear_artifacts(&session)
            .await
            .map_err(session_error)?;

        println!("✓ Session {} at {}", session.session_id, session.root_dir.display());
        Ok(session)
    }

    async fn reset(&self, requested: Option<&str>) -> Result<()> {
        let session_id = requested
            .ok_or_else(|| PipelineError::Validation("--reset requires --session".to_string()))?;
        let session = SessionContext::new(self.session_repository.base_dir(), session_id)?;

        self.session_repository
            .reset(&session)
            .await
            .map_err(session_error)?;

        println!("✓ Removed session {}", session.session_id);
        Ok(())
    }
}

fn session_error(err: anyhow::Error) -> PipelineError {
    PipelineError::Session(format!("{:#}", err))
}

fn log_progress(fraction: f64) {
    info!("Progress: {}%", percent(fraction));
}

fn print_bundle_candidates<I: ImageRepository>(images: &I, rows: &[InputRow], mode: &FallbackMode) {
    println!("✓ Dry-run mode (no requests sent)");
    for row in rows {
        println!("  {} [{}]", row.bundle_code(), row.members_joined());
        for code in row.distinct_members() {
            for url in images.candidate_urls(code, mode) {
                println!("    - {}", url);
            }
        }
    }
}

fn print_product_candidates<I: ImageRepository>(images: &I, codes: &[String], mode: &FallbackMode) {
    println!("✓ Dry-run mode (no requests sent)");
    for code in codes {
        println!("  {}", code);
        for url in images.candidate_urls(code, mode) {
            println!("    - {}", url);
        }
    }
}

fn print_report(session: &SessionContext, report: &BatchReport) {
    let artifacts: usize = report.outcomes.iter().map(|o| o.artifact_paths.len()).sum();
    println!(
        "✓ Processed {} rows, wrote {} images",
        report.outcomes.len(),
        artifacts
    );
    println!(
        "✓ Archive: {} ({} bytes)",
        report.package.archive_path.display(),
        report.archive_bytes().len()
    );
    if let Some(path) = &report.package.manifest_path {
        println!("✓ Manifest: {}", path.display());
    }
    match &report.package.ledger_path {
        Some(path) => println!(
            "⚠ {} missing images, see {}",
            report.ledger.len(),
            path.display()
        ),
        None => println!("✓ No missing images"),
    }
    println!("  Session: {}", display_session(session));
}

fn display_session(session: &SessionContext) -> String {
    format!(
        "{} (created {})",
        session.session_id,
        session.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.0), 0);
        assert_eq!(percent(0.25), 25);
        assert_eq!(percent(1.0), 100);
        assert_eq!(percent(1.5), 100);
    }

    #[test]
    fn test_resolve_session_id_requested() {
        assert_eq!(resolve_session_id(Some("batch-7")), "batch-7");
    }

    #[test]
    fn test_resolve_session_id_generated() {
        let a = resolve_session_id(None);
        let b = resolve_session_id(None);

        assert_eq!(a.len(), 36);
        assert_ne!(a, b);
        assert!(SessionContext::new(Path::new("/tmp"), &a).is_ok());
    }

    #[tokio::test]
    async fn test_reset_removes_session() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::with_base_url("https://cdn.example.com/img");
        config.work_dir = temp_dir.path().to_string_lossy().to_string();
        let workflow = BundleImageWorkflow::new(config);

        let session = workflow.open_session(Some("old")).await.unwrap();
        assert!(session.root_dir.exists());

        workflow.reset(Some("old")).await.unwrap();
        assert!(!session.root_dir.exists());
    }
}
