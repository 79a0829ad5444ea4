//! # Download Products Use Case
//!
//! 商品コード一覧の画像をそのまま一括ダウンロードする

use anyhow::Result;
use log::{info, warn};
use std::sync::Arc;

use super::artifacts::RowRecorder;
use super::package_session::PackageSessionUseCase;
use crate::application::dto::batch_report::{BatchReport, BatchRun, PackagingFailed};
use crate::application::dto::progress::{fraction, ProgressSink};
use crate::domain::entities::fetch::{FallbackMode, FetchResult};
use crate::domain::entities::input_row::InputRow;
use crate::domain::entities::outcome::ProcessingOutcome;
use crate::domain::entities::session::SessionContext;
use crate::domain::error::PipelineError;
use crate::domain::repositories::archive_repository::ArchiveRepository;
use crate::domain::repositories::image_repository::ImageRepository;
use crate::domain::repositories::report_repository::ReportRepository;
use crate::domain::repositories::session_repository::SessionRepository;
use crate::domain::services::naming::{self, CROSS_COUNTRY_DIR, PRODUCTS_DIR};

/// 商品ダウンロードユースケース
///
/// 合成は行わず、取得した画像を `products/` または `cross_country/` に保存する。
/// 台帳のキーは商品コード自身。マニフェストは作成しない。
pub struct DownloadProductsUseCase<I: ImageRepository, S: SessionRepository> {
    image_repository: Arc<I>,
    session_repository: Arc<S>,
}

impl<I: ImageRepository, S: SessionRepository> DownloadProductsUseCase<I, S> {
    pub fn new(image_repository: Arc<I>, session_repository: Arc<S>) -> Self {
        Self {
            image_repository,
            session_repository,
        }
    }

    /// 全商品をダウンロードしてセッションをパッケージングする
    ///
    /// # Errors
    ///
    /// 商品コードが空の場合（`PipelineError::Validation`）、またはパッケージングに
    /// 失敗した場合（`PackagingFailed`、行処理の結果を含む）
    pub async fn execute<A: ArchiveRepository, R: ReportRepository>(
        &self,
        session: &SessionContext,
        codes: &[String],
        fallback_mode: &FallbackMode,
        progress: &dyn ProgressSink,
        packager: &PackageSessionUseCase<S, A, R>,
    ) -> Result<BatchReport> {
        let run = self.download(session, codes, fallback_mode, progress).await?;
        let packaged = packager.execute(session, None, &run.ledger).await;
        match packaged {
            Ok(package) => Ok(BatchReport::new(run, package)),
            Err(error) => Err(PackagingFailed { run, error }.into()),
        }
    }

    /// 全商品をダウンロードする（パッケージングは行わない）
    pub async fn download(
        &self,
        session: &SessionContext,
        codes: &[String],
        fallback_mode: &FallbackMode,
        progress: &dyn ProgressSink,
    ) -> Result<BatchRun> {
        if codes.is_empty() {
            return Err(
                PipelineError::Validation("no product codes to download".to_string()).into(),
            );
        }

        let mut run = BatchRun::default();
        for (index, code) in codes.iter().enumerate() {
            let row = InputRow::new(code, vec![code.clone()])?;
            let mut outcome = ProcessingOutcome::for_row(&row);
            let mut recorder = RowRecorder {
                outcome: &mut outcome,
                ledger: &mut run.ledger,
            };

            let files = match self
                .image_repository
                .fetch_with_fallback(row.bundle_code(), fallback_mode)
                .await
            {
                FetchResult::NotFound => {
                    warn!(
                        "{}",
                        PipelineError::FetchNotFound {
                            product_code: row.bundle_code().to_string()
                        }
                    );
                    recorder.missing(row.bundle_code());
                    Vec::new()
                }
                FetchResult::Single { bytes, candidate } => {
                    let dir = if candidate.locale_specific {
                        recorder.outcome.cross_country = true;
                        CROSS_COUNTRY_DIR
                    } else {
                        PRODUCTS_DIR
                    };
                    vec![(
                        naming::join(dir, &naming::product_image_name(row.bundle_code())),
                        bytes,
                    )]
                }
                FetchResult::LocalePair(first, second) => {
                    recorder.outcome.cross_country = true;
                    [first, second]
                        .into_iter()
                        .map(|variant| {
                            let name = naming::variant_image_name(
                                row.bundle_code(),
                                &variant.extension_tag,
                            );
                            (naming::join(CROSS_COUNTRY_DIR, &name), variant.bytes)
                        })
                        .collect()
                }
            };

            for (relative_path, bytes) in files {
                recorder
                    .store(
                        self.session_repository.as_ref(),
                        session,
                        relative_path,
                        bytes,
                        row.bundle_code(),
                    )
                    .await;
            }

            run.outcomes.push(outcome);
            progress.report(fraction(index + 1, codes.len()));
        }

        info!(
            "Downloaded {} of {} products",
            run.complete_count(),
            codes.len()
        );
        Ok(run)
    }
}
