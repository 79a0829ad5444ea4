//! # Process Bundles Use Case
//!
//! バンドル入力の一括処理（取得・合成・保存・台帳）

use anyhow::{Context, Result};
use futures::future::join_all;
use log::{info, warn};
use std::sync::Arc;

use super::artifacts::RowRecorder;
use super::package_session::PackageSessionUseCase;
use crate::application::dto::batch_report::{BatchReport, BatchRun, PackagingFailed};
use crate::application::dto::process_options::ProcessOptions;
use crate::application::dto::progress::{fraction, ProgressSink};
use crate::domain::entities::fetch::{FetchResult, FetchedVariant};
use crate::domain::entities::input_row::InputRow;
use crate::domain::entities::ledger::ErrorLedger;
use crate::domain::entities::outcome::{BundleCategory, ProcessingOutcome};
use crate::domain::entities::session::SessionContext;
use crate::domain::error::PipelineError;
use crate::domain::repositories::archive_repository::ArchiveRepository;
use crate::domain::repositories::image_repository::ImageRepository;
use crate::domain::repositories::report_repository::ReportRepository;
use crate::domain::repositories::session_repository::SessionRepository;
use crate::domain::services::compositor::{self, compose_bytes};
use crate::domain::services::naming::{self, CROSS_COUNTRY_DIR, MIXED_SETS_DIR};

/// バンドル処理ユースケース
///
/// 入力行を順番に処理し、同一商品のバンドルはタイル合成した画像を、
/// 混合セットは構成商品ごとの元画像をセッションのファイルディレクトリに保存する。
/// 行単位の失敗は台帳に記録され、バッチは継続する。
pub struct ProcessBundlesUseCase<I: ImageRepository, S: SessionRepository> {
    image_repository: Arc<I>,
    session_repository: Arc<S>,
}

impl<I: ImageRepository, S: SessionRepository> ProcessBundlesUseCase<I, S> {
    pub fn new(image_repository: Arc<I>, session_repository: Arc<S>) -> Self {
        Self {
            image_repository,
            session_repository,
        }
    }

    /// 全行を処理してセッションをパッケージングする
    ///
    /// # Arguments
    ///
    /// * `session` - 出力先セッション
    /// * `rows` - 入力行（入力順）
    /// * `options` - レイアウト、フォールバックモード、JPEG品質
    /// * `progress` - 各行の完了後に呼ばれる進捗通知
    /// * `packager` - アーカイブとレポートの作成
    ///
    /// # Errors
    ///
    /// 入力行が空の場合（`PipelineError::Validation`）、またはパッケージングに
    /// 失敗した場合（`PackagingFailed`、行処理の結果を含む）
    pub async fn execute<A: ArchiveRepository, R: ReportRepository>(
        &self,
        session: &SessionContext,
        rows: &[InputRow],
        options: &ProcessOptions,
        progress: &dyn ProgressSink,
        packager: &PackageSessionUseCase<S, A, R>,
    ) -> Result<BatchReport> {
        let run = self.process_rows(session, rows, options, progress).await?;
        let packaged = packager
            .execute(session, Some(run.outcomes.as_slice()), &run.ledger)
            .await;
        match packaged {
            Ok(package) => Ok(BatchReport::new(run, package)),
            Err(error) => Err(PackagingFailed { run, error }.into()),
        }
    }

    /// 全行を処理する（パッケージングは行わない）
    pub async fn process_rows(
        &self,
        session: &SessionContext,
        rows: &[InputRow],
        options: &ProcessOptions,
        progress: &dyn ProgressSink,
    ) -> Result<BatchRun> {
        if rows.is_empty() {
            return Err(PipelineError::Validation("no rows to process".to_string()).into());
        }

        let mut run = BatchRun::default();
        for (index, row) in rows.iter().enumerate() {
            let outcome = self.process_row(session, row, options, &mut run.ledger).await;
            if !outcome.is_complete() {
                warn!(
                    "Bundle {} incomplete, missing: {:?}",
                    outcome.bundle_code, outcome.failed_members
                );
            }
            run.outcomes.push(outcome);
            progress.report(fraction(index + 1, rows.len()));
        }

        let has_mixed = run
            .outcomes
            .iter()
            .any(|o| o.category == BundleCategory::Mixed);
        if !has_mixed {
            self.session_repository
                .remove_artifact_dir(session, MIXED_SETS_DIR)
                .await
                .context("Failed to remove unused mixed sets directory")?;
        }

        info!(
            "Processed {} rows: {} complete, {} missing images",
            rows.len(),
            run.complete_count(),
            run.ledger.len()
        );
        Ok(run)
    }

    async fn process_row(
        &self,
        session: &SessionContext,
        row: &InputRow,
        options: &ProcessOptions,
        ledger: &mut ErrorLedger,
    ) -> ProcessingOutcome {
        let mut outcome = ProcessingOutcome::for_row(row);
        let mut recorder = RowRecorder {
            outcome: &mut outcome,
            ledger,
        };

        match BundleCategory::of(row) {
            BundleCategory::Uniform(count) => {
                self.process_uniform(session, row, count, options, &mut recorder)
                    .await
            }
            BundleCategory::Mixed => {
                self.process_mixed(session, row, options, &mut recorder)
                    .await
            }
        }

        outcome
    }

    async fn process_uniform(
        &self,
        session: &SessionContext,
        row: &InputRow,
        count: usize,
        options: &ProcessOptions,
        recorder: &mut RowRecorder<'_>,
    ) {
        let bundle_code = row.bundle_code();
        let product_code = &row.member_codes()[0];

        let variants = match self
            .image_repository
            .fetch_with_fallback(product_code, &options.fallback_mode)
            .await
        {
            FetchResult::NotFound => {
                warn!("{} (bundle {})", not_found(product_code), bundle_code);
                recorder.missing(product_code);
                return;
            }
            FetchResult::Single { bytes, candidate } => {
                let dir = if candidate.locale_specific {
                    recorder.outcome.cross_country = true;
                    CROSS_COUNTRY_DIR.to_string()
                } else {
                    naming::uniform_dir(count)
                };
                vec![(naming::join(&dir, &naming::bundle_image_name(bundle_code)), bytes)]
            }
            FetchResult::LocalePair(first, second) => {
                recorder.outcome.cross_country = true;
                [first, second]
                    .into_iter()
                    .map(|FetchedVariant { extension_tag, bytes }| {
                        let name = naming::variant_image_name(bundle_code, &extension_tag);
                        (naming::join(CROSS_COUNTRY_DIR, &name), bytes)
                    })
                    .collect()
            }
        };

        for (relative_path, bytes) in variants {
            match render(bytes, product_code, count, options).await {
                Ok(rendered) => {
                    recorder
                        .store(
                            self.session_repository.as_ref(),
                            session,
                            relative_path,
                            rendered,
                            product_code,
                        )
                        .await
                }
                Err(e) => {
                    warn!("{} (bundle {})", e, bundle_code);
                    recorder.missing(product_code);
                }
            }
        }
    }

    async fn process_mixed(
        &self,
        session: &SessionContext,
        row: &InputRow,
        options: &ProcessOptions,
        recorder: &mut RowRecorder<'_>,
    ) {
        let dir = naming::mixed_dir(row.bundle_code());
        let members = row.distinct_members();

        let results = join_all(members.iter().map(|code| {
            self.image_repository
                .fetch_with_fallback(code, &options.fallback_mode)
        }))
        .await;

        for (product_code, result) in members.into_iter().zip(results) {
            let files = match result {
                FetchResult::NotFound => {
                    warn!("{} (bundle {})", not_found(product_code), row.bundle_code());
                    recorder.missing(product_code);
                    continue;
                }
                FetchResult::Single { bytes, candidate } => {
                    if candidate.locale_specific {
                        recorder.outcome.cross_country = true;
                    }
                    vec![(naming::product_image_name(product_code), bytes)]
                }
                FetchResult::LocalePair(first, second) => {
                    recorder.outcome.cross_country = true;
                    vec![
                        (
                            naming::variant_image_name(product_code, &first.extension_tag),
                            first.bytes,
                        ),
                        (
                            naming::variant_image_name(product_code, &second.extension_tag),
                            second.bytes,
                        ),
                    ]
                }
            };

            for (name, bytes) in files {
                recorder
                    .store(
                        self.session_repository.as_ref(),
                        session,
                        naming::join(&dir, &name),
                        bytes,
                        product_code,
                    )
                    .await;
            }
        }
    }
}

fn not_found(product_code: &str) -> PipelineError {
    PipelineError::FetchNotFound {
        product_code: product_code.to_string(),
    }
}

/// 取得した画像を成果物に変換する
///
/// 商品数が 2 または 3 ならブロッキングスレッドで合成し、それ以外は元のバイト列を返す。
async fn render(
    bytes: Vec<u8>,
    product_code: &str,
    member_count: usize,
    options: &ProcessOptions,
) -> Result<Vec<u8>, PipelineError> {
    if !compositor::is_tiled(member_count) {
        return Ok(bytes);
    }

    let layout = options.layout;
    let quality = options.jpeg_quality;
    let composed =
        tokio::task::spawn_blocking(move || compose_bytes(&bytes, member_count, layout, quality))
            .await
            .map_err(|e| PipelineError::Decode {
                product_code: product_code.to_string(),
                message: format!("Failed to spawn blocking task: {}", e),
            })?;

    composed.map_err(|e| PipelineError::Decode {
        product_code: product_code.to_string(),
        message: e.to_string(),
    })
}
