//! Vendor Image Repository Implementation
//!
//! ImageRepositoryのHTTP実装（ベンダーCDNのフォールバックチェーン）

use async_trait::async_trait;
use futures::future::join_all;
use log::debug;
use std::sync::Arc;

use crate::adapter::http::addressing::{image_url, normalize_code};
use crate::adapter::http::client::ImageHttpClient;
use crate::domain::entities::fetch::{
    candidate_chain, FallbackMode, FetchCandidate, FetchResult, FetchStage, FetchedVariant,
};
use crate::domain::repositories::image_repository::ImageRepository;

/// ベンダーCDNから画像を取得するリポジトリ
pub struct VendorImageRepository<C: ImageHttpClient> {
    client: Arc<C>,
    base_url: String,
    code_prefix: String,
    default_tags: Vec<String>,
}

impl<C: ImageHttpClient> VendorImageRepository<C> {
    /// 新しいリポジトリを作成
    ///
    /// # Arguments
    ///
    /// * `client` - 全リクエストで共有するHTTPクライアント
    /// * `base_url` - 画像CDNのベースURL
    /// * `code_prefix` - `0`/`1` で始まるコードに付ける接頭辞
    /// * `default_tags` - デフォルトバリアントの拡張タグ（優先順）
    pub fn new(
        client: Arc<C>,
        base_url: String,
        code_prefix: String,
        default_tags: Vec<String>,
    ) -> Self {
        Self {
            client,
            base_url,
            code_prefix,
            default_tags,
        }
    }

    fn url_for(&self, candidate: &FetchCandidate) -> String {
        let code = normalize_code(&candidate.product_code, &self.code_prefix);
        image_url(&self.base_url, &code, &candidate.extension_tag)
    }

    async fn fetch_candidate(&self, candidate: &FetchCandidate) -> Option<Vec<u8>> {
        self.client.get_image(&self.url_for(candidate)).await
    }

    /// ロケールペアを同時に取得
    async fn fetch_locale_pair(
        &self,
        first: FetchCandidate,
        second: FetchCandidate,
    ) -> Option<FetchResult> {
        let (a, b) = futures::join!(
            self.fetch_candidate(&first),
            self.fetch_candidate(&second)
        );

        match (a, b) {
            (Some(a), Some(b)) => Some(FetchResult::LocalePair(
                FetchedVariant {
                    extension_tag: first.extension_tag,
                    bytes: a,
                },
                FetchedVariant {
                    extension_tag: second.extension_tag,
                    bytes: b,
                },
            )),
            (Some(bytes), None) => Some(FetchResult::Single {
                bytes,
                candidate: first,
            }),
            (None, Some(bytes)) => Some(FetchResult::Single {
                bytes,
                candidate: second,
            }),
            (None, None) => None,
        }
    }

    /// 候補を同時に取得し、リスト順で最初に成功したものを返す（完了順ではない）
    async fn fetch_first_of(&self, candidates: Vec<FetchCandidate>) -> Option<FetchResult> {
        let results = join_all(candidates.iter().map(|c| self.fetch_candidate(c))).await;

        candidates
            .into_iter()
            .zip(results)
            .find_map(|(candidate, result)| {
                result.map(|bytes| FetchResult::Single { bytes, candidate })
            })
    }
}

#[async_trait]
impl<C: ImageHttpClient> ImageRepository for VendorImageRepository<C> {
    async fn fetch_with_fallback(&self, product_code: &str, mode: &FallbackMode) -> FetchResult {
        for stage in candidate_chain(product_code, &self.default_tags, mode) {
            let result = match stage {
                FetchStage::LocalePair(first, second) => {
                    self.fetch_locale_pair(first, second).await
                }
                FetchStage::FirstOf(candidates) => self.fetch_first_of(candidates).await,
            };

            if let Some(result) = result {
                return result;
            }
        }

        debug!("All candidates exhausted for {}", product_code);
        FetchResult::NotFound
    }

    fn candidate_urls(&self, product_code: &str, mode: &FallbackMode) -> Vec<String> {
        candidate_chain(product_code, &self.default_tags, mode)
            .into_iter()
            .flat_map(|stage| match stage {
                FetchStage::LocalePair(first, second) => vec![first, second],
                FetchStage::FirstOf(candidates) => candidates,
            })
            .map(|candidate| self.url_for(&candidate))
            .collect()
    }
}
