//! # Image Repository Trait
//!
//! フォールバック付きの商品画像取得を抽象化

use async_trait::async_trait;

use crate::domain::entities::fetch::{FallbackMode, FetchResult};

/// 画像リポジトリ
///
/// 候補URLを優先順に試し、最初に成功した画像を返す
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// フォールバックチェーンに従って商品画像を取得する
    ///
    /// 個々のリクエストの失敗（200以外、ネットワークエラー、タイムアウト）は
    /// 「見つからない」として扱われ、エラーにはならない。
    ///
    /// # Arguments
    ///
    /// * `product_code` - 商品コード（正規化前）
    /// * `mode` - フォールバックモード
    ///
    /// # Returns
    ///
    /// 取得結果。全ての候補が失敗した場合は `FetchResult::NotFound`
    async fn fetch_with_fallback(&self, product_code: &str, mode: &FallbackMode) -> FetchResult;

    /// 試行する候補URLを優先順に返す（ネットワークI/Oなし）
    fn candidate_urls(&self, product_code: &str, mode: &FallbackMode) -> Vec<String>;
}
