//! # Pipeline Errors
//!
//! パイプライン全体のエラー分類

use thiserror::Error;

/// パイプラインのエラー
///
/// 行単位の失敗（`FetchNotFound`, `Decode`）はバッチを中断せずに台帳へ記録され、
/// 実行単位の失敗（`Validation`, `Packaging`, `Session`）は呼び出し元へ返される。
#[derive(Error, Debug)]
pub enum PipelineError {
    /// 全ての候補URLで画像が見つからなかった
    #[error("no image found for product {product_code}")]
    FetchNotFound { product_code: String },

    /// 画像データのデコードまたは合成に失敗した
    #[error("failed to decode image for product {product_code}: {message}")]
    Decode {
        product_code: String,
        message: String,
    },

    /// 入力テーブルまたは引数が不正（ネットワークI/Oの前に中断）
    #[error("validation failed: {0}")]
    Validation(String),

    /// アーカイブまたはレポートの作成に失敗した
    #[error("packaging failed: {0}")]
    Packaging(String),

    /// セッションディレクトリの作成・削除に失敗した
    #[error("session error: {0}")]
    Session(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PipelineError::Validation("missing column 'sku'".to_string());
        assert_eq!(err.to_string(), "validation failed: missing column 'sku'");

        let err = PipelineError::FetchNotFound {
            product_code: "0123".to_string(),
        };
        assert_eq!(err.to_string(), "no image found for product 0123");
    }
}
