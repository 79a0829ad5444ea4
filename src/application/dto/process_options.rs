//! # Process Options DTO
//!
//! バッチ処理のオプション

use crate::domain::entities::fetch::FallbackMode;
use crate::domain::services::compositor::CompositeLayout;

/// JPEGエンコードのデフォルト品質
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// バッチ処理オプション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOptions {
    /// タイル合成のレイアウト
    pub layout: CompositeLayout,
    /// 画像取得のフォールバックモード
    pub fallback_mode: FallbackMode,
    /// 合成画像のJPEG品質（1-100）
    pub jpeg_quality: u8,
}

impl ProcessOptions {
    /// 新しいオプションを作成します。
    ///
    /// # 例
    ///
    /// ```
    /// use imgbundle::application::dto::process_options::ProcessOptions;
    /// use imgbundle::domain::entities::fetch::FallbackMode;
    /// use imgbundle::domain::services::compositor::CompositeLayout;
    ///
    /// let options = ProcessOptions::new(
    ///     CompositeLayout::Horizontal,
    ///     FallbackMode::SingleLocale("1-fr".to_string()),
    ///     90,
    /// );
    ///
    /// assert_eq!(options.layout, CompositeLayout::Horizontal);
    /// assert_eq!(options.jpeg_quality, 90);
    /// ```
    pub fn new(layout: CompositeLayout, fallback_mode: FallbackMode, jpeg_quality: u8) -> Self {
        Self {
            layout,
            fallback_mode,
            jpeg_quality,
        }
    }
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self::new(
            CompositeLayout::Automatic,
            FallbackMode::None,
            DEFAULT_JPEG_QUALITY,
        )
    }
}
