//! # Image Compositor
//!
//! 1枚の商品画像から、同一商品バンドル用の固定サイズ画像を合成する。
//!
//! 処理の流れ:
//!
//! 1. 白背景との差分のバウンディングボックスでトリミング
//! 2. レイアウトの決定（Automatic は横長なら縦並び、それ以外は横並び）
//! 3. 商品数（2 または 3）分のタイル配置
//! 4. 1000×1000 の白キャンバス中央に縮小・拡大して配置
//!
//! 全て純粋関数で I/O は行わない。CPU負荷が高いため、呼び出し側は
//! `tokio::task::spawn_blocking` 上で実行すること。

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageResult, Rgb, RgbImage};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// 出力キャンバスの一辺（ピクセル）
pub const CANVAS_SIZE: u32 = 1000;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// タイルの並べ方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeLayout {
    Horizontal,
    Vertical,
    #[default]
    Automatic,
}

impl CompositeLayout {
    /// 名前からレイアウトを決定します。認識できない名前は `Horizontal` として扱います。
    ///
    /// # 例
    ///
    /// ```
    /// use imgbundle::domain::services::compositor::CompositeLayout;
    ///
    /// assert_eq!(CompositeLayout::from_name("Vertical"), CompositeLayout::Vertical);
    /// assert_eq!(CompositeLayout::from_name("auto"), CompositeLayout::Automatic);
    /// assert_eq!(CompositeLayout::from_name("diagonal"), CompositeLayout::Horizontal);
    /// ```
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "vertical" => CompositeLayout::Vertical,
            "automatic" | "auto" => CompositeLayout::Automatic,
            _ => CompositeLayout::Horizontal,
        }
    }

    /// 画像サイズに応じて `Automatic` を具体的なレイアウトに解決
    pub fn resolve(self, width: u32, height: u32) -> Self {
        match self {
            CompositeLayout::Automatic if height < width => CompositeLayout::Vertical,
            CompositeLayout::Automatic => CompositeLayout::Horizontal,
            other => other,
        }
    }
}

impl FromStr for CompositeLayout {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl fmt::Display for CompositeLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompositeLayout::Horizontal => "horizontal",
            CompositeLayout::Vertical => "vertical",
            CompositeLayout::Automatic => "automatic",
        };
        f.write_str(name)
    }
}

/// 白背景と異なるピクセルのバウンディングボックスで切り抜く
///
/// 全面が白、または既に余白がない場合は元画像をそのまま返す。
pub fn trim(image: &DynamicImage) -> DynamicImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in rgba.enumerate_pixels() {
        if pixel.0 == [255, 255, 255, 255] {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
        });
    }

    let Some((min_x, min_y, max_x, max_y)) = bounds else {
        return image.clone();
    };

    let crop_width = max_x - min_x + 1;
    let crop_height = max_y - min_y + 1;
    if crop_width == width && crop_height == height {
        return image.clone();
    }

    image.crop_imm(min_x, min_y, crop_width, crop_height)
}

/// 同じ画像を `count` 枚並べる（`layout` は解決済みであること）
pub fn tile(image: &RgbImage, count: u32, layout: CompositeLayout) -> RgbImage {
    let (width, height) = image.dimensions();
    let vertical = layout == CompositeLayout::Vertical;

    let (merged_width, merged_height) = if vertical {
        (width, height * count)
    } else {
        (width * count, height)
    };

    let mut merged = RgbImage::from_pixel(merged_width, merged_height, WHITE);
    for i in 0..count {
        let (x, y) = if vertical { (0, i * height) } else { (i * width, 0) };
        imageops::replace(&mut merged, image, i64::from(x), i64::from(y));
    }
    merged
}

/// 縦横比を保ったまま拡大・縮小し、1000×1000 の白キャンバス中央に配置
pub fn fit_to_canvas(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    let canvas = f64::from(CANVAS_SIZE);
    let scale = f64::min(canvas / f64::from(width), canvas / f64::from(height));

    let scaled_width = ((f64::from(width) * scale) as u32).clamp(1, CANVAS_SIZE);
    let scaled_height = ((f64::from(height) * scale) as u32).clamp(1, CANVAS_SIZE);

    let resized = imageops::resize(image, scaled_width, scaled_height, FilterType::Lanczos3);

    let mut output = RgbImage::from_pixel(CANVAS_SIZE, CANVAS_SIZE, WHITE);
    let offset_x = (CANVAS_SIZE - scaled_width) / 2;
    let offset_y = (CANVAS_SIZE - scaled_height) / 2;
    imageops::replace(&mut output, &resized, i64::from(offset_x), i64::from(offset_y));
    output
}

/// タイル合成の対象となる商品数かどうか
#[inline]
pub fn is_tiled(member_count: usize) -> bool {
    matches!(member_count, 2 | 3)
}

/// バンドル画像を合成する
///
/// `member_count` が 2 または 3 の場合のみタイル合成を行い、出力は常に
/// 1000×1000 のRGB画像になる。それ以外の商品数では元画像をそのまま返す。
pub fn compose(image: &DynamicImage, member_count: usize, layout: CompositeLayout) -> DynamicImage {
    if !is_tiled(member_count) {
        return image.clone();
    }
    let count = member_count as u32;

    let trimmed = trim(image);
    let resolved = layout.resolve(trimmed.width(), trimmed.height());
    let merged = tile(&trimmed.to_rgb8(), count, resolved);

    DynamicImage::ImageRgb8(fit_to_canvas(&merged))
}

/// 画像をJPEGとしてエンコード
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> ImageResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))?;
    Ok(buffer)
}

/// バイト列のデコードから合成・JPEGエンコードまでをまとめて行う
///
/// # Errors
///
/// 画像のデコードまたはエンコードに失敗した場合にエラーを返す
pub fn compose_bytes(
    bytes: &[u8],
    member_count: usize,
    layout: CompositeLayout,
    quality: u8,
) -> ImageResult<Vec<u8>> {
    let source = image::load_from_memory(bytes)?;
    let composed = compose(&source, member_count, layout);
    encode_jpeg(&composed, quality)
}
