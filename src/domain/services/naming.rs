//! # Artifact Naming
//!
//! セッション内のフォルダ構成と成果物のファイル名

/// ロケール別バリアント由来の同一商品バンドル
pub const CROSS_COUNTRY_DIR: &str = "cross_country";
/// 異なる商品の組み合わせ（バンドルコードごとにサブフォルダ）
pub const MIXED_SETS_DIR: &str = "mixed_sets";
/// 単品ダウンロード
pub const PRODUCTS_DIR: &str = "products";

/// 同一商品バンドルのフォルダ名（例: `bundle of 2`）
pub fn uniform_dir(member_count: usize) -> String {
    format!("bundle of {}", member_count)
}

/// 異なる商品の組み合わせのフォルダ（例: `mixed_sets/B2`）
pub fn mixed_dir(bundle_code: &str) -> String {
    join(MIXED_SETS_DIR, bundle_code)
}

/// バンドルのメイン画像（`{bundle_code}-h1.jpg`）
pub fn bundle_image_name(bundle_code: &str) -> String {
    format!("{}-h1.jpg", bundle_code)
}

/// ロケールペアの各バリアント（`{code}-p{tag}.jpg`、例: `B1-p1-fr.jpg`）
pub fn variant_image_name(code: &str, extension_tag: &str) -> String {
    format!("{}-p{}.jpg", code, extension_tag)
}

/// 単品画像（`{product_code}.jpg`）
pub fn product_image_name(product_code: &str) -> String {
    format!("{}.jpg", product_code)
}

/// セッション内の相対パスを `/` 区切りで結合
pub fn join(dir: &str, name: &str) -> String {
    format!("{}/{}", dir, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_names() {
        assert_eq!(uniform_dir(2), "bundle of 2");
        assert_eq!(bundle_image_name("B1"), "B1-h1.jpg");
        assert_eq!(join(&uniform_dir(3), &bundle_image_name("B9")), "bundle of 3/B9-h1.jpg");
    }

    #[test]
    fn test_locale_variant_names() {
        assert_eq!(variant_image_name("B1", "1-fr"), "B1-p1-fr.jpg");
        assert_eq!(variant_image_name("200", "1-nl"), "200-p1-nl.jpg");
    }

    #[test]
    fn test_mixed_names() {
        assert_eq!(mixed_dir("B2"), "mixed_sets/B2");
        assert_eq!(product_image_name("300"), "300.jpg");
    }
}
