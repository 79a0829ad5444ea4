//! Vendor Image Addressing
//!
//! 商品コードの正規化と画像URLの組み立て

/// ベンダーのアドレス体系に合わせて商品コードを正規化する
///
/// `0` または `1` で始まるコードには固定の接頭辞を付ける。
pub fn normalize_code(product_code: &str, prefix: &str) -> String {
    if product_code.starts_with('0') || product_code.starts_with('1') {
        format!("{}{}", prefix, product_code)
    } else {
        product_code.to_string()
    }
}

/// `{base}/{normalized_code}-p{extension_tag}.jpg`
pub fn image_url(base_url: &str, normalized_code: &str, extension_tag: &str) -> String {
    format!(
        "{}/{}-p{}.jpg",
        base_url.trim_end_matches('/'),
        normalized_code,
        extension_tag
    )
}
