//! # Fetch Entities
//!
//! 画像取得の候補、フォールバックモード、取得結果

/// フォールバックモード
///
/// デフォルトの画像バリアントに加えて、どのロケール別バリアントを試すかを決める
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FallbackMode {
    /// デフォルトバリアントのみ
    #[default]
    None,
    /// デフォルトバリアントが全て失敗した場合に、このロケールタグを最後に試す
    SingleLocale(String),
    /// 2つのロケールバリアントを最初に同時取得する
    LocalePair(String, String),
}

/// 取得候補
///
/// 商品コードと拡張タグ（URLのバリアントを選択するサフィックス）の組
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCandidate {
    pub product_code: String,
    pub extension_tag: String,
    /// ロケール別（デフォルト市場以外）のバリアントかどうか
    pub locale_specific: bool,
}

impl FetchCandidate {
    pub fn default_variant(product_code: &str, extension_tag: &str) -> Self {
        Self {
            product_code: product_code.to_string(),
            extension_tag: extension_tag.to_string(),
            locale_specific: false,
        }
    }

    pub fn locale_variant(product_code: &str, extension_tag: &str) -> Self {
        Self {
            product_code: product_code.to_string(),
            extension_tag: extension_tag.to_string(),
            locale_specific: true,
        }
    }
}

/// 候補チェーンの1段
///
/// 同じ段の候補は同時に取得され、リスト順で優先される
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStage {
    /// 2つのロケールバリアント（両方成功すればペアとして返す）
    LocalePair(FetchCandidate, FetchCandidate),
    /// 最初に成功した候補を返す
    FirstOf(Vec<FetchCandidate>),
}

/// 商品コードに対する候補チェーンを構築します。
///
/// 順序: ロケールペア（該当モードのみ）→ デフォルトバリアント → 単一ロケール（該当モードのみ）
///
/// # 例
///
/// ```
/// use imgbundle::domain::entities::fetch::{candidate_chain, FallbackMode, FetchStage};
///
/// let tags = vec!["1".to_string(), "2".to_string()];
/// let chain = candidate_chain("100", &tags, &FallbackMode::SingleLocale("1-fr".to_string()));
///
/// assert_eq!(chain.len(), 2);
/// assert!(matches!(&chain[1], FetchStage::FirstOf(c) if c[0].locale_specific));
/// ```
pub fn candidate_chain(
    product_code: &str,
    default_tags: &[String],
    mode: &FallbackMode,
) -> Vec<FetchStage> {
    let mut chain = Vec::new();

    if let FallbackMode::LocalePair(first, second) = mode {
        chain.push(FetchStage::LocalePair(
            FetchCandidate::locale_variant(product_code, first),
            FetchCandidate::locale_variant(product_code, second),
        ));
    }

    if !default_tags.is_empty() {
        chain.push(FetchStage::FirstOf(
            default_tags
                .iter()
                .map(|tag| FetchCandidate::default_variant(product_code, tag))
                .collect(),
        ));
    }

    if let FallbackMode::SingleLocale(tag) = mode {
        chain.push(FetchStage::FirstOf(vec![FetchCandidate::locale_variant(
            product_code,
            tag,
        )]));
    }

    chain
}

/// 取得した画像バリアント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedVariant {
    pub extension_tag: String,
    pub bytes: Vec<u8>,
}

/// 取得結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// 1つの候補で取得できた
    Single {
        bytes: Vec<u8>,
        candidate: FetchCandidate,
    },
    /// ロケールペアの両方を取得できた（チェーン上の順序を保持）
    LocalePair(FetchedVariant, FetchedVariant),
    /// 全ての候補が失敗した
    NotFound,
}

impl FetchResult {
    pub fn is_found(&self) -> bool {
        !matches!(self, FetchResult::NotFound)
    }

    /// ロケール別バリアント由来かどうか
    pub fn is_cross_country(&self) -> bool {
        match self {
            FetchResult::Single { candidate, .. } => candidate.locale_specific,
            FetchResult::LocalePair(..) => true,
            FetchResult::NotFound => false,
        }
    }
}
