//! # ProcessingOutcome Entity
//!
//! 入力行1件分の処理結果

use std::collections::BTreeSet;

use super::input_row::InputRow;

/// バンドルの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleCategory {
    /// 全て同じ商品コード（タイル合成の対象）
    Uniform(usize),
    /// 異なる商品コードの組み合わせ
    Mixed,
}

impl BundleCategory {
    pub fn of(row: &InputRow) -> Self {
        if row.is_uniform() {
            BundleCategory::Uniform(row.member_count())
        } else {
            BundleCategory::Mixed
        }
    }

    /// マニフェストの `bundle type` 列の表記
    pub fn label(&self) -> String {
        match self {
            BundleCategory::Uniform(n) => format!("bundle of {}", n),
            BundleCategory::Mixed => "mixed".to_string(),
        }
    }
}

/// 処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingOutcome {
    pub bundle_code: String,
    pub member_codes: Vec<String>,
    pub category: BundleCategory,
    pub cross_country: bool,
    /// セッションのファイルディレクトリからの相対パス
    pub artifact_paths: Vec<String>,
    pub failed_members: BTreeSet<String>,
}

impl ProcessingOutcome {
    /// 入力行から空の処理結果を作成
    pub fn for_row(row: &InputRow) -> Self {
        Self {
            bundle_code: row.bundle_code().to_string(),
            member_codes: row.member_codes().to_vec(),
            category: BundleCategory::of(row),
            cross_country: false,
            artifact_paths: Vec::new(),
            failed_members: BTreeSet::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed_members.is_empty()
    }

    pub fn members_joined(&self) -> String {
        self.member_codes.join(",")
    }
}
