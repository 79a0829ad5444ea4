//! # InputRow Entity
//!
//! 入力テーブルの1行を表すエンティティ

use crate::domain::error::PipelineError;

/// 入力行
///
/// バンドルコード（入力の `sku` 列）と、その構成商品コード（`pzns_in_set` 列）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    bundle_code: String,
    member_codes: Vec<String>,
}

impl InputRow {
    /// 新しい入力行を作成します。
    ///
    /// コードは前後の空白を除去され、空のコードは除外されます。
    ///
    /// # Errors
    ///
    /// バンドルコードが空、または構成商品コードが1つもない場合に
    /// `PipelineError::Validation` を返す
    ///
    /// # 例
    ///
    /// ```
    /// use imgbundle::domain::entities::input_row::InputRow;
    ///
    /// let row = InputRow::new(" B1 ", vec![" 100".to_string(), "100 ".to_string()]).unwrap();
    /// assert_eq!(row.bundle_code(), "B1");
    /// assert!(row.is_uniform());
    /// assert_eq!(row.member_count(), 2);
    ///
    /// assert!(InputRow::new("B2", vec![" ".to_string()]).is_err());
    /// ```
    pub fn new(bundle_code: &str, member_codes: Vec<String>) -> Result<Self, PipelineError> {
        let bundle_code = bundle_code.trim();
        if bundle_code.is_empty() {
            return Err(PipelineError::Validation(
                "bundle code must not be empty".to_string(),
            ));
        }

        let member_codes: Vec<String> = member_codes
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        if member_codes.is_empty() {
            return Err(PipelineError::Validation(format!(
                "bundle {} has no member codes",
                bundle_code
            )));
        }

        Ok(Self {
            bundle_code: bundle_code.to_string(),
            member_codes,
        })
    }

    /// `pzns_in_set` 形式（カンマ区切り）の文字列から入力行を作成
    pub fn parse(bundle_code: &str, members: &str) -> Result<Self, PipelineError> {
        Self::new(
            bundle_code,
            members.split(',').map(str::to_string).collect(),
        )
    }

    pub fn bundle_code(&self) -> &str {
        &self.bundle_code
    }

    pub fn member_codes(&self) -> &[String] {
        &self.member_codes
    }

    #[inline]
    pub fn member_count(&self) -> usize {
        self.member_codes.len()
    }

    /// 全ての構成商品コードが同一かどうか
    pub fn is_uniform(&self) -> bool {
        self.member_codes
            .iter()
            .all(|code| code == &self.member_codes[0])
    }

    /// 重複を除いた構成商品コード（出現順）
    pub fn distinct_members(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.member_codes
            .iter()
            .filter(|code| seen.insert(code.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// マニフェスト出力用の `pzns_in_set` 表現
    pub fn members_joined(&self) -> String {
        self.member_codes.join(",")
    }
}
