//! # Error Ledger
//!
//! 画像が見つからなかった商品コードの台帳

use std::collections::{BTreeSet, HashMap};

/// 台帳エントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLedgerEntry {
    pub bundle_code: String,
    pub missing_product_code: String,
}

/// バンドル単位に集約された台帳の行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSummary {
    pub bundle_code: String,
    /// 重複排除・ソート済みの欠落商品コード
    pub missing_codes: Vec<String>,
}

impl LedgerSummary {
    pub fn missing_joined(&self) -> String {
        self.missing_codes.join(",")
    }
}

/// エラー台帳
///
/// 1回のバッチ実行中に蓄積され、実行終了時にCSVとして出力される
#[derive(Debug, Clone, Default)]
pub struct ErrorLedger {
    entries: Vec<ErrorLedgerEntry>,
}

impl ErrorLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, bundle_code: &str, missing_product_code: &str) {
        self.entries.push(ErrorLedgerEntry {
            bundle_code: bundle_code.to_string(),
            missing_product_code: missing_product_code.to_string(),
        });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ErrorLedgerEntry] {
        &self.entries
    }

    /// バンドルコードごとに集約します。
    ///
    /// バンドルは最初に記録された順、商品コードはソート・重複排除されます。
    ///
    /// # 例
    ///
    /// ```
    /// use imgbundle::domain::entities::ledger::ErrorLedger;
    ///
    /// let mut ledger = ErrorLedger::new();
    /// ledger.record("B2", "300");
    /// ledger.record("B2", "200");
    /// ledger.record("B2", "300");
    ///
    /// let summary = ledger.aggregate();
    /// assert_eq!(summary.len(), 1);
    /// assert_eq!(summary[0].missing_joined(), "200,300");
    /// ```
    pub fn aggregate(&self) -> Vec<LedgerSummary> {
        let mut order: Vec<&str> = Vec::new();
        let mut grouped: HashMap<&str, BTreeSet<&str>> = HashMap::new();

        for entry in &self.entries {
            let codes = grouped.entry(entry.bundle_code.as_str()).or_insert_with(|| {
                order.push(entry.bundle_code.as_str());
                BTreeSet::new()
            });
            codes.insert(entry.missing_product_code.as_str());
        }

        order
            .into_iter()
            .map(|bundle| LedgerSummary {
                bundle_code: bundle.to_string(),
                missing_codes: grouped[bundle].iter().map(|c| c.to_string()).collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ledger() {
        let ledger = ErrorLedger::new();
        assert!(ledger.is_empty());
        assert!(ledger.aggregate().is_empty());
    }

    #[test]
    fn test_aggregate_groups_by_bundle() {
        let mut ledger = ErrorLedger::new();
        ledger.record("B1", "100");
        ledger.record("B2", "300");
        ledger.record("B2", "200");

        let summary = ledger.aggregate();

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].bundle_code, "B1");
        assert_eq!(summary[0].missing_codes, vec!["100"]);
        assert_eq!(summary[1].bundle_code, "B2");
        assert_eq!(summary[1].missing_joined(), "200,300");
    }

    #[test]
    fn test_aggregate_deduplicates() {
        let mut ledger = ErrorLedger::new();
        ledger.record("B3", "500");
        ledger.record("B3", "500");

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.aggregate()[0].missing_codes, vec!["500"]);
    }

    #[test]
    fn test_aggregate_keeps_first_seen_bundle_order() {
        let mut ledger = ErrorLedger::new();
        ledger.record("Z9", "1");
        ledger.record("A1", "2");
        ledger.record("Z9", "3");

        let bundles: Vec<_> = ledger
            .aggregate()
            .into_iter()
            .map(|s| s.bundle_code)
            .collect();
        assert_eq!(bundles, vec!["Z9", "A1"]);
    }
}
