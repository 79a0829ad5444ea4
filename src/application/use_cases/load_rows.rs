//! # Load Rows Use Case
//!
//! 入力テーブルの読み込みと検証

use anyhow::Result;
use log::{info, warn};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::domain::entities::input_row::InputRow;
use crate::domain::error::PipelineError;
use crate::domain::repositories::row_repository::{RawTable, RowRepository};

/// バンドルコードの列名
pub const SKU_COLUMN: &str = "sku";
/// 構成商品コードの列名
pub const MEMBERS_COLUMN: &str = "pzns_in_set";

/// 入力行読み込みユースケース
///
/// 生のテーブルを読み込み、必要な列の存在と各行の内容を検証する。
/// 検証エラーはネットワークI/Oの前に `PipelineError::Validation` として返される。
pub struct LoadRowsUseCase<R: RowRepository> {
    row_repository: Arc<R>,
}

impl<R: RowRepository> LoadRowsUseCase<R> {
    pub fn new(row_repository: Arc<R>) -> Self {
        Self { row_repository }
    }

    /// バンドル入力（`sku`, `pzns_in_set`）を読み込む
    ///
    /// `sku` が空の行は読み飛ばす。
    ///
    /// # Errors
    ///
    /// - ファイルが読めない場合
    /// - 必要な列がない、有効な行がない、構成商品コードが空の行がある場合
    ///   （`PipelineError::Validation`）
    pub async fn load_bundles(&self, path: &Path) -> Result<Vec<InputRow>> {
        let table = self.row_repository.read_table(path).await?;
        let sku = require_column(&table, SKU_COLUMN)?;
        let members = require_column(&table, MEMBERS_COLUMN)?;

        let mut rows = Vec::with_capacity(table.records.len());
        for (index, record) in table.records.iter().enumerate() {
            let bundle_code = field(record, sku);
            if bundle_code.is_empty() {
                warn!("Skipping line {}: empty {}", index + 2, SKU_COLUMN);
                continue;
            }

            let row = InputRow::parse(bundle_code, field(record, members)).map_err(|e| {
                PipelineError::Validation(format!("line {}: {}", index + 2, e))
            })?;
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(
                PipelineError::Validation("input contains no bundle rows".to_string()).into(),
            );
        }

        info!("Loaded {} bundle rows", rows.len());
        Ok(rows)
    }

    /// 商品入力（`sku`）を読み込む
    ///
    /// 空のコードは読み飛ばし、重複は最初の出現のみ残す（入力順を保持）。
    ///
    /// # Errors
    ///
    /// ファイルが読めない場合、または `sku` 列や有効なコードがない場合
    pub async fn load_products(&self, path: &Path) -> Result<Vec<String>> {
        let table = self.row_repository.read_table(path).await?;
        let sku = require_column(&table, SKU_COLUMN)?;

        let mut seen = HashSet::new();
        let codes: Vec<String> = table
            .records
            .iter()
            .map(|record| field(record, sku))
            .filter(|code| !code.is_empty())
            .filter(|code| seen.insert(code.to_string()))
            .map(str::to_string)
            .collect();

        if codes.is_empty() {
            return Err(
                PipelineError::Validation("input contains no product codes".to_string()).into(),
            );
        }

        info!("Loaded {} product codes", codes.len());
        Ok(codes)
    }
}

fn require_column(table: &RawTable, name: &str) -> Result<usize, PipelineError> {
    table.column_index(name).ok_or_else(|| {
        PipelineError::Validation(format!(
            "missing required column '{}' (found: {})",
            name,
            table.headers.join(", ")
        ))
    })
}

fn field(record: &[String], index: usize) -> &str {
    record.get(index).map(|f| f.trim()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct MockRowRepository {
        table: RawTable,
    }

    #[async_trait]
    impl RowRepository for MockRowRepository {
        async fn read_table(&self, _path: &Path) -> Result<RawTable> {
            Ok(self.table.clone())
        }
    }

    fn use_case(headers: &[&str], records: &[&[&str]]) -> LoadRowsUseCase<MockRowRepository> {
        let table = RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            records: records
                .iter()
                .map(|r| r.iter().map(|f| f.to_string()).collect())
                .collect(),
        };
        LoadRowsUseCase::new(Arc::new(MockRowRepository { table }))
    }

    fn validation_message(err: anyhow::Error) -> String {
        match err.downcast::<PipelineError>() {
            Ok(PipelineError::Validation(message)) => message,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_bundles() {
        let uc = use_case(
            &["SKU ", "PZNS_in_set"],
            &[&["B1", "100,100"], &["", "999"], &["B2", "200, 300"]],
        );

        let rows = uc.load_bundles(Path::new("input.csv")).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].bundle_code(), "B1");
        assert!(rows[0].is_uniform());
        assert_eq!(rows[1].member_codes(), &["200".to_string(), "300".to_string()]);
    }

    #[tokio::test]
    async fn test_load_bundles_missing_column() {
        let uc = use_case(&["sku"], &[&["B1"]]);

        let err = uc.load_bundles(Path::new("input.csv")).await.unwrap_err();

        assert!(validation_message(err).contains(MEMBERS_COLUMN));
    }

    #[tokio::test]
    async fn test_load_bundles_empty_members() {
        let uc = use_case(&["sku", "pzns_in_set"], &[&["B1", "100"], &["B2", " , "]]);

        let err = uc.load_bundles(Path::new("input.csv")).await.unwrap_err();

        assert!(validation_message(err).starts_with("line 3"));
    }

    #[tokio::test]
    async fn test_load_bundles_short_record() {
        let uc = use_case(&["sku", "pzns_in_set"], &[&["B1"]]);

        let result = uc.load_bundles(Path::new("input.csv")).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_bundles_empty_table() {
        let uc = use_case(&["sku", "pzns_in_set"], &[]);

        let err = uc.load_bundles(Path::new("input.csv")).await.unwrap_err();

        assert!(validation_message(err).contains("no bundle rows"));
    }

    #[tokio::test]
    async fn test_load_products_dedups_in_order() {
        let uc = use_case(
            &["name", "sku"],
            &[&["a", "300"], &["b", "100"], &["c", "300"], &["d", ""]],
        );

        let codes = uc.load_products(Path::new("input.csv")).await.unwrap();

        assert_eq!(codes, vec!["300", "100"]);
    }

    #[tokio::test]
    async fn test_load_products_missing_column() {
        let uc = use_case(&["code"], &[&["100"]]);

        let err = uc.load_products(Path::new("input.csv")).await.unwrap_err();

        assert!(validation_message(err).contains(SKU_COLUMN));
    }
}
