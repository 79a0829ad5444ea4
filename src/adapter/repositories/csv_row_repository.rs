//! CSV Row Repository Implementation
//!
//! RowRepositoryの区切り文字付きテキスト実装（`;` 区切り）

use anyhow::{Context, Result};
use async_trait::async_trait;
use csv::{ReaderBuilder, Trim};
use log::info;
use std::fs;
use std::path::Path;

use crate::domain::repositories::row_repository::{RawTable, RowRepository};

/// 入力ファイルの区切り文字
pub const DELIMITER: u8 = b';';

/// CSVベースの行リポジトリ
pub struct CsvRowRepository;

impl CsvRowRepository {
    /// 新しいリポジトリを作成
    pub fn new() -> Self {
        Self
    }

    /// バイト列からテーブルをパースする
    ///
    /// 先頭のBOMは除去し、全ての列が空の行は読み飛ばす。
    /// UTF-8として不正なバイトは置換文字に変換する。
    pub fn parse_table(content: &[u8]) -> Result<RawTable> {
        let mut reader = ReaderBuilder::new()
            .delimiter(DELIMITER)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(content);

        let headers = reader
            .byte_headers()
            .context("Failed to read header row")?
            .iter()
            .map(|h| {
                String::from_utf8_lossy(h)
                    .trim_start_matches('\u{feff}')
                    .trim()
                    .to_string()
            })
            .collect();

        let mut records = Vec::new();
        for (index, record) in reader.byte_records().enumerate() {
            // 1-based line number, after the header
            let record = record.context(format!("Failed to parse line {}", index + 2))?;
            let fields: Vec<String> = record
                .iter()
                .map(|f| String::from_utf8_lossy(f).to_string())
                .collect();

            if fields.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            records.push(fields);
        }

        Ok(RawTable { headers, records })
    }

    /// ファイルを読み込んでパースする（同期処理）
    fn read_table_sync(path: &Path) -> Result<RawTable> {
        let content =
            fs::read(path).context(format!("Failed to read input file: {}", path.display()))?;
        let table = Self::parse_table(&content)?;

        info!(
            "Read {} rows from {}",
            table.records.len(),
            path.display()
        );

        Ok(table)
    }
}

#[async_trait]
impl RowRepository for CsvRowRepository {
    async fn read_table(&self, path: &Path) -> Result<RawTable> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::read_table_sync(&path))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to spawn blocking task: {}", e))?
    }
}

impl Default for CsvRowRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_table_semicolon_delimited() {
        let content = "sku;pzns_in_set\nB1;100,100\nB2; 200,300 \n";

        let table = CsvRowRepository::parse_table(content.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["sku", "pzns_in_set"]);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0], vec!["B1", "100,100"]);
        assert_eq!(table.records[1], vec!["B2", "200,300"]);
    }

    #[test]
    fn test_parse_table_strips_bom_and_skips_blank_lines() {
        let content = "\u{feff}SKU;PZNS_IN_SET\nB1;100\n;\n\nB2;200\n";

        let table = CsvRowRepository::parse_table(content.as_bytes()).unwrap();

        assert_eq!(table.headers[0], "SKU");
        assert_eq!(table.column_index("sku"), Some(0));
        assert_eq!(table.records.len(), 2);
    }

    #[test]
    fn test_parse_table_ragged_rows() {
        let content = "name;sku;pzns_in_set\nfoo;B1\nbar;B2;200;extra\n";

        let table = CsvRowRepository::parse_table(content.as_bytes()).unwrap();

        assert_eq!(table.records[0].len(), 2);
        assert_eq!(table.records[1].len(), 4);
    }

    #[test]
    fn test_parse_table_latin1_is_lossy() {
        let content = b"sku;name\nB1;Cr\xe8me\n";

        let table = CsvRowRepository::parse_table(content).unwrap();

        assert_eq!(table.records[0][0], "B1");
        assert!(table.records[0][1].starts_with("Cr"));
    }

    #[tokio::test]
    async fn test_read_table_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"sku;pzns_in_set\nB1;100,100\n").unwrap();

        let repo = CsvRowRepository::new();
        let table = repo.read_table(file.path()).await.unwrap();

        assert_eq!(table.records.len(), 1);
    }

    #[tokio::test]
    async fn test_read_table_missing_file() {
        let repo = CsvRowRepository::new();
        let result = repo.read_table(Path::new("/nonexistent/input.csv")).await;
        assert!(result.is_err());
    }
}
