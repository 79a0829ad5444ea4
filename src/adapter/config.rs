//! Configuration
//!
//! JSON設定ファイルの読み込み

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

fn default_work_dir() -> String {
    "./.imgbundle/sessions".to_string()
}

fn default_concurrency_limit() -> usize {
    100
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("imgbundle/{}", env!("CARGO_PKG_VERSION"))
}

fn default_tags() -> Vec<String> {
    vec!["1".to_string(), "2".to_string(), "3".to_string()]
}

fn default_code_prefix() -> String {
    "D".to_string()
}

fn default_locale_pair_tags() -> [String; 2] {
    ["1-fr".to_string(), "1-nl".to_string()]
}

fn default_single_locale_tag() -> String {
    "1-fr".to_string()
}

fn default_archive_folder() -> String {
    "bundle_images".to_string()
}

fn default_jpeg_quality() -> u8 {
    95
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// 画像CDNのベースURL（`{base_url}/{code}-p{tag}.jpg`）
    pub base_url: String,

    #[serde(default = "default_work_dir")]
    pub work_dir: String,

    // HTTP
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    // Vendor addressing
    #[serde(default = "default_tags")]
    pub default_tags: Vec<String>,
    #[serde(default = "default_code_prefix")]
    pub code_prefix: String,
    #[serde(default = "default_locale_pair_tags")]
    pub locale_pair_tags: [String; 2],
    #[serde(default = "default_single_locale_tag")]
    pub single_locale_tag: String,

    // Output
    #[serde(default = "default_archive_folder")]
    pub archive_folder: String,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).context(format!("Failed to read config file: {}", path))?;
        let config: Config =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// ベースURL以外は全てデフォルト値の設定
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            work_dir: default_work_dir(),
            concurrency_limit: default_concurrency_limit(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            default_tags: default_tags(),
            code_prefix: default_code_prefix(),
            locale_pair_tags: default_locale_pair_tags(),
            single_locale_tag: default_single_locale_tag(),
            archive_folder: default_archive_folder(),
            jpeg_quality: default_jpeg_quality(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        if self.concurrency_limit == 0 {
            bail!("concurrency_limit must be at least 1");
        }
        if self.default_tags.is_empty() {
            bail!("default_tags must contain at least one extension tag");
        }
        if self.archive_folder.trim().is_empty() || self.archive_folder.contains('/') {
            bail!("archive_folder must be a single folder name");
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            bail!("jpeg_quality must be between 1 and 100");
        }
        Ok(())
    }

    /// `~` を展開したセッションのベースディレクトリ
    pub fn work_dir_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.work_dir).as_ref())
    }
}
