//! CLI Argument Parsing
//!
//! CLIの引数解析

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::domain::entities::fetch::FallbackMode;
use crate::domain::services::compositor::CompositeLayout;

/// 処理フロー
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// `sku;pzns_in_set` のバンドル入力を合成してパッケージング
    Bundles,
    /// `sku` の商品入力をそのままダウンロードしてパッケージング
    Products,
}

/// フォールバックモードの指定
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackArg {
    None,
    SingleLocale,
    LocalePair,
}

impl FallbackArg {
    /// 設定のロケールタグと組み合わせてフォールバックモードを作る
    pub fn to_mode(self, single_locale_tag: &str, locale_pair_tags: &[String; 2]) -> FallbackMode {
        match self {
            FallbackArg::None => FallbackMode::None,
            FallbackArg::SingleLocale => FallbackMode::SingleLocale(single_locale_tag.to_string()),
            FallbackArg::LocalePair => FallbackMode::LocalePair(
                locale_pair_tags[0].clone(),
                locale_pair_tags[1].clone(),
            ),
        }
    }
}

/// 商品画像を一括ダウンロード・合成してアーカイブするCLI
#[derive(Parser, Debug, Clone)]
#[command(name = "imgbundle")]
#[command(about = "Bulk-download, compose and package product images", long_about = None)]
pub struct Args {
    /// Input table (`;`-delimited)
    #[arg(short, long, required_unless_present = "reset")]
    pub input: Option<PathBuf>,

    /// Processing flow
    #[arg(long, value_enum, default_value_t = Flow::Bundles)]
    pub flow: Flow,

    /// Tiling layout for uniform bundles (horizontal, vertical, automatic)
    #[arg(long, default_value = "automatic")]
    pub layout: CompositeLayout,

    /// Fallback mode for image variants
    #[arg(long, value_enum, default_value_t = FallbackArg::None)]
    pub fallback: FallbackArg,

    /// Maximum in-flight HTTP requests (overrides config)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Session ID to create or reuse (defaults to a new UUID)
    #[arg(short, long)]
    pub session: Option<String>,

    /// Config file path
    #[arg(short, long, default_value = "./.imgbundle/config.json")]
    pub config: String,

    /// Validate the input and print candidate URLs without fetching
    #[arg(long)]
    pub dry_run: bool,

    /// Remove the session directory and exit
    #[arg(long, requires = "session")]
    pub reset: bool,
}
