//! # Use Cases
//!
//! アプリケーションのビジネスフロー（ユースケース）
//!
//! ## ユースケース
//!
//! - **LoadRowsUseCase**: 入力テーブルの読み込みと検証
//! - **ProcessBundlesUseCase**: バンドル画像の取得・合成・保存
//! - **DownloadProductsUseCase**: 商品画像の一括ダウンロード
//! - **PackageSessionUseCase**: アーカイブとCSVレポートの作成

mod artifacts;

pub mod download_products;
pub mod load_rows;
pub mod package_session;
pub mod process_bundles;
