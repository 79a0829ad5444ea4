//! # Domain Services
//!
//! エンティティに属さないビジネスルール
//!
//! - **compositor**: 商品画像のトリミング・タイル合成・キャンバスへの配置
//! - **naming**: 成果物のフォルダ構成とファイル命名規則

pub mod compositor;
pub mod naming;
