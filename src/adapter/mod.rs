//! Adapter Layer
//!
//! 外部システム（画像CDN, ファイルシステム, ZIP/CSV）との統合

pub mod config;
pub mod http;
pub mod repositories;
