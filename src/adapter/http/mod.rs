//! HTTP Adapter Modules
//!
//! 画像CDNへのHTTPアクセス

pub mod addressing;
pub mod client;
