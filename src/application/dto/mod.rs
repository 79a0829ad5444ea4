//! # Data Transfer Objects
//!
//! ユースケース間で受け渡すデータ

pub mod batch_report;
pub mod process_options;
pub mod progress;
