//! Repository Implementations
//!
//! Domain層のRepositoryトレイトの実装

pub mod csv_report_repository;
pub mod csv_row_repository;
pub mod fs_session_repository;
pub mod vendor_image_repository;
pub mod zip_archive_repository;
