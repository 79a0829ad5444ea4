//! # Domain Layer
//!
//! このモジュールは画像バンドル処理の核心的なルールとエンティティを定義します。
//!
//! ## 特徴
//!
//! - HTTP、ファイルシステム、アーカイブ形式について何も知らない
//! - 画像の合成は純粋関数として実装（I/Oなし）
//! - Repository trait を通じて外部システムを抽象化
//!
//! ## 構成要素
//!
//! - **entities**: ビジネスエンティティ（InputRow, FetchResult, SessionContextなど）
//! - **repositories**: Repository trait（インターフェース定義のみ）
//! - **services**: Domain Service（画像合成、成果物の命名規則）
//! - **error**: パイプラインのエラー分類

pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
