//! # Domain Entities
//!
//! ビジネスエンティティとバリューオブジェクトを定義するモジュール
//!
//! ## エンティティ
//!
//! - **InputRow**: 入力テーブルの1行（バンドルコードと構成商品コード）
//! - **FetchCandidate / FetchResult**: 画像取得の候補と結果
//! - **ProcessingOutcome**: 1行分の処理結果
//! - **ErrorLedger**: 画像が見つからなかった商品の台帳
//! - **SessionContext**: 1セッション分の作業ディレクトリ

pub mod fetch;
pub mod input_row;
pub mod ledger;
pub mod outcome;
pub mod session;
