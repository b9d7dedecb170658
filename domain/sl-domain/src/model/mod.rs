//! ドメインモデル
//!
//! 標準ライブラリのみ使用（外部依存なし）
//! 値オブジェクト、セッション、設定型を定義

mod action;   // 入力分類の結果と違反イベント
mod config;   // ロック設定（解除資格情報、証拠、通知、UI）
mod document; // 設定ドキュメントの値表現
mod evidence; // 証拠バンドルと通知メッセージ
mod filter;   // 低レベルフィルタの入力と判定
mod key;      // キー識別子（仮想キーコード）
mod language; // 言語設定（日本語/英語）
mod session;  // ロックセッション状態

pub use action::*;
pub use config::*;
pub use document::*;
pub use evidence::*;
pub use filter::*;
pub use key::*;
pub use language::*;
pub use session::*;
