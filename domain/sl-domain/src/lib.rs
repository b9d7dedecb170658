//! SecureLock ドメイン層
//!
//! ロックエンジンの中核となる型と判定ロジック。外部依存ゼロでRust標準ライブラリのみ使用。
//! ヘキサゴナルアーキテクチャの最内層。

pub mod error;   // ドメインエラー定義
pub mod model;   // ドメインモデル（値オブジェクト、設定、セッション）
pub mod port;    // ポート（driving/driven）
pub mod service; // 純粋なドメインサービス
pub mod time;    // UTC時刻の整形

pub use error::{CaptureError, DomainError, HookError, TransportError};
