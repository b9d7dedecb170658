//! sl-app: アプリケーション層。
//! 設定の読込、エンジンの構築、ロック画面への受け渡し、セッション集計の記録を行う。

pub mod lock;

pub use lock::{LockDeps, LockService, lock_view};
