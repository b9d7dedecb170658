//! sl-composition: 各実行ファイル向けのランタイムを組み立てるコンポジションルート。
//! ドメイン／アプリケーション／各種アダプタをここで配線し、apps/* はこのクレートだけに依存する。

pub mod config;
pub mod error;
pub mod lock;

// apps が内側レイヤーの型に触れる必要がある場合は、ここから辿れるようにする。
pub use sl_domain as domain;
pub use sl_log_utils as log_utils;
pub use sl_ui_common as ui_common;

pub use config::{ConfigListing, ConfigRuntime, TOGGLE_FEATURES};
pub use lock::LockRuntime;
