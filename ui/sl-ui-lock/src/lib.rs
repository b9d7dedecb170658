//! SecureLock ロック画面
//!
//! 全画面・最前面のウィンドウで入力を受け、すべてエンジンへ渡す。
//! Windows 以外では標準入力を読む開発用の代替画面になる。

pub mod error;
pub mod input;
mod screen;

pub use input::{Effect, PASSCODE_MAX_CHARS, SurfaceState};
pub use screen::LockScreen;
