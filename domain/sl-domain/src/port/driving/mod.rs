//! 駆動ポート（外部から呼び出されるユースケースの入口）
//!
//! UIとバイナリが呼び出すインターフェースを定義する。

mod lock_controller;
mod lock_use_case;

pub use lock_controller::*;
pub use lock_use_case::*;
