//! 駆動ポート（出力インターフェース）。
//!
//! ドメインが外部に求める機能を定義する。
//! インフラ層のアダプタが実装する。
//! 証拠取得はワーカースレッドから呼ばれるため、全ポートが Send + Sync を要求する。

mod capture;
mod clock;
mod config_repository;
mod input_filter_host;
mod lock_surface;
mod log_writer;
mod mail_transport;
mod modifier_state;
mod task_switcher_policy;

pub use capture::*;
pub use clock::*;
pub use config_repository::*;
pub use input_filter_host::*;
pub use lock_surface::*;
pub use log_writer::*;
pub use mail_transport::*;
pub use modifier_state::*;
pub use task_switcher_policy::*;
