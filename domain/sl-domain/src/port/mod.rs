//! ポート定義
//!
//! driving: 外部（UI/バイナリ）から呼ばれる入口
//! driven: ドメインが外部に求める機能

pub mod driven;
pub mod driving;
