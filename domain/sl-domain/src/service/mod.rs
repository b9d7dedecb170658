//! ドメインサービス（純粋関数）

mod config_document;
mod key_classifier;
mod key_filter;
mod mail_composer;

pub use config_document::*;
pub use key_classifier::*;
pub use key_filter::*;
pub use mail_composer::*;
