//! 設定リポジトリポート

use crate::error::DomainError;
use crate::model::{ConfigWarning, LockConfig};
use std::path::PathBuf;

/// 読込結果
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: LockConfig,
    /// 既定値に置き換えたフィールド
    pub warnings: Vec<ConfigWarning>,
    /// ファイルが無く既定値を書き出した
    pub created_default: bool,
    /// ファイルが解釈できず既定値で代替した（ファイルは変更しない）
    pub parse_error: Option<String>,
}

/// 設定ストレージポート
pub trait ConfigRepository: Send + Sync {
    /// 設定を読込（フィールド単位で既定値に置換）
    fn load(&self) -> Result<LoadedConfig, DomainError>;

    /// 設定を保存
    fn save(&self, config: &LockConfig) -> Result<(), DomainError>;

    /// 設定ファイルの存在確認
    fn exists(&self) -> bool;

    /// 設定ファイルの場所
    fn location(&self) -> PathBuf;
}
