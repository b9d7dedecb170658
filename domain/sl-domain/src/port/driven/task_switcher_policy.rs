//! タスク切替UI抑止ポリシーのポート

use crate::error::DomainError;

/// システムのタスク切替UI（タスクマネージャー）の利用可否を切り替える
pub trait TaskSwitcherPolicy: Send + Sync {
    /// 抑止する
    fn disable(&self) -> Result<(), DomainError>;

    /// 元に戻す
    fn restore(&self) -> Result<(), DomainError>;
}
