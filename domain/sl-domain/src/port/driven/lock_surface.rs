//! ロック画面（UI協調者）のポート

use crate::error::DomainError;
use crate::model::{Language, Theme, UnlockMode};
use crate::port::driving::LockController;

/// ロック画面の表示パラメータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockView {
    pub mode: UnlockMode,
    pub language: Language,
    pub theme: Theme,
    pub show_consent_banner: bool,
    pub show_animations: bool,
    /// 解除キー名（キーモードのみ、解除不能モードでは None）
    pub unlock_key_name: Option<String>,
    /// 違反にならないキーの名前
    pub safe_key_name: Option<String>,
    pub mouse_triggers_enabled: bool,
}

/// ロック画面を表示し、解除されるまで入力をコントローラーへ渡す
///
/// 実装は `Action::Unlock` を受けたら `unlock()` をちょうど1回呼び、
/// `Locked` の間はウィンドウを閉じさせないこと。
pub trait LockSurface {
    fn run(&self, controller: &mut dyn LockController, view: &LockView) -> Result<(), DomainError>;
}
