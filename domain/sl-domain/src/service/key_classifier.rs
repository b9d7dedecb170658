//! 入力分類
//!
//! 状態を持たない判定のみ。ロック状態や違反の報告はエンジン側が扱う。

use crate::model::{Action, KeyId, PointerKind, UnlockConfig, UnlockMode};

pub const REASON_ESCAPE_ATTEMPT: &str = "escape attempt";
pub const REASON_WRONG_PASSCODE: &str = "wrong passcode";

/// キー押下を分類する
///
/// - セーフキーはモードに関わらず無視
/// - 単一キーモード: リピート無視、解除キーで Unlock、それ以外は違反
/// - パスコードモード: Esc のみ違反（リピートでも違反）
pub fn classify_key(config: &UnlockConfig, key: KeyId, is_repeat: bool) -> Action {
    if config.safe_key == Some(key) {
        return Action::Ignore;
    }
    match config.mode {
        UnlockMode::SingleKey => {
            if is_repeat {
                Action::Ignore
            } else if config.unlock_key == Some(key) {
                Action::Unlock
            } else {
                Action::Violation(format!("wrong key: {}", key))
            }
        }
        UnlockMode::Passcode => {
            if key == KeyId::ESCAPE {
                Action::Violation(REASON_ESCAPE_ATTEMPT.to_string())
            } else {
                Action::Ignore
            }
        }
    }
}

/// ポインタイベントを分類する（押下と移動のみ違反）
pub fn classify_pointer(config: &UnlockConfig, kind: PointerKind) -> Action {
    if config.mode != UnlockMode::SingleKey || !config.mouse_triggers_enabled {
        return Action::Ignore;
    }
    match kind {
        PointerKind::Press => Action::Violation("mouse click".to_string()),
        PointerKind::Move => Action::Violation("mouse move".to_string()),
        PointerKind::Release | PointerKind::Wheel => Action::Ignore,
    }
}

/// パスコードを照合する（完全一致）
pub fn check_passcode(config: &UnlockConfig, text: &str) -> Action {
    if text == config.passcode {
        Action::Unlock
    } else {
        Action::Violation(REASON_WRONG_PASSCODE.to_string())
    }
}
