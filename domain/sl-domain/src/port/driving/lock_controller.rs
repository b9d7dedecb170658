//! ロック状態機械の操作ポート

use crate::model::{Action, KeyId, LockState, PointerKind};

/// UIが入力を渡す先
///
/// `classify_*` と `submit_passcode` は入力経路上で呼ばれるため、ブロッキングI/Oを行わない。
pub trait LockController {
    /// キー押下を分類
    fn classify_key(&self, key: KeyId, is_repeat: bool) -> Action;

    /// ポインタイベントを分類
    fn classify_pointer(&self, kind: PointerKind) -> Action;

    /// パスコードを照合（入力バッファは呼び出し側が結果に関わらずクリアする）
    fn submit_passcode(&self, text: &str) -> Action;

    /// 解除（冪等）
    fn unlock(&mut self);

    /// 現在の状態
    fn state(&self) -> LockState;

    /// プロセス終了時の後始末（ポリシー復元とフック解除）
    fn teardown(&mut self);
}
