//! 低レベルキーボードフィルタの入力と判定

use super::KeyId;

/// 押下中の修飾キー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub win: bool,
}

/// フックが受け取ったキー押下イベント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyId,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: KeyId, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: KeyId) -> Self {
        Self::new(key, Modifiers::default())
    }
}

/// フィルタの判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// OSにもアプリにも渡さない
    Block,
    /// 次のフックへ渡す
    PassThrough,
}
