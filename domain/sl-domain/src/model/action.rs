//! 入力分類の結果と違反イベント

use std::fmt;

/// ロック状態機械が入力ごとに返す判定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// 何もしない
    Ignore,
    /// 解除する（UI は `unlock()` を1回だけ呼ぶ）
    Unlock,
    /// 違反（理由付き）
    Violation(String),
}

impl Action {
    pub fn is_violation(&self) -> bool {
        matches!(self, Action::Violation(_))
    }
}

/// ポインタイベントの種別
///
/// 移動はクリックとして扱わない。違反になるのは押下と移動のみ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Press,
    Move,
    Release,
    Wheel,
}

impl PointerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Press => "press",
            Self::Move => "move",
            Self::Release => "release",
            Self::Wheel => "wheel",
        }
    }
}

/// 違反の発生源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationSource {
    Keyboard,
    Mouse,
    PasscodeMismatch,
    EscapeAttempt,
}

impl ViolationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyboard => "keyboard",
            Self::Mouse => "mouse",
            Self::PasscodeMismatch => "passcode_mismatch",
            Self::EscapeAttempt => "escape_attempt",
        }
    }
}

impl fmt::Display for ViolationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 分類で生まれ、デバウンサーが消費する違反イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationEvent {
    pub reason: String,
    /// エポックミリ秒
    pub observed_at: u64,
    /// 単調時計のミリ秒（クールダウン判定用）
    pub monotonic_ms: u64,
    pub source: ViolationSource,
}

/// デバウンス済みの証拠取得シグナル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireSignal {
    pub reason: String,
    /// エポックミリ秒
    pub when: u64,
}
