//! ロックセッション状態

/// ロック状態（Unlocked は終端）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Locked,
    Unlocking,
    Unlocked,
}

impl LockState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocking => "unlocking",
            Self::Unlocked => "unlocked",
        }
    }
}

/// OSのフックハンドル（不透明値）
///
/// 複製不可。所有者はシステムフックマネージャーのみ。
#[derive(Debug, PartialEq, Eq)]
pub struct HookHandle(usize);

impl HookHandle {
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> usize {
        self.0
    }
}

/// ロック状態機械だけが変更するセッション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSession {
    pub state: LockState,
    pub hook_installed: bool,
    pub policy_overridden: bool,
    /// エポックミリ秒
    pub last_capture_at: Option<u64>,
}

impl LockSession {
    pub fn new() -> Self {
        Self {
            state: LockState::Locked,
            hook_installed: false,
            policy_overridden: false,
            last_capture_at: None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.state == LockState::Locked
    }
}

impl Default for LockSession {
    fn default() -> Self {
        Self::new()
    }
}

/// ロック開始要求
#[derive(Debug, Clone, Default)]
pub struct LockRequest {
    /// 設定に関わらずフックとポリシー上書きを使わない（開発用）
    pub unprotected: bool,
}

/// セッション終了時の集計
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LockSessionReport {
    pub violations: u64,
    pub fires_accepted: u64,
    pub fires_suppressed: u64,
    pub fires_dropped: u64,
    pub blocked_combinations: u64,
    pub hook_installed: bool,
    pub policy_overridden: bool,
    pub unlocked: bool,
}
