//! ロック設定
//!
//! 1回のロックセッション中は不変。設定ファイルからの読込と検証は
//! `service::config_document` が担当する。

use super::{KeyId, Language, UnlockMode};
use crate::DomainError;

pub const MIN_PASSCODE_LEN: usize = 4;
pub const MAX_COOLDOWN_SECONDS: u64 = 3_600;
pub const MIN_AUDIO_SECONDS: u32 = 1;
pub const MAX_AUDIO_SECONDS: u32 = 60;

const DEFAULT_PASSCODE: &str = "123456";
const DEFAULT_COOLDOWN_SECONDS: u64 = 30;
const DEFAULT_AUDIO_SECONDS: u32 = 5;

/// 解除資格情報と保護機能の切替
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockConfig {
    pub mode: UnlockMode,
    /// None の場合、どのキーでも解除できない（運用者が選んだ解除不能モード）
    pub unlock_key: Option<KeyId>,
    /// 押しても違反にならないキー
    pub safe_key: Option<KeyId>,
    pub passcode: String,
    pub cooldown_seconds: u64,
    pub mouse_triggers_enabled: bool,
    pub security_mode_enabled: bool,
    pub block_system_keys: bool,
    pub disable_task_switcher: bool,
}

impl Default for UnlockConfig {
    fn default() -> Self {
        Self {
            mode: UnlockMode::SingleKey,
            unlock_key: Some(KeyId::F12),
            safe_key: KeyId::from_name("Y"),
            passcode: DEFAULT_PASSCODE.to_string(),
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
            mouse_triggers_enabled: true,
            security_mode_enabled: true,
            block_system_keys: true,
            disable_task_switcher: false,
        }
    }
}

impl UnlockConfig {
    /// 分類ロジックが矛盾なく動けるかを検証する。
    /// ここで失敗した場合はセッションを構築しない。
    pub fn validate(&self) -> Result<(), DomainError> {
        match self.mode {
            UnlockMode::Passcode => {
                if self.passcode.chars().count() < MIN_PASSCODE_LEN {
                    return Err(DomainError::InvalidConfig(format!(
                        "passcode must be at least {} characters",
                        MIN_PASSCODE_LEN
                    )));
                }
            }
            UnlockMode::SingleKey => {
                if let (Some(unlock), Some(safe)) = (self.unlock_key, self.safe_key) {
                    if unlock == safe {
                        return Err(DomainError::InvalidConfig(format!(
                            "unlock_key and safe_key must differ (both {})",
                            unlock
                        )));
                    }
                }
            }
        }
        if self.cooldown_seconds > MAX_COOLDOWN_SECONDS {
            return Err(DomainError::InvalidConfig(format!(
                "cooldown_seconds must be 0-{} (got {})",
                MAX_COOLDOWN_SECONDS, self.cooldown_seconds
            )));
        }
        Ok(())
    }

    /// 解除キー未設定の単一キーモード
    pub fn is_no_escape(&self) -> bool {
        self.mode == UnlockMode::SingleKey && self.unlock_key.is_none()
    }

    /// システムキー遮断フックを入れるか
    pub fn wants_input_filter(&self) -> bool {
        self.security_mode_enabled && self.block_system_keys
    }

    /// タスク切替UIを抑止するか
    pub fn wants_policy_override(&self) -> bool {
        self.security_mode_enabled && self.disable_task_switcher
    }
}

/// 証拠取得の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceSettings {
    pub screenshot_enabled: bool,
    pub camera_enabled: bool,
    pub audio_enabled: bool,
    pub audio_seconds: u32,
    pub include_system_info: bool,
}

impl Default for EvidenceSettings {
    fn default() -> Self {
        Self {
            screenshot_enabled: true,
            camera_enabled: false,
            audio_enabled: false,
            audio_seconds: DEFAULT_AUDIO_SECONDS,
            include_system_info: true,
        }
    }
}

/// 通知の設定（送信先はトランスポート側の環境設定）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifySettings {
    pub email_enabled: bool,
    pub attach_media: bool,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            email_enabled: false,
            attach_media: true,
        }
    }
}

/// 配色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn to_code(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

/// ロック画面の表示設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiSettings {
    pub show_consent_banner: bool,
    pub theme: Theme,
    pub show_animations: bool,
    pub language: Language,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            show_consent_banner: true,
            theme: Theme::Dark,
            show_animations: true,
            language: Language::Japanese,
        }
    }
}

/// 設定ファイル全体に対応する設定
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LockConfig {
    pub unlock: UnlockConfig,
    pub evidence: EvidenceSettings,
    pub notify: NotifySettings,
    pub ui: UiSettings,
}

impl LockConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        self.unlock.validate()?;
        if !(MIN_AUDIO_SECONDS..=MAX_AUDIO_SECONDS).contains(&self.evidence.audio_seconds) {
            return Err(DomainError::InvalidConfig(format!(
                "audio_seconds must be {}-{} (got {})",
                MIN_AUDIO_SECONDS, MAX_AUDIO_SECONDS, self.evidence.audio_seconds
            )));
        }
        Ok(())
    }
}
