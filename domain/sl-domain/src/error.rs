//! ドメインエラー型
//!
//! 標準ライブラリのみ使用（外部エラーハンドリングクレートなし）

use std::fmt;

/// ドメイン層のエラー型
/// 各バリアントは特定の失敗シナリオを表現
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// レジストリアクセス拒否
    RegistryAccessDenied(String),

    /// 設定値の矛盾（セッション構築を中止する）
    InvalidConfig(String),

    /// 設定ファイルの読み込み失敗
    ConfigLoadFailed(String),

    /// バリデーションエラー
    ValidationError(String),

    /// ファイルI/Oエラー
    IoError(String),

    /// 不明なエラー
    Unknown(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegistryAccessDenied(msg) => write!(f, "Registry access denied: {}", msg),
            Self::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::ConfigLoadFailed(msg) => write!(f, "Configuration load failed: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::IoError(msg) => write!(f, "IO error: {}", msg),
            Self::Unknown(msg) => write!(f, "Unknown error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

/// 低レベル入力フックのエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// OSへの登録失敗（OSエラーコード）
    InstallFailed(u32),
    /// 既に登録済み（呼び出し側で抑止される）
    AlreadyInstalled,
    /// 登録解除失敗（OSエラーコード）
    RemoveFailed(u32),
    /// このプラットフォームでは未対応
    Unsupported,
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InstallFailed(code) => write!(f, "Input hook install failed (os error {})", code),
            Self::AlreadyInstalled => write!(f, "Input hook already installed"),
            Self::RemoveFailed(code) => write!(f, "Input hook removal failed (os error {})", code),
            Self::Unsupported => write!(f, "Input hook is not supported on this platform"),
        }
    }
}

impl std::error::Error for HookError {}

/// 証拠取得（画面/カメラ/音声）のエラー
///
/// 常に「アーティファクトなし」に格下げされ、パイプラインを中断しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// 設定で無効
    Disabled,
    /// デバイスが見つからない、または開けない
    DeviceUnavailable(String),
    /// 取得または保存に失敗
    Failed(String),
    /// このプラットフォームでは未対応
    Unsupported,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "Capture disabled"),
            Self::DeviceUnavailable(msg) => write!(f, "Capture device unavailable: {}", msg),
            Self::Failed(msg) => write!(f, "Capture failed: {}", msg),
            Self::Unsupported => write!(f, "Capture not supported on this platform"),
        }
    }
}

impl std::error::Error for CaptureError {}

/// 通知トランスポートのエラー
///
/// 常に「通知スキップ」に格下げされる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// ホストや資格情報が未設定
    NotConfigured(String),
    /// メッセージ組み立て失敗
    Message(String),
    /// 配送失敗
    Delivery(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured(msg) => write!(f, "Transport not configured: {}", msg),
            Self::Message(msg) => write!(f, "Message build failed: {}", msg),
            Self::Delivery(msg) => write!(f, "Delivery failed: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_error_display_includes_os_code() {
        let text = HookError::InstallFailed(5).to_string();
        assert!(text.contains("os error 5"));
    }

    #[test]
    fn domain_error_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(DomainError::InvalidConfig("x".into()));
        assert_eq!(err.to_string(), "Invalid configuration: x");
    }
}
