//! ログライターポート

use crate::error::DomainError;

/// ログレベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// 活動ログレコード（JSONLの1行）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockLogRecord {
    /// ISO8601タイムスタンプ
    pub timestamp: String,
    pub level: LogLevel,
    /// 出力元（engine/hook/evidence/notifier 等）
    pub component: String,
    pub message: String,
}

/// ログライターポート
pub trait LogWriter: Send + Sync {
    /// 1レコード書込
    fn write_event(&self, record: &LockLogRecord) -> Result<(), DomainError>;

    /// 必要に応じてローテーション
    fn rotate_if_needed(&self) -> Result<(), DomainError>;

    /// ログの場所（通知本文に載せる）
    fn location(&self) -> String;
}
