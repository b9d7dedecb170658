//! 活動ログへの書込ヘルパー（失敗は握りつぶす）

use sl_domain::port::driven::{Clock, LockLogRecord, LogLevel, LogWriter};
use std::any::Any;

pub(crate) fn log_event(
    log: &dyn LogWriter,
    clock: &dyn Clock,
    level: LogLevel,
    component: &str,
    message: impl Into<String>,
) {
    let record = LockLogRecord {
        timestamp: clock.now_iso8601(),
        level,
        component: component.to_string(),
        message: message.into(),
    };
    let _ = log.write_event(&record);
}

/// `catch_unwind` で捕まえたパニックの内容
pub(crate) fn panic_text(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
