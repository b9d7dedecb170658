//! ファイルシステムアダプター（設定/活動ログ永続化）
//! 設定はJSONドキュメント、活動ログはJSONL（サイズでローテーション）。

mod activity_log;
mod config;
mod queued;

pub use activity_log::{ActivityLog, DEFAULT_KEEP_ROTATED, DEFAULT_MAX_LOG_BYTES};
pub use config::{JsonConfigRepository, document_from_json};
pub use queued::{DEFAULT_LOG_QUEUE_CAPACITY, QueuedLogWriter};

use sl_domain::error::DomainError;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

fn ensure_parent_dir(path: &Path) -> Result<(), DomainError> {
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(dir).map_err(|e| DomainError::IoError(format!("create_dir_all: {e}")))
}

/// 一時ファイルに書いてから置き換える
fn write_atomic(path: &Path, data: &[u8]) -> Result<(), DomainError> {
    ensure_parent_dir(path)?;
    let suffix = unique_suffix();
    let tmp_path = path.with_extension(format!("tmp.{suffix}"));
    {
        let mut f = fs::File::create(&tmp_path)
            .map_err(|e| DomainError::IoError(format!("create temp file: {e}")))?;
        f.write_all(data)
            .map_err(|e| DomainError::IoError(format!("write temp file: {e}")))?;
        let _ = f.sync_all();
    }
    if path.exists() {
        #[cfg(windows)]
        {
            if let Err(e) = replace_file(&tmp_path, path) {
                let _ = fs::remove_file(&tmp_path);
                return Err(e);
            }
            return Ok(());
        }
    }
    fs::rename(&tmp_path, path).map_err(|e| DomainError::IoError(format!("rename temp file: {e}")))?;
    Ok(())
}

fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{}.{}", std::process::id(), nanos)
}

#[cfg(windows)]
fn replace_file(src: &Path, dst: &Path) -> Result<(), DomainError> {
    use std::os::windows::ffi::OsStrExt;
    use windows::Win32::Storage::FileSystem::{REPLACE_FILE_FLAGS, ReplaceFileW};
    use windows::core::PCWSTR;

    fn to_wide(path: &Path) -> Vec<u16> {
        let mut wide: Vec<u16> = path.as_os_str().encode_wide().collect();
        wide.push(0);
        wide
    }

    let src_w = to_wide(src);
    let dst_w = to_wide(dst);
    unsafe {
        ReplaceFileW(
            PCWSTR(dst_w.as_ptr()),
            PCWSTR(src_w.as_ptr()),
            PCWSTR::null(),
            REPLACE_FILE_FLAGS(0),
            None,
            None,
        )
        .map_err(|e| DomainError::IoError(format!("ReplaceFileW failed: {}", e.message())))?;
    }
    Ok(())
}
