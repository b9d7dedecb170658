//! JSONL活動ログ
//!
//! 1レコード1行。サイズ上限を超えたらUTCスタンプ付きの名前に退避し、古い退避ファイルを間引く。

use crate::ensure_parent_dir;
use sl_domain::error::DomainError;
use sl_domain::port::driven::{LockLogRecord, LogWriter};
use sl_domain::time::file_stamp;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_KEEP_ROTATED: usize = 5;

#[derive(Debug)]
pub struct ActivityLog {
    path: PathBuf,
    max_log_bytes: u64,
    keep_rotated: usize,
    /// 追記とローテーションの排他
    write_lock: Mutex<()>,
}

impl ActivityLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_log_bytes: DEFAULT_MAX_LOG_BYTES,
            keep_rotated: DEFAULT_KEEP_ROTATED,
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_limits(mut self, max_log_bytes: u64, keep_rotated: usize) -> Self {
        self.max_log_bytes = max_log_bytes;
        self.keep_rotated = keep_rotated;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_json_value(&self, value: &serde_json::Value) -> Result<(), DomainError> {
        ensure_parent_dir(&self.path)?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| DomainError::IoError(format!("open log {:?}: {e}", self.path)))?;
        let line = serde_json::to_string(value)
            .map_err(|e| DomainError::IoError(format!("serialize log: {e}")))?;
        f.write_all(line.as_bytes())
            .and_then(|_| f.write_all(b"\n"))
            .map_err(|e| DomainError::IoError(format!("write log: {e}")))?;
        Ok(())
    }

    fn rotate_if_large(&self) -> Result<(), DomainError> {
        let Ok(meta) = fs::metadata(&self.path) else {
            return Ok(());
        };
        if meta.len() <= self.max_log_bytes {
            return Ok(());
        }
        let rotated = self.rotated_path();
        fs::rename(&self.path, &rotated).map_err(|e| DomainError::IoError(format!("rotate log: {e}")))?;
        self.prune_rotated()
    }

    fn rotated_path(&self) -> PathBuf {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let stamp = file_stamp(now_ms);
        let mut candidate = self.path.with_extension(format!("{}.jsonl", stamp));
        let mut n = 1;
        while candidate.exists() {
            candidate = self.path.with_extension(format!("{}-{}.jsonl", stamp, n));
            n += 1;
        }
        candidate
    }

    /// 退避ファイル（`<stem>.<stamp>.jsonl`）を新しい順に `keep_rotated` 件だけ残す
    fn prune_rotated(&self) -> Result<(), DomainError> {
        let (Some(dir), Some(stem)) = (self.path.parent(), self.path.file_stem()) else {
            return Ok(());
        };
        let prefix = format!("{}.", stem.to_string_lossy());
        let current = self.path.file_name().map(|n| n.to_os_string());
        let entries = fs::read_dir(dir).map_err(|e| DomainError::IoError(format!("read log dir: {e}")))?;
        let mut rotated: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| Some(entry.file_name()) != current)
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                name.starts_with(&prefix) && name.ends_with(".jsonl")
            })
            .map(|entry| entry.path())
            .collect();
        // スタンプは辞書順 = 時刻順
        rotated.sort();
        let excess = rotated.len().saturating_sub(self.keep_rotated);
        for old in rotated.into_iter().take(excess) {
            let _ = fs::remove_file(old);
        }
        Ok(())
    }
}

impl LogWriter for ActivityLog {
    fn write_event(&self, record: &LockLogRecord) -> Result<(), DomainError> {
        let value = serde_json::json!({
            "timestamp": record.timestamp,
            "level": record.level.as_str(),
            "component": record.component,
            "message": record.message,
        });
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        self.append_json_value(&value)?;
        let _ = self.rotate_if_large();
        Ok(())
    }

    fn rotate_if_needed(&self) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        self.rotate_if_large()
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
