//! 非ブロッキングのログキュー
//!
//! 入力分類経路からのログをチャネルで書込スレッドへ渡す。満杯なら捨てて件数だけ数える。
//! 書込側はロックを取らない（送信側は共有、停止はフラグと終端コマンドで伝える）。

use sl_domain::error::DomainError;
use sl_domain::port::driven::{LockLogRecord, LogWriter};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

pub const DEFAULT_LOG_QUEUE_CAPACITY: usize = 1024;

enum LogCommand {
    Record(LockLogRecord),
    Rotate,
    Stop,
}

pub struct QueuedLogWriter {
    sender: SyncSender<LogCommand>,
    stopped: AtomicBool,
    /// 停止時だけ触る
    worker: Mutex<Option<JoinHandle<()>>>,
    dropped: AtomicU64,
    location: String,
}

impl QueuedLogWriter {
    pub fn start(inner: Arc<dyn LogWriter>) -> Result<Self, DomainError> {
        Self::with_capacity(inner, DEFAULT_LOG_QUEUE_CAPACITY)
    }

    pub fn with_capacity(inner: Arc<dyn LogWriter>, capacity: usize) -> Result<Self, DomainError> {
        let (sender, receiver) = mpsc::sync_channel::<LogCommand>(capacity.max(1));
        let location = inner.location();
        let worker = std::thread::Builder::new()
            .name("sl-log-writer".into())
            .spawn(move || {
                for command in receiver {
                    let _ = match command {
                        LogCommand::Record(record) => inner.write_event(&record),
                        LogCommand::Rotate => inner.rotate_if_needed(),
                        LogCommand::Stop => break,
                    };
                }
            })
            .map_err(|e| DomainError::IoError(format!("failed to spawn log writer: {e}")))?;
        Ok(Self {
            sender,
            stopped: AtomicBool::new(false),
            worker: Mutex::new(Some(worker)),
            dropped: AtomicU64::new(0),
            location,
        })
    }

    /// 捨てたレコード数
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// キューを閉じ、残りを書き終えるまで待つ
    pub fn flush_and_stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        // 終端コマンドは満杯でも待って入れる（それ以前のレコードは書かれる）
        let _ = self.sender.send(LogCommand::Stop);
        let worker = self.worker.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(worker) = worker {
            let _ = worker.join();
        }
    }

    fn enqueue(&self, command: LogCommand) -> Result<(), DomainError> {
        if self.stopped.load(Ordering::Acquire) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(DomainError::IoError("log writer stopped".into()));
        }
        match self.sender.try_send(command) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(DomainError::IoError("log writer stopped".into()))
            }
        }
    }
}

impl LogWriter for QueuedLogWriter {
    fn write_event(&self, record: &LockLogRecord) -> Result<(), DomainError> {
        self.enqueue(LogCommand::Record(record.clone()))
    }

    fn rotate_if_needed(&self) -> Result<(), DomainError> {
        self.enqueue(LogCommand::Rotate)
    }

    fn location(&self) -> String {
        self.location.clone()
    }
}

impl Drop for QueuedLogWriter {
    fn drop(&mut self) {
        self.flush_and_stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActivityLog;
    use sl_domain::port::driven::LogLevel;

    fn record(i: usize) -> LockLogRecord {
        LockLogRecord {
            timestamp: "t".into(),
            level: LogLevel::Info,
            component: "test".into(),
            message: format!("m{i}"),
        }
    }

    #[test]
    fn flush_writes_everything_queued() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.log.jsonl");
        let queued = QueuedLogWriter::start(Arc::new(ActivityLog::new(&path))).unwrap();
        for i in 0..100 {
            queued.write_event(&record(i)).unwrap();
        }
        queued.flush_and_stop();
        let lines = std::fs::read_to_string(&path).unwrap().lines().count();
        assert_eq!(lines as u64 + queued.dropped(), 100);
        assert_eq!(queued.location(), path.display().to_string());
    }

    #[test]
    fn concurrent_writers_share_the_queue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.log.jsonl");
        let queued = Arc::new(QueuedLogWriter::start(Arc::new(ActivityLog::new(&path))).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let queued = Arc::clone(&queued);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        queued.write_event(&record(t * 100 + i)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        queued.flush_and_stop();
        queued.flush_and_stop();
        let lines = std::fs::read_to_string(&path).unwrap().lines().count();
        assert_eq!(lines as u64 + queued.dropped(), 200);
    }

    #[test]
    fn writes_after_stop_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let queued =
            QueuedLogWriter::start(Arc::new(ActivityLog::new(dir.path().join("a.jsonl")))).unwrap();
        queued.flush_and_stop();
        assert!(queued.write_event(&record(0)).is_err());
        assert_eq!(queued.dropped(), 1);
    }
}
