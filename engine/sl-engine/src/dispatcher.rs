//! 証拠ワーカー
//!
//! 分類経路から有界キューで発火シグナルを受け取り、固定数のワーカースレッドで処理する。
//! 投入は `try_send` のみで、分類経路をブロックしない。

use sl_domain::error::DomainError;
use sl_domain::model::FireSignal;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

pub const DEFAULT_WORKERS: usize = 2;
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

pub struct EvidenceDispatcher {
    sender: Option<SyncSender<FireSignal>>,
    workers: Vec<JoinHandle<()>>,
    dropped: AtomicU64,
    completed: Arc<AtomicU64>,
    panicked: Arc<AtomicU64>,
}

impl EvidenceDispatcher {
    /// ワーカーを起動する
    pub fn start<F>(workers: usize, capacity: usize, handler: F) -> Result<Self, DomainError>
    where
        F: Fn(FireSignal) + Send + Sync + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel::<FireSignal>(capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let handler = Arc::new(handler);
        let completed = Arc::new(AtomicU64::new(0));
        let panicked = Arc::new(AtomicU64::new(0));
        let mut handles = Vec::with_capacity(workers.max(1));
        for index in 0..workers.max(1) {
            let receiver = Arc::clone(&receiver);
            let handler = Arc::clone(&handler);
            let completed = Arc::clone(&completed);
            let panicked = Arc::clone(&panicked);
            let handle = std::thread::Builder::new()
                .name(format!("sl-evidence-{}", index))
                .spawn(move || worker_loop(&receiver, handler.as_ref(), &completed, &panicked))
                .map_err(|e| DomainError::IoError(format!("failed to spawn evidence worker: {}", e)))?;
            handles.push(handle);
        }
        Ok(Self {
            sender: Some(sender),
            workers: handles,
            dropped: AtomicU64::new(0),
            completed,
            panicked,
        })
    }

    /// シグナルを投入する。キュー満杯・停止済みなら破棄して false。
    pub fn submit(&self, signal: FireSignal) -> bool {
        let Some(sender) = &self.sender else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };
        match sender.try_send(signal) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub(crate) fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// ハンドラがパニックしたシグナル数（ワーカーは止まらない）
    pub(crate) fn panicked(&self) -> u64 {
        self.panicked.load(Ordering::Relaxed)
    }

    /// キューを閉じ、処理中・待機中のバンドルを完了させてからワーカーを合流させる
    pub fn shutdown(&mut self) {
        self.sender.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for EvidenceDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    receiver: &Mutex<Receiver<FireSignal>>,
    handler: &(dyn Fn(FireSignal) + Send + Sync),
    completed: &AtomicU64,
    panicked: &AtomicU64,
) {
    loop {
        // 受信の間だけロックを保持する
        let next = {
            let guard = receiver.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.recv()
        };
        match next {
            Ok(signal) => match catch_unwind(AssertUnwindSafe(|| handler(signal))) {
                Ok(()) => {
                    completed.fetch_add(1, Ordering::Relaxed);
                }
                // 内容はパニックフックがライフサイクルログに残す。数えて次へ進む
                Err(_) => {
                    panicked.fetch_add(1, Ordering::Relaxed);
                }
            },
            Err(_) => break,
        }
    }
}
