//! テスト用のモックポート

use sl_domain::error::{CaptureError, DomainError, HookError, TransportError};
use sl_domain::model::{ArtifactRef, HookHandle, OutgoingMail};
use sl_domain::port::driven::{
    AudioRecorder, CameraGrabber, Clock, InputFilterHost, LockLogRecord, LogLevel, LogWriter,
    MailTransport, ScreenGrabber, SystemInfoProvider, TaskSwitcherPolicy,
};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// 壁時計と単調時計を別々に動かせる時計
pub struct MockClock {
    pub now: AtomicU64,
    pub mono: AtomicU64,
}

impl MockClock {
    pub fn at(ms: u64) -> Self {
        Self {
            now: AtomicU64::new(ms),
            mono: AtomicU64::new(0),
        }
    }

    /// 両方の時計を進める
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
        self.mono.fetch_add(ms, Ordering::SeqCst);
    }

    /// 壁時計だけを戻す（NTP補正や手動変更）
    pub fn set_wall_back(&self, ms: u64) {
        self.now.fetch_sub(ms, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn monotonic_ms(&self) -> u64 {
        self.mono.load(Ordering::SeqCst)
    }

    fn now_iso8601(&self) -> String {
        sl_domain::time::rfc3339_millis(self.now_ms())
    }
}

#[derive(Default)]
pub struct MemoryLog {
    pub records: Mutex<Vec<LockLogRecord>>,
}

impl MemoryLog {
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.level == level)
            .count()
    }
}

impl LogWriter for MemoryLog {
    fn write_event(&self, record: &LockLogRecord) -> Result<(), DomainError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn rotate_if_needed(&self) -> Result<(), DomainError> {
        Ok(())
    }

    fn location(&self) -> String {
        "memory".into()
    }
}

/// 呼び出し順を記録する共有ジャーナル
#[derive(Default)]
pub struct Journal {
    pub calls: Mutex<Vec<&'static str>>,
}

impl Journal {
    pub fn push(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn snapshot(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

pub struct MockFilterHost {
    pub journal: std::sync::Arc<Journal>,
    pub fail_install: bool,
    pub installs: AtomicUsize,
    pub removes: AtomicUsize,
}

impl MockFilterHost {
    pub fn new(journal: std::sync::Arc<Journal>) -> Self {
        Self {
            journal,
            fail_install: false,
            installs: AtomicUsize::new(0),
            removes: AtomicUsize::new(0),
        }
    }
}

impl InputFilterHost for MockFilterHost {
    fn install(&self) -> Result<HookHandle, HookError> {
        self.journal.push("install");
        if self.fail_install {
            return Err(HookError::InstallFailed(5));
        }
        let n = self.installs.fetch_add(1, Ordering::SeqCst);
        Ok(HookHandle::from_raw(0x1000 + n))
    }

    fn remove(&self, _handle: HookHandle) -> Result<(), HookError> {
        self.journal.push("remove");
        self.removes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn blocked_count(&self) -> u64 {
        3
    }
}

pub struct MockPolicy {
    pub journal: std::sync::Arc<Journal>,
    pub fail_disable: bool,
    pub disables: AtomicUsize,
    pub restores: AtomicUsize,
}

impl MockPolicy {
    pub fn new(journal: std::sync::Arc<Journal>) -> Self {
        Self {
            journal,
            fail_disable: false,
            disables: AtomicUsize::new(0),
            restores: AtomicUsize::new(0),
        }
    }
}

impl TaskSwitcherPolicy for MockPolicy {
    fn disable(&self) -> Result<(), DomainError> {
        self.journal.push("disable");
        if self.fail_disable {
            return Err(DomainError::RegistryAccessDenied("denied".into()));
        }
        self.disables.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn restore(&self) -> Result<(), DomainError> {
        self.journal.push("restore");
        self.restores.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 画面/カメラ/音声をまとめたモック
#[derive(Default)]
pub struct MockGrabber {
    pub fail: bool,
    pub panic: bool,
    pub calls: AtomicUsize,
    pub last_seconds: AtomicU64,
}

impl MockGrabber {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panic: true,
            ..Self::default()
        }
    }

    fn take(&self, dest: &Path) -> Result<ArtifactRef, CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panic {
            panic!("driver crashed");
        }
        if self.fail {
            Err(CaptureError::DeviceUnavailable("no device".into()))
        } else {
            Ok(ArtifactRef::captured(dest.to_path_buf()))
        }
    }
}

impl ScreenGrabber for MockGrabber {
    fn capture_screen(&self, dest: &Path) -> Result<ArtifactRef, CaptureError> {
        self.take(dest)
    }
}

impl CameraGrabber for MockGrabber {
    fn capture_frame(&self, dest: &Path) -> Result<ArtifactRef, CaptureError> {
        self.take(dest)
    }
}

impl AudioRecorder for MockGrabber {
    fn record(&self, dest: &Path, seconds: u32) -> Result<ArtifactRef, CaptureError> {
        self.last_seconds.store(seconds as u64, Ordering::SeqCst);
        self.take(dest)
    }
}

pub struct MockSystemInfo {
    pub text: String,
}

impl SystemInfoProvider for MockSystemInfo {
    fn describe(&self) -> String {
        self.text.clone()
    }

    fn host_name(&self) -> String {
        "desk-01".into()
    }
}

#[derive(Default)]
pub struct MockMail {
    pub configured: bool,
    pub fail: AtomicBool,
    pub sent: Mutex<Vec<OutgoingMail>>,
}

impl MockMail {
    pub fn configured() -> Self {
        Self {
            configured: true,
            ..Self::default()
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl MailTransport for MockMail {
    fn is_configured(&self) -> bool {
        self.configured
    }

    fn send(&self, mail: &OutgoingMail) -> Result<(), TransportError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Delivery("smtp 421".into()));
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}
