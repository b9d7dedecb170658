//! ロック状態機械
//!
//! 入力の分類、違反のデバウンスと証拠ワーカーへの投入、フック/ポリシーのライフサイクルを束ねる。
//! `Locked → Unlocking → Unlocked` の一方向で、Unlocked は終端。

use crate::activity::log_event;
use crate::debouncer::TriggerDebouncer;
use crate::dispatcher::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS, EvidenceDispatcher};
use crate::evidence::{EvidencePipeline, EvidencePorts};
use crate::hooks::SystemHookManager;
use crate::notifier::Notifier;
use sl_domain::error::DomainError;
use sl_domain::model::{
    Action, FireSignal, KeyId, LockConfig, LockSession, LockSessionReport, LockState, PointerKind,
    UnlockConfig, UnlockMode, ViolationEvent, ViolationSource,
};
use sl_domain::port::driven::{
    AudioRecorder, CameraGrabber, Clock, InputFilterHost, LogLevel, LogWriter, MailTransport,
    ScreenGrabber, SystemInfoProvider, TaskSwitcherPolicy,
};
use sl_domain::port::driving::LockController;
use sl_domain::service::{check_passcode, classify_key, classify_pointer};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

const COMPONENT: &str = "engine";

/// エンジンが使う全ポート
#[derive(Clone)]
pub struct EnginePorts {
    pub clock: Arc<dyn Clock>,
    pub log: Arc<dyn LogWriter>,
    pub input_filter: Arc<dyn InputFilterHost>,
    pub task_switcher: Arc<dyn TaskSwitcherPolicy>,
    pub screen: Arc<dyn ScreenGrabber>,
    pub camera: Arc<dyn CameraGrabber>,
    pub audio: Arc<dyn AudioRecorder>,
    pub system_info: Arc<dyn SystemInfoProvider>,
    pub mail: Arc<dyn MailTransport>,
}

/// エンジンの構築パラメータ
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub capture_dir: PathBuf,
    pub workers: usize,
    pub queue_capacity: usize,
}

impl EngineOptions {
    pub fn new(capture_dir: PathBuf) -> Self {
        Self {
            capture_dir,
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

#[derive(Default)]
struct Counters {
    violations: AtomicU64,
    fires_accepted: AtomicU64,
    fires_suppressed: AtomicU64,
}

pub struct LockEngine {
    config: UnlockConfig,
    state: LockState,
    hooks: SystemHookManager,
    debouncer: TriggerDebouncer,
    dispatcher: EvidenceDispatcher,
    clock: Arc<dyn Clock>,
    log: Arc<dyn LogWriter>,
    counters: Counters,
}

impl LockEngine {
    /// ロックを開始する
    ///
    /// 分類ロジックの矛盾のみ致命的。フックとポリシーの失敗はログに残し、保護なしで続行する。
    pub fn new(config: &LockConfig, ports: EnginePorts, options: EngineOptions) -> Result<Self, DomainError> {
        config.validate()?;

        let pipeline = EvidencePipeline::new(
            EvidencePorts {
                screen: ports.screen,
                camera: ports.camera,
                audio: ports.audio,
                system_info: ports.system_info,
                log: Arc::clone(&ports.log),
                clock: Arc::clone(&ports.clock),
            },
            config.evidence.clone(),
            options.capture_dir,
        );
        let notifier = Notifier::new(
            ports.mail,
            config.notify.clone(),
            Arc::clone(&ports.log),
            Arc::clone(&ports.clock),
        );
        let dispatcher = EvidenceDispatcher::start(
            options.workers,
            options.queue_capacity,
            move |signal: FireSignal| {
                let bundle = pipeline.gather(&signal);
                notifier.notify(&bundle);
            },
        )?;

        let hooks = SystemHookManager::new(
            ports.input_filter,
            ports.task_switcher,
            Arc::clone(&ports.log),
            Arc::clone(&ports.clock),
        );

        let mut engine = Self {
            config: config.unlock.clone(),
            state: LockState::Locked,
            hooks,
            debouncer: TriggerDebouncer::new(config.unlock.cooldown_seconds),
            dispatcher,
            clock: ports.clock,
            log: ports.log,
            counters: Counters::default(),
        };
        engine.engage_protection();
        engine.log(
            LogLevel::Info,
            format!(
                "lock started (mode={}, hook={}, policy={}, cooldown={}s)",
                engine.config.mode.to_code(),
                engine.hooks.is_installed(),
                engine.hooks.is_policy_overridden(),
                engine.config.cooldown_seconds
            ),
        );
        if engine.config.is_no_escape() {
            engine.log(LogLevel::Warn, "no unlock key configured; session cannot be unlocked from the keyboard");
        }
        Ok(engine)
    }

    fn engage_protection(&mut self) {
        if self.config.wants_policy_override() {
            if let Err(e) = self.hooks.override_policy() {
                self.log(LogLevel::Error, format!("task switcher override failed: {}", e));
            }
        }
        if self.config.wants_input_filter() {
            if let Err(e) = self.hooks.install_filter() {
                self.log(
                    LogLevel::Error,
                    format!("input filter unavailable, running unprotected: {}", e),
                );
            }
        }
    }

    /// 違反を記録し、デバウンスを通ったものをワーカーへ渡す
    fn report_violation(&self, action: &Action, source: ViolationSource) {
        let Action::Violation(reason) = action else {
            return;
        };
        self.counters.violations.fetch_add(1, Ordering::Relaxed);
        let event = ViolationEvent {
            reason: reason.clone(),
            observed_at: self.clock.now_ms(),
            monotonic_ms: self.clock.monotonic_ms(),
            source,
        };
        self.log(LogLevel::Info, format!("violation ({}): {}", event.source, event.reason));
        match self.debouncer.on_violation(&event) {
            Some(signal) => {
                self.counters.fires_accepted.fetch_add(1, Ordering::Relaxed);
                if !self.dispatcher.submit(signal) {
                    self.log(LogLevel::Warn, "evidence queue full; capture dropped");
                }
            }
            None => {
                self.counters.fires_suppressed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// ポリシー復元 → フック解除 の順で保護を外す。2回目以降は何もしない。
    fn release_protection(&mut self, reason: &str) {
        if self.state != LockState::Locked {
            return;
        }
        self.state = LockState::Unlocking;
        self.hooks.restore_policy();
        self.hooks.release();
        self.state = LockState::Unlocked;
        self.log(
            LogLevel::Info,
            format!(
                "{} (violations={}, blocked combinations={})",
                reason,
                self.counters.violations.load(Ordering::Relaxed),
                self.hooks.blocked_count()
            ),
        );
    }

    /// セッション状態のスナップショット
    pub fn session(&self) -> LockSession {
        LockSession {
            state: self.state,
            hook_installed: self.hooks.is_installed(),
            policy_overridden: self.hooks.is_policy_overridden(),
            last_capture_at: self.debouncer.last_capture_at(),
        }
    }

    pub fn mode(&self) -> UnlockMode {
        self.config.mode
    }

    pub fn unlock_config(&self) -> &UnlockConfig {
        &self.config
    }

    /// 証拠ワーカーを止める（処理中のバンドルは完了させる）
    pub fn shutdown_workers(&mut self) {
        self.dispatcher.shutdown();
        let failed = self.dispatcher.panicked();
        self.log(
            if failed > 0 { LogLevel::Warn } else { LogLevel::Info },
            format!(
                "evidence workers stopped (completed={}, failed={})",
                self.dispatcher.completed(),
                failed
            ),
        );
    }

    /// セッション集計
    pub fn report(&self) -> LockSessionReport {
        LockSessionReport {
            violations: self.counters.violations.load(Ordering::Relaxed),
            fires_accepted: self.counters.fires_accepted.load(Ordering::Relaxed),
            fires_suppressed: self.counters.fires_suppressed.load(Ordering::Relaxed),
            fires_dropped: self.dispatcher.dropped(),
            blocked_combinations: self.hooks.blocked_count(),
            hook_installed: self.hooks.is_installed(),
            policy_overridden: self.hooks.is_policy_overridden(),
            unlocked: self.state == LockState::Unlocked,
        }
    }

    fn log(&self, level: LogLevel, message: impl Into<String>) {
        log_event(self.log.as_ref(), self.clock.as_ref(), level, COMPONENT, message);
    }
}

impl LockController for LockEngine {
    fn classify_key(&self, key: KeyId, is_repeat: bool) -> Action {
        if self.state != LockState::Locked {
            return Action::Ignore;
        }
        let action = classify_key(&self.config, key, is_repeat);
        let source = match self.config.mode {
            UnlockMode::SingleKey => ViolationSource::Keyboard,
            UnlockMode::Passcode => ViolationSource::EscapeAttempt,
        };
        self.report_violation(&action, source);
        action
    }

    fn classify_pointer(&self, kind: PointerKind) -> Action {
        if self.state != LockState::Locked {
            return Action::Ignore;
        }
        let action = classify_pointer(&self.config, kind);
        self.report_violation(&action, ViolationSource::Mouse);
        action
    }

    fn submit_passcode(&self, text: &str) -> Action {
        if self.state != LockState::Locked {
            return Action::Ignore;
        }
        let action = check_passcode(&self.config, text);
        self.report_violation(&action, ViolationSource::PasscodeMismatch);
        action
    }

    fn unlock(&mut self) {
        self.release_protection("unlocked");
    }

    fn state(&self) -> LockState {
        self.state
    }

    fn teardown(&mut self) {
        if self.state == LockState::Locked {
            self.log(LogLevel::Warn, "teardown requested while locked");
        }
        self.release_protection("session torn down");
    }
}

impl Drop for LockEngine {
    fn drop(&mut self) {
        self.release_protection("engine dropped while locked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        Journal, MemoryLog, MockClock, MockFilterHost, MockGrabber, MockMail, MockPolicy,
        MockSystemInfo,
    };

    struct Fixture {
        journal: Arc<Journal>,
        host: Arc<MockFilterHost>,
        policy: Arc<MockPolicy>,
        clock: Arc<MockClock>,
        log: Arc<MemoryLog>,
        mail: Arc<MockMail>,
        grabber: Arc<MockGrabber>,
    }

    impl Fixture {
        fn new() -> Self {
            let journal = Arc::new(Journal::default());
            Self {
                host: Arc::new(MockFilterHost::new(Arc::clone(&journal))),
                policy: Arc::new(MockPolicy::new(Arc::clone(&journal))),
                journal,
                clock: Arc::new(MockClock::at(1_000_000)),
                log: Arc::new(MemoryLog::default()),
                mail: Arc::new(MockMail::configured()),
                grabber: Arc::new(MockGrabber::default()),
            }
        }

        fn ports(&self) -> EnginePorts {
            EnginePorts {
                clock: self.clock.clone(),
                log: self.log.clone(),
                input_filter: self.host.clone(),
                task_switcher: self.policy.clone(),
                screen: self.grabber.clone(),
                camera: self.grabber.clone(),
                audio: self.grabber.clone(),
                system_info: Arc::new(MockSystemInfo {
                    text: "OS: test".into(),
                }),
                mail: self.mail.clone(),
            }
        }

        fn engine(&self, config: &LockConfig) -> LockEngine {
            LockEngine::new(config, self.ports(), EngineOptions::new(PathBuf::from("captures"))).unwrap()
        }
    }

    fn key(name: &str) -> KeyId {
        KeyId::from_name(name).unwrap()
    }

    fn protected_config() -> LockConfig {
        let mut cfg = LockConfig::default();
        cfg.unlock.disable_task_switcher = true;
        cfg.notify.email_enabled = true;
        cfg
    }

    #[test]
    fn construction_overrides_policy_then_installs_filter() {
        let fx = Fixture::new();
        let engine = fx.engine(&protected_config());
        assert_eq!(fx.journal.snapshot(), vec!["disable", "install"]);
        let session = engine.session();
        assert_eq!(session.state, LockState::Locked);
        assert!(session.hook_installed);
        assert!(session.policy_overridden);
    }

    #[test]
    fn security_mode_off_installs_nothing() {
        let fx = Fixture::new();
        let mut cfg = protected_config();
        cfg.unlock.security_mode_enabled = false;
        let _engine = fx.engine(&cfg);
        assert!(fx.journal.snapshot().is_empty());
    }

    #[test]
    fn install_failure_degrades_to_unprotected() {
        let journal = Arc::new(Journal::default());
        let mut host = MockFilterHost::new(Arc::clone(&journal));
        host.fail_install = true;
        let mut fx = Fixture::new();
        fx.host = Arc::new(host);
        let mut engine = fx.engine(&LockConfig::default());
        assert!(!engine.session().hook_installed);
        assert!(fx.log.contains(LogLevel::Error, "running unprotected"));
        assert_eq!(engine.classify_key(key("F12"), false), Action::Unlock);
        engine.unlock();
        assert_eq!(fx.host.removes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn contradictory_config_aborts_construction() {
        let fx = Fixture::new();
        let mut cfg = LockConfig::default();
        cfg.unlock.mode = UnlockMode::Passcode;
        cfg.unlock.passcode = "12".into();
        let result = LockEngine::new(&cfg, fx.ports(), EngineOptions::new(PathBuf::from("c")));
        assert!(matches!(result, Err(DomainError::InvalidConfig(_))));
        assert!(fx.journal.snapshot().is_empty());
    }

    #[test]
    fn unlock_is_idempotent_and_ordered() {
        let fx = Fixture::new();
        let mut engine = fx.engine(&protected_config());
        engine.unlock();
        engine.unlock();
        assert_eq!(engine.state(), LockState::Unlocked);
        assert_eq!(fx.journal.snapshot(), vec!["disable", "install", "restore", "remove"]);
        assert_eq!(fx.host.removes.load(Ordering::SeqCst), 1);
        assert_eq!(fx.policy.restores.load(Ordering::SeqCst), 1);
        assert!(fx.log.contains(LogLevel::Info, "blocked combinations=3"));
    }

    #[test]
    fn classification_stops_after_unlock() {
        let fx = Fixture::new();
        let mut engine = fx.engine(&LockConfig::default());
        engine.unlock();
        assert_eq!(engine.classify_key(key("A"), false), Action::Ignore);
        assert_eq!(engine.classify_pointer(PointerKind::Press), Action::Ignore);
        assert_eq!(engine.submit_passcode("nope"), Action::Ignore);
        assert_eq!(engine.report().violations, 0);
    }

    #[test]
    fn single_key_properties() {
        let fx = Fixture::new();
        let engine = fx.engine(&LockConfig::default());
        assert_eq!(engine.classify_key(key("F12"), false), Action::Unlock);
        assert_eq!(engine.classify_key(key("F12"), true), Action::Ignore);
        assert_eq!(engine.classify_key(key("Y"), false), Action::Ignore);
        assert!(engine.classify_key(key("Q"), false).is_violation());
    }

    #[test]
    fn passcode_properties() {
        let fx = Fixture::new();
        let mut cfg = LockConfig::default();
        cfg.unlock.mode = UnlockMode::Passcode;
        cfg.unlock.passcode = "1234".into();
        let engine = fx.engine(&cfg);
        assert_eq!(engine.submit_passcode("1234"), Action::Unlock);
        assert!(engine.submit_passcode("0000").is_violation());
        assert_eq!(engine.classify_key(key("Y"), false), Action::Ignore);
        assert!(engine.classify_key(KeyId::ESCAPE, false).is_violation());
    }

    #[test]
    fn violations_are_debounced_before_dispatch() {
        let fx = Fixture::new();
        let mut cfg = protected_config();
        cfg.unlock.cooldown_seconds = 30;
        let mut engine = fx.engine(&cfg);
        for _ in 0..50 {
            engine.classify_pointer(PointerKind::Move);
        }
        fx.clock.advance(31_000);
        engine.classify_key(key("A"), false);
        engine.shutdown_workers();

        let report = engine.report();
        assert_eq!(report.violations, 51);
        assert_eq!(report.fires_accepted, 2);
        assert_eq!(report.fires_suppressed, 49);
        assert_eq!(fx.mail.sent_count(), 2);
        assert_eq!(engine.session().last_capture_at, Some(1_031_000));
    }

    #[test]
    fn wall_clock_step_back_keeps_capturing() {
        let fx = Fixture::new();
        let engine = fx.engine(&protected_config());
        assert!(engine.classify_key(key("A"), false).is_violation());
        fx.clock.set_wall_back(900_000);
        fx.clock.advance(31_000);
        assert!(engine.classify_key(key("B"), false).is_violation());
        let report = engine.report();
        assert_eq!(report.fires_accepted, 2);
        assert_eq!(report.fires_suppressed, 0);
        assert_eq!(engine.session().last_capture_at, Some(131_000));
    }

    #[test]
    fn panicking_capture_still_sends_notification() {
        let mut fx = Fixture::new();
        fx.grabber = Arc::new(MockGrabber::panicking());
        let mut engine = fx.engine(&protected_config());
        assert!(engine.classify_key(key("A"), false).is_violation());
        engine.shutdown_workers();
        assert_eq!(fx.mail.sent_count(), 1);
        assert!(fx.log.contains(LogLevel::Info, "failed=0"));
    }

    #[test]
    fn in_flight_evidence_completes_after_unlock() {
        let fx = Fixture::new();
        let mut engine = fx.engine(&protected_config());
        assert!(engine.classify_key(key("B"), false).is_violation());
        engine.unlock();
        engine.shutdown_workers();
        assert_eq!(fx.mail.sent_count(), 1);
    }

    #[test]
    fn teardown_releases_protection() {
        let fx = Fixture::new();
        let mut engine = fx.engine(&protected_config());
        engine.teardown();
        assert_eq!(engine.state(), LockState::Unlocked);
        assert_eq!(fx.policy.restores.load(Ordering::SeqCst), 1);
        assert!(fx.log.contains(LogLevel::Warn, "teardown requested while locked"));
    }

    #[test]
    fn drop_while_locked_restores_policy() {
        let fx = Fixture::new();
        let engine = fx.engine(&protected_config());
        drop(engine);
        assert_eq!(fx.journal.snapshot(), vec!["disable", "install", "restore", "remove"]);
    }
}
