//! ロックセッションのユースケース（アプリ層）。

use sl_domain::error::DomainError;
use sl_domain::model::{LockConfig, LockRequest, LockSessionReport, UnlockMode};
use sl_domain::port::driven::{
    ConfigRepository, LoadedConfig, LockLogRecord, LockSurface, LockView, LogLevel,
};
use sl_domain::port::driving::{LockController, LockUseCase};
use sl_engine::{EngineOptions, EnginePorts, LockEngine};

const COMPONENT: &str = "app";

pub struct LockDeps<'a> {
    pub config: &'a dyn ConfigRepository,
    pub surface: &'a dyn LockSurface,
    pub ports: EnginePorts,
    pub options: EngineOptions,
}

pub struct LockService<'a> {
    deps: LockDeps<'a>,
}

impl<'a> LockService<'a> {
    pub fn new(deps: LockDeps<'a>) -> Self {
        Self { deps }
    }

    fn log(&self, level: LogLevel, message: impl Into<String>) {
        let record = LockLogRecord {
            timestamp: self.deps.ports.clock.now_iso8601(),
            level,
            component: COMPONENT.to_string(),
            message: message.into(),
        };
        let _ = self.deps.ports.log.write_event(&record);
    }

    /// 設定を読み、警告をログに残す（読込自体の失敗は既定値で続行）
    fn load_config(&self) -> LockConfig {
        let location = self.deps.config.location();
        match self.deps.config.load() {
            Ok(LoadedConfig {
                config,
                warnings,
                created_default,
                parse_error,
            }) => {
                if created_default {
                    self.log(
                        LogLevel::Info,
                        format!("config not found; defaults written to {}", location.display()),
                    );
                }
                if let Some(err) = parse_error {
                    self.log(
                        LogLevel::Error,
                        format!("config unreadable ({}); using defaults: {}", location.display(), err),
                    );
                }
                for warning in warnings {
                    self.log(LogLevel::Warn, format!("config: {}", warning));
                }
                config
            }
            Err(err) => {
                self.log(
                    LogLevel::Error,
                    format!("config load failed ({}); using defaults: {}", location.display(), err),
                );
                LockConfig::default()
            }
        }
    }
}

/// ロック画面に渡す表示情報
pub fn lock_view(config: &LockConfig) -> LockView {
    let unlock_key_name = match config.unlock.mode {
        UnlockMode::SingleKey => config
            .unlock
            .unlock_key
            .map(|key| key.name().unwrap_or_else(|| key.to_string())),
        UnlockMode::Passcode => None,
    };
    LockView {
        mode: config.unlock.mode,
        language: config.ui.language,
        theme: config.ui.theme,
        show_consent_banner: config.ui.show_consent_banner,
        show_animations: config.ui.show_animations,
        unlock_key_name,
        safe_key_name: config.unlock.safe_key.and_then(|key| key.name()),
        mouse_triggers_enabled: config.unlock.mouse_triggers_enabled,
    }
}

impl LockUseCase for LockService<'_> {
    fn start(&self, request: LockRequest) -> Result<LockSessionReport, DomainError> {
        let mut config = self.load_config();
        if request.unprotected {
            config.unlock.security_mode_enabled = false;
            self.log(LogLevel::Warn, "unprotected session requested; system keys stay live");
        }

        let mut engine = LockEngine::new(
            &config,
            self.deps.ports.clone(),
            self.deps.options.clone(),
        )
        .inspect_err(|e| self.log(LogLevel::Error, format!("lock refused: {}", e)))?;

        let view = lock_view(&config);
        let surface_result = self.deps.surface.run(&mut engine, &view);
        if let Err(e) = &surface_result {
            self.log(LogLevel::Error, format!("lock surface failed: {}", e));
        }
        // 画面が異常終了しても保護は必ず外す
        engine.teardown();
        engine.shutdown_workers();

        let report = engine.report();
        self.log(
            LogLevel::Info,
            format!(
                "session report: violations={} fires_accepted={} fires_suppressed={} fires_dropped={} blocked_combinations={} unlocked={}",
                report.violations,
                report.fires_accepted,
                report.fires_suppressed,
                report.fires_dropped,
                report.blocked_combinations,
                report.unlocked
            ),
        );
        let _ = self.deps.ports.log.rotate_if_needed();
        surface_result.map(|_| report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_domain::error::{CaptureError, HookError, TransportError};
    use sl_domain::model::{
        Action, ArtifactRef, ConfigWarning, HookHandle, KeyId, OutgoingMail,
    };
    use sl_domain::port::driven::{
        AudioRecorder, CameraGrabber, Clock, InputFilterHost, LogWriter, MailTransport,
        ScreenGrabber, SystemInfoProvider, TaskSwitcherPolicy,
    };
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    struct FixedClock;
    impl Clock for FixedClock {
        fn now_ms(&self) -> u64 {
            1_700_000_000_000
        }
        fn now_iso8601(&self) -> String {
            "2023-11-14T22:13:20.000Z".into()
        }
        fn monotonic_ms(&self) -> u64 {
            0
        }
    }

    #[derive(Default)]
    struct MemLog {
        records: Mutex<Vec<LockLogRecord>>,
        rotations: AtomicU32,
    }
    impl MemLog {
        fn has(&self, needle: &str) -> bool {
            self.records
                .lock()
                .unwrap()
                .iter()
                .any(|r| r.message.contains(needle))
        }
    }
    impl LogWriter for MemLog {
        fn write_event(&self, record: &LockLogRecord) -> Result<(), DomainError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
        fn rotate_if_needed(&self) -> Result<(), DomainError> {
            self.rotations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn location(&self) -> String {
            "memory".into()
        }
    }

    #[derive(Default)]
    struct Host {
        installed: AtomicBool,
    }
    impl InputFilterHost for Host {
        fn install(&self) -> Result<HookHandle, HookError> {
            self.installed.store(true, Ordering::SeqCst);
            Ok(HookHandle::from_raw(7))
        }
        fn remove(&self, _handle: HookHandle) -> Result<(), HookError> {
            self.installed.store(false, Ordering::SeqCst);
            Ok(())
        }
        fn blocked_count(&self) -> u64 {
            0
        }
    }

    struct NoPolicy;
    impl TaskSwitcherPolicy for NoPolicy {
        fn disable(&self) -> Result<(), DomainError> {
            Ok(())
        }
        fn restore(&self) -> Result<(), DomainError> {
            Ok(())
        }
    }

    struct NoCapture;
    impl ScreenGrabber for NoCapture {
        fn capture_screen(&self, _dest: &Path) -> Result<ArtifactRef, CaptureError> {
            Err(CaptureError::Unsupported)
        }
    }
    impl CameraGrabber for NoCapture {
        fn capture_frame(&self, _dest: &Path) -> Result<ArtifactRef, CaptureError> {
            Err(CaptureError::Unsupported)
        }
    }
    impl AudioRecorder for NoCapture {
        fn record(&self, _dest: &Path, _seconds: u32) -> Result<ArtifactRef, CaptureError> {
            Err(CaptureError::Unsupported)
        }
    }
    impl SystemInfoProvider for NoCapture {
        fn describe(&self) -> String {
            "Host: test".into()
        }
        fn host_name(&self) -> String {
            "test".into()
        }
    }
    impl MailTransport for NoCapture {
        fn is_configured(&self) -> bool {
            false
        }
        fn send(&self, _mail: &OutgoingMail) -> Result<(), TransportError> {
            Err(TransportError::NotConfigured("test".into()))
        }
    }

    struct StubConfig {
        result: Result<LoadedConfig, DomainError>,
    }
    impl StubConfig {
        fn with(config: LockConfig) -> Self {
            Self {
                result: Ok(LoadedConfig {
                    config,
                    warnings: Vec::new(),
                    created_default: false,
                    parse_error: None,
                }),
            }
        }
    }
    impl ConfigRepository for StubConfig {
        fn load(&self) -> Result<LoadedConfig, DomainError> {
            self.result.clone()
        }
        fn save(&self, _config: &LockConfig) -> Result<(), DomainError> {
            Ok(())
        }
        fn exists(&self) -> bool {
            true
        }
        fn location(&self) -> PathBuf {
            PathBuf::from("config.json")
        }
    }

    /// 決められたキーを順に押すロック画面
    struct ScriptedSurface {
        keys: Vec<KeyId>,
        seen_view: Mutex<Option<LockView>>,
        fail: bool,
    }
    impl ScriptedSurface {
        fn pressing(keys: Vec<KeyId>) -> Self {
            Self {
                keys,
                seen_view: Mutex::new(None),
                fail: false,
            }
        }
    }
    impl LockSurface for ScriptedSurface {
        fn run(&self, controller: &mut dyn LockController, view: &LockView) -> Result<(), DomainError> {
            *self.seen_view.lock().unwrap() = Some(view.clone());
            for key in &self.keys {
                if controller.classify_key(*key, false) == Action::Unlock {
                    controller.unlock();
                    break;
                }
            }
            if self.fail {
                return Err(DomainError::Unknown("window class".into()));
            }
            Ok(())
        }
    }

    struct Harness {
        log: Arc<MemLog>,
        host: Arc<Host>,
        ports: EnginePorts,
        capture_dir: PathBuf,
    }

    impl Harness {
        fn new() -> Self {
            let log = Arc::new(MemLog::default());
            let host = Arc::new(Host::default());
            let none = Arc::new(NoCapture);
            let ports = EnginePorts {
                clock: Arc::new(FixedClock),
                log: log.clone(),
                input_filter: host.clone(),
                task_switcher: Arc::new(NoPolicy),
                screen: none.clone(),
                camera: none.clone(),
                audio: none.clone(),
                system_info: none.clone(),
                mail: none,
            };
            Self {
                log,
                host,
                ports,
                capture_dir: std::env::temp_dir().join("sl-app-tests"),
            }
        }

        fn run(
            &self,
            repo: &dyn ConfigRepository,
            surface: &dyn LockSurface,
            request: LockRequest,
        ) -> Result<LockSessionReport, DomainError> {
            let mut options = EngineOptions::new(self.capture_dir.clone());
            options.workers = 1;
            LockService::new(LockDeps {
                config: repo,
                surface,
                ports: self.ports.clone(),
                options,
            })
            .start(request)
        }
    }

    fn screenshots_off() -> LockConfig {
        let mut cfg = LockConfig::default();
        cfg.evidence.screenshot_enabled = false;
        cfg.evidence.include_system_info = false;
        cfg
    }

    #[test]
    fn unlock_key_ends_session_with_report() {
        let h = Harness::new();
        let repo = StubConfig::with(screenshots_off());
        let surface = ScriptedSurface::pressing(vec![KeyId::from_vk(0x41), KeyId::F12]);

        let report = h.run(&repo, &surface, LockRequest::default()).unwrap();

        assert!(report.unlocked);
        assert_eq!(report.violations, 1);
        assert_eq!(report.fires_accepted, 1);
        assert!(!h.host.installed.load(Ordering::SeqCst));
        assert!(h.log.has("session report: violations=1"));
        assert_eq!(h.log.rotations.load(Ordering::SeqCst), 1);
        let view = surface.seen_view.lock().unwrap().clone().unwrap();
        assert_eq!(view.unlock_key_name.as_deref(), Some("F12"));
    }

    #[test]
    fn unprotected_request_skips_hook() {
        let h = Harness::new();
        let repo = StubConfig::with(screenshots_off());
        let surface = ScriptedSurface::pressing(vec![KeyId::F12]);

        let report = h.run(&repo, &surface, LockRequest { unprotected: true }).unwrap();

        assert!(!report.hook_installed);
        assert!(h.log.has("unprotected session requested"));
    }

    #[test]
    fn invalid_config_is_refused() {
        let h = Harness::new();
        let mut cfg = screenshots_off();
        cfg.unlock.mode = UnlockMode::Passcode;
        cfg.unlock.passcode = "12".into();
        let repo = StubConfig::with(cfg);
        let surface = ScriptedSurface::pressing(Vec::new());

        let err = h.run(&repo, &surface, LockRequest::default()).unwrap_err();

        assert!(matches!(err, DomainError::InvalidConfig(_)));
        assert!(surface.seen_view.lock().unwrap().is_none());
        assert!(h.log.has("lock refused"));
    }

    #[test]
    fn load_failure_falls_back_to_defaults() {
        let h = Harness::new();
        let repo = StubConfig {
            result: Err(DomainError::IoError("denied".into())),
        };
        let surface = ScriptedSurface::pressing(vec![KeyId::F12]);

        let report = h.run(&repo, &surface, LockRequest { unprotected: true }).unwrap();

        assert!(report.unlocked);
        assert!(h.log.has("config load failed"));
    }

    #[test]
    fn config_warnings_are_logged() {
        let h = Harness::new();
        let repo = StubConfig {
            result: Ok(LoadedConfig {
                config: screenshots_off(),
                warnings: vec![ConfigWarning::new("audio_seconds", "out of range")],
                created_default: true,
                parse_error: None,
            }),
        };
        let surface = ScriptedSurface::pressing(vec![KeyId::F12]);

        h.run(&repo, &surface, LockRequest::default()).unwrap();

        assert!(h.log.has("audio_seconds"));
        assert!(h.log.has("defaults written"));
    }

    #[test]
    fn surface_failure_still_releases_protection() {
        let h = Harness::new();
        let repo = StubConfig::with(screenshots_off());
        let mut surface = ScriptedSurface::pressing(Vec::new());
        surface.fail = true;

        let err = h.run(&repo, &surface, LockRequest::default()).unwrap_err();

        assert!(matches!(err, DomainError::Unknown(_)));
        assert!(!h.host.installed.load(Ordering::SeqCst));
        assert!(h.log.has("lock surface failed"));
        assert!(h.log.has("teardown requested while locked"));
    }

    #[test]
    fn passcode_view_hides_unlock_key() {
        let mut cfg = LockConfig::default();
        cfg.unlock.mode = UnlockMode::Passcode;
        let view = lock_view(&cfg);
        assert_eq!(view.mode, UnlockMode::Passcode);
        assert_eq!(view.unlock_key_name, None);
    }
}
