//! ロック実行ファイル用ランタイム配線。

use crate::error::{Result as AppResult, err};
use sl_adapter_capture::{DesktopGrabber, MicrophoneRecorder, SysinfoProvider, WebcamGrabber};
use sl_adapter_clock::ClockAdapter;
use sl_adapter_fs::{ActivityLog, JsonConfigRepository, QueuedLogWriter};
use sl_adapter_hook::LowLevelKeyboardHost;
use sl_adapter_mail::SmtpMailer;
use sl_adapter_paths as paths;
use sl_adapter_registry::TaskManagerPolicy;
use sl_app::{LockDeps, LockService};
use sl_domain::model::{LockRequest, LockSessionReport};
use sl_domain::port::driven::{ConfigRepository, LogWriter};
use sl_domain::port::driving::LockUseCase;
use sl_engine::{EngineOptions, EnginePorts};
use sl_ui_lock::LockScreen;
use std::path::PathBuf;
use std::sync::Arc;

/// ロック実行の依存関係
///
/// 具象アダプタはここだけが知る。
pub struct LockRuntime {
    repo: JsonConfigRepository,
    log: Arc<QueuedLogWriter>,
    ports: EnginePorts,
    options: EngineOptions,
}

impl LockRuntime {
    /// `config_override` が無ければ既定の設定ファイルを使う
    pub fn new(config_override: Option<PathBuf>) -> AppResult<Self> {
        let config_path = config_override.unwrap_or_else(paths::default_config_path);
        let activity = Arc::new(ActivityLog::new(paths::default_activity_log_path()));
        let log = Arc::new(
            QueuedLogWriter::start(activity).map_err(|e| err(format!("log writer: {}", e)))?,
        );
        let clock = Arc::new(ClockAdapter::new());

        let ports = EnginePorts {
            clock: clock.clone(),
            log: log.clone(),
            input_filter: Arc::new(LowLevelKeyboardHost::new(clock)),
            task_switcher: Arc::new(TaskManagerPolicy::new()),
            screen: Arc::new(DesktopGrabber::new()),
            camera: Arc::new(WebcamGrabber::new()),
            audio: Arc::new(MicrophoneRecorder::new()),
            system_info: Arc::new(SysinfoProvider::new()),
            mail: Arc::new(SmtpMailer::from_env_file(&paths::mail_env_path_beside(
                &config_path,
            ))),
        };

        Ok(Self {
            repo: JsonConfigRepository::new(&config_path),
            log,
            ports,
            options: EngineOptions::new(paths::default_capture_dir()),
        })
    }

    pub fn config_location(&self) -> PathBuf {
        self.repo.location()
    }

    pub fn log_location(&self) -> String {
        self.log.location()
    }

    /// ロック画面を表示し、解除されるまで戻らない
    pub fn run(&self, request: LockRequest) -> AppResult<LockSessionReport> {
        let screen = LockScreen::new();
        let service = LockService::new(LockDeps {
            config: &self.repo,
            surface: &screen,
            ports: self.ports.clone(),
            options: self.options.clone(),
        });
        service.start(request).map_err(|e| err(e.to_string()))
    }
}

impl Drop for LockRuntime {
    fn drop(&mut self) {
        self.log.flush_and_stop();
    }
}
