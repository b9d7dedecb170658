//! システムフックマネージャー
//!
//! グローバル入力フィルタとタスク切替抑止ポリシーの登録/解除を1か所で所有する。
//! どちらの操作も冪等で、ハンドルは複製しない。

use crate::activity::log_event;
use sl_domain::error::{DomainError, HookError};
use sl_domain::model::HookHandle;
use sl_domain::port::driven::{Clock, InputFilterHost, LogLevel, LogWriter, TaskSwitcherPolicy};
use std::sync::Arc;

const COMPONENT: &str = "hook";

pub struct SystemHookManager {
    host: Arc<dyn InputFilterHost>,
    policy: Arc<dyn TaskSwitcherPolicy>,
    log: Arc<dyn LogWriter>,
    clock: Arc<dyn Clock>,
    handle: Option<HookHandle>,
    policy_overridden: bool,
}

impl SystemHookManager {
    pub fn new(
        host: Arc<dyn InputFilterHost>,
        policy: Arc<dyn TaskSwitcherPolicy>,
        log: Arc<dyn LogWriter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            host,
            policy,
            log,
            clock,
            handle: None,
            policy_overridden: false,
        }
    }

    /// 入力フィルタを登録し、ハンドルの生値を返す。登録済みなら既存の値を返す。
    ///
    /// ハンドル自体はここで保持し、呼び出し側には渡さない。
    pub fn install_filter(&mut self) -> Result<usize, HookError> {
        if let Some(handle) = &self.handle {
            return Ok(handle.raw());
        }
        let handle = self.host.install()?;
        let raw = handle.raw();
        self.log(LogLevel::Info, format!("input filter installed (handle 0x{:x})", raw));
        self.handle = Some(handle);
        Ok(raw)
    }

    /// 入力フィルタを解除する。未登録・解除済みなら何もしない。
    pub fn release(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        match self.host.remove(handle) {
            Ok(()) => self.log(LogLevel::Info, "input filter removed"),
            Err(e) => self.log(LogLevel::Error, format!("input filter removal failed: {}", e)),
        }
    }

    /// タスク切替UIを抑止する。既に抑止中なら何もしない。
    pub fn override_policy(&mut self) -> Result<(), DomainError> {
        if self.policy_overridden {
            return Ok(());
        }
        self.policy.disable()?;
        self.policy_overridden = true;
        self.log(LogLevel::Info, "task switcher disabled");
        Ok(())
    }

    /// 抑止を元に戻す。抑止していなければ何もしない。
    pub fn restore_policy(&mut self) {
        if !self.policy_overridden {
            return;
        }
        self.policy_overridden = false;
        match self.policy.restore() {
            Ok(()) => self.log(LogLevel::Info, "task switcher restored"),
            Err(e) => self.log(LogLevel::Error, format!("task switcher restore failed: {}", e)),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_policy_overridden(&self) -> bool {
        self.policy_overridden
    }

    pub fn blocked_count(&self) -> u64 {
        self.host.blocked_count()
    }

    fn log(&self, level: LogLevel, message: impl Into<String>) {
        log_event(self.log.as_ref(), self.clock.as_ref(), level, COMPONENT, message);
    }
}

impl Drop for SystemHookManager {
    // 異常終了経路でもポリシー復元を試みる
    fn drop(&mut self) {
        self.restore_policy();
        self.release();
    }
}
