//! 設定管理CLI用ランタイム配線。

use crate::error::{Result as AppResult, err};
use sl_adapter_clock::ClockAdapter;
use sl_adapter_fs::{ActivityLog, JsonConfigRepository};
use sl_adapter_paths as paths;
use sl_domain::model::{ConfigWarning, KeyId, LockConfig, RawValue, UnlockMode};
use sl_domain::port::driven::{Clock, ConfigRepository, LockLogRecord, LogLevel, LogWriter};
use sl_domain::service::{
    KEY_BLOCK_SYSTEM_KEYS, KEY_CAMERA_ENABLED, KEY_AUDIO_ENABLED, KEY_DISABLE_TASK_MANAGER,
    KEY_EMAIL_ENABLED, KEY_INCLUDE_SYSTEM_INFO, KEY_MOUSE_TRIGGERS, KEY_SCREENSHOT_ENABLED,
    KEY_SECURITY_MODE, KEY_SHOW_ANIMATIONS, KEY_UNLOCK_KEY, KEY_UNLOCK_MODE,
    KEY_UNLOCK_PASSCODE, apply_setting, config_to_document, parse_setting_for,
};
use std::path::PathBuf;

const COMPONENT: &str = "config";

/// `toggle` で切り替えられる機能名と対応キー
pub const TOGGLE_FEATURES: &[(&str, &str)] = &[
    ("camera", KEY_CAMERA_ENABLED),
    ("audio", KEY_AUDIO_ENABLED),
    ("screenshot", KEY_SCREENSHOT_ENABLED),
    ("email", KEY_EMAIL_ENABLED),
    ("security", KEY_SECURITY_MODE),
    ("block-keys", KEY_BLOCK_SYSTEM_KEYS),
    ("animations", KEY_SHOW_ANIMATIONS),
    ("mouse-triggers", KEY_MOUSE_TRIGGERS),
    ("task-manager", KEY_DISABLE_TASK_MANAGER),
    ("system-info", KEY_INCLUDE_SYSTEM_INFO),
];

/// `show` の結果
#[derive(Debug, Clone)]
pub struct ConfigListing {
    pub location: PathBuf,
    pub entries: Vec<(&'static str, String)>,
    pub warnings: Vec<ConfigWarning>,
    pub parse_error: Option<String>,
}

pub struct ConfigRuntime {
    repo: JsonConfigRepository,
    log: Box<dyn LogWriter>,
    clock: ClockAdapter,
}

impl ConfigRuntime {
    pub fn new(config_override: Option<PathBuf>) -> Self {
        let config_path = config_override.unwrap_or_else(paths::default_config_path);
        Self::with_paths(config_path, paths::default_activity_log_path())
    }

    pub fn with_paths(config_path: PathBuf, activity_log_path: PathBuf) -> Self {
        Self {
            repo: JsonConfigRepository::new(config_path),
            log: Box::new(ActivityLog::new(activity_log_path)),
            clock: ClockAdapter::new(),
        }
    }

    pub fn location(&self) -> PathBuf {
        self.repo.location()
    }

    pub fn show(&self) -> AppResult<ConfigListing> {
        let loaded = self.repo.load().map_err(|e| err(e.to_string()))?;
        Ok(ConfigListing {
            location: self.repo.location(),
            entries: config_to_document(&loaded.config)
                .into_iter()
                .map(|(key, value)| (key, display_value(&value)))
                .collect(),
            warnings: loaded.warnings,
            parse_error: loaded.parse_error,
        })
    }

    /// 既定値を書き出す
    pub fn reset(&self) -> AppResult<()> {
        self.repo
            .save(&LockConfig::default())
            .map_err(|e| err(e.to_string()))?;
        self.audit("config reset to defaults");
        Ok(())
    }

    /// キーモードへ（解除キーを省略すると現在のキーを維持）
    pub fn set_mode_key(&self, unlock_key: Option<&str>) -> AppResult<LockConfig> {
        let mut cfg = self.current()?;
        if let Some(name) = unlock_key {
            if !name.is_empty() && KeyId::from_name(name).is_none() {
                return Err(err(format!("unknown key name: {}", name)));
            }
            cfg = apply_setting(&cfg, KEY_UNLOCK_KEY, RawValue::Text(name.to_string()))
                .map_err(|e| err(e.to_string()))?;
        }
        cfg = apply_setting(&cfg, KEY_UNLOCK_MODE, RawValue::Text(UnlockMode::SingleKey.to_code().into()))
            .map_err(|e| err(e.to_string()))?;
        self.store(&cfg, "unlock mode set to key")?;
        Ok(cfg)
    }

    /// パスコードモードへ
    pub fn set_mode_passcode(&self, passcode: &str) -> AppResult<LockConfig> {
        let cfg = self.current()?;
        let cfg = apply_setting(&cfg, KEY_UNLOCK_PASSCODE, RawValue::Text(passcode.to_string()))
            .and_then(|c| {
                apply_setting(&c, KEY_UNLOCK_MODE, RawValue::Text(UnlockMode::Passcode.to_code().into()))
            })
            .map_err(|e| err(e.to_string()))?;
        self.store(&cfg, "unlock mode set to passcode")?;
        Ok(cfg)
    }

    /// 機能を反転し、新しい値を返す
    pub fn toggle(&self, feature: &str) -> AppResult<bool> {
        let key = TOGGLE_FEATURES
            .iter()
            .find(|(name, _)| *name == feature)
            .map(|(_, key)| *key)
            .ok_or_else(|| err(format!("unknown feature: {}", feature)))?;
        let cfg = self.current()?;
        let current = config_to_document(&cfg)
            .into_iter()
            .find_map(|(k, v)| match v {
                RawValue::Bool(b) if k == key => Some(b),
                _ => None,
            })
            .ok_or_else(|| err(format!("{} is not a switch", key)))?;
        let cfg = apply_setting(&cfg, key, RawValue::Bool(!current)).map_err(|e| err(e.to_string()))?;
        self.store(&cfg, &format!("{} = {}", key, !current))?;
        Ok(!current)
    }

    /// 任意のキーを設定（保存前に検証）
    pub fn set(&self, key: &str, value: &str) -> AppResult<LockConfig> {
        let cfg = self.current()?;
        let cfg = apply_setting(&cfg, key, parse_setting_for(key, value)).map_err(|e| err(e.to_string()))?;
        let shown = if key == KEY_UNLOCK_PASSCODE { "****" } else { value };
        self.store(&cfg, &format!("{} = {}", key, shown))?;
        Ok(cfg)
    }

    /// 変更の起点となる設定（壊れたファイルは上書きしない）
    fn current(&self) -> AppResult<LockConfig> {
        let loaded = self.repo.load().map_err(|e| err(e.to_string()))?;
        if let Some(parse_error) = loaded.parse_error {
            return Err(err(format!(
                "{} is unreadable ({}); fix it or run `reset --yes`",
                self.repo.location().display(),
                parse_error
            )));
        }
        Ok(loaded.config)
    }

    fn store(&self, cfg: &LockConfig, summary: &str) -> AppResult<()> {
        cfg.validate().map_err(|e| err(e.to_string()))?;
        self.repo.save(cfg).map_err(|e| err(e.to_string()))?;
        self.audit(summary);
        Ok(())
    }

    fn audit(&self, message: &str) {
        let record = LockLogRecord {
            timestamp: self.clock.now_iso8601(),
            level: LogLevel::Info,
            component: COMPONENT.to_string(),
            message: message.to_string(),
        };
        let _ = self.log.write_event(&record);
    }
}

fn display_value(value: &RawValue) -> String {
    match value {
        RawValue::Bool(b) => b.to_string(),
        RawValue::Int(n) => n.to_string(),
        RawValue::Float(f) => f.to_string(),
        RawValue::Text(s) if s.is_empty() => "(none)".to_string(),
        RawValue::Text(s) => s.clone(),
        RawValue::Other => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_domain::service::{KEY_AUDIO_SECONDS, KEY_SAFE_KEY};

    struct Fixture {
        _dir: tempfile::TempDir,
        runtime: ConfigRuntime,
        log_path: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("logs").join("activity.log.jsonl");
        let runtime = ConfigRuntime::with_paths(dir.path().join("config.json"), log_path.clone());
        Fixture {
            _dir: dir,
            runtime,
            log_path,
        }
    }

    fn entry<'a>(listing: &'a ConfigListing, key: &str) -> &'a str {
        listing
            .entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn show_creates_defaults() {
        let f = fixture();
        let listing = f.runtime.show().unwrap();
        assert!(f.runtime.location().exists());
        assert_eq!(entry(&listing, KEY_UNLOCK_MODE), "key");
        assert_eq!(entry(&listing, KEY_UNLOCK_KEY), "F12");
        assert_eq!(listing.entries.len(), sl_domain::service::DOCUMENT_KEYS.len());
    }

    #[test]
    fn passcode_mode_round_trips_and_is_audited() {
        let f = fixture();
        let cfg = f.runtime.set_mode_passcode("0042").unwrap();
        assert_eq!(cfg.unlock.mode, UnlockMode::Passcode);
        assert_eq!(cfg.unlock.passcode, "0042");

        let listing = f.runtime.show().unwrap();
        assert_eq!(entry(&listing, KEY_UNLOCK_PASSCODE), "0042");
        let audit = std::fs::read_to_string(&f.log_path).unwrap();
        assert!(audit.contains("unlock mode set to passcode"));
    }

    #[test]
    fn short_passcode_is_rejected_without_saving() {
        let f = fixture();
        assert!(f.runtime.set_mode_passcode("12").is_err());
        let listing = f.runtime.show().unwrap();
        assert_eq!(entry(&listing, KEY_UNLOCK_MODE), "key");
    }

    #[test]
    fn key_mode_accepts_empty_key_for_no_escape() {
        let f = fixture();
        let cfg = f.runtime.set_mode_key(Some("")).unwrap();
        assert!(cfg.unlock.is_no_escape());
        assert!(f.runtime.set_mode_key(Some("NOPE")).is_err());
    }

    #[test]
    fn unlock_key_equal_to_safe_key_is_refused() {
        let f = fixture();
        assert!(f.runtime.set_mode_key(Some("Y")).is_err());
        assert!(f.runtime.set(KEY_SAFE_KEY, "F12").is_err());
    }

    #[test]
    fn toggle_flips_switch() {
        let f = fixture();
        assert!(f.runtime.toggle("camera").unwrap());
        assert!(!f.runtime.toggle("camera").unwrap());
        assert!(f.runtime.toggle("warp-drive").is_err());
    }

    #[test]
    fn set_validates_ranges() {
        let f = fixture();
        let cfg = f.runtime.set(KEY_AUDIO_SECONDS, "10").unwrap();
        assert_eq!(cfg.evidence.audio_seconds, 10);
        assert!(f.runtime.set(KEY_AUDIO_SECONDS, "600").is_err());
        assert!(f.runtime.set("no_such_key", "1").is_err());
    }

    #[test]
    fn unreadable_file_is_not_overwritten() {
        let f = fixture();
        std::fs::write(f.runtime.location(), "{ not json").unwrap();
        assert!(f.runtime.toggle("audio").is_err());
        assert_eq!(std::fs::read_to_string(f.runtime.location()).unwrap(), "{ not json");

        f.runtime.reset().unwrap();
        assert!(f.runtime.show().unwrap().parse_error.is_none());
    }
}
