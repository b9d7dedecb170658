//! JSON設定リポジトリ
//!
//! 読込は serde_json::Value を経由してフィールド単位で検証する（型違いのフィールドだけ既定値）。
//! 保存はDTOで固定のキー順にする。

use crate::write_atomic;
use serde::Serialize;
use sl_domain::error::DomainError;
use sl_domain::model::{ConfigDocument, LockConfig, RawValue};
use sl_domain::port::driven::{ConfigRepository, LoadedConfig};
use sl_domain::service::config_from_document;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct JsonConfigRepository {
    config_path: PathBuf,
}

impl JsonConfigRepository {
    pub fn new(config_path: impl AsRef<Path>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    fn write_defaults(&self) -> Result<LoadedConfig, DomainError> {
        let config = LockConfig::default();
        self.save(&config)?;
        Ok(LoadedConfig {
            config,
            warnings: Vec::new(),
            created_default: true,
            parse_error: None,
        })
    }
}

impl ConfigRepository for JsonConfigRepository {
    fn load(&self) -> Result<LoadedConfig, DomainError> {
        if !self.config_path.exists() {
            return self.write_defaults();
        }
        let text = fs::read_to_string(&self.config_path)
            .map_err(|e| DomainError::ConfigLoadFailed(format!("read config: {e}")))?;
        let parsed = serde_json::from_str::<serde_json::Value>(text.trim_start_matches('\u{feff}'))
            .map_err(|e| e.to_string())
            .and_then(|value| document_from_json(&value));
        match parsed {
            Ok(document) => {
                let (config, warnings) = config_from_document(&document);
                Ok(LoadedConfig {
                    config,
                    warnings,
                    created_default: false,
                    parse_error: None,
                })
            }
            // 解釈できないファイルは触らずに既定値で続行する
            Err(e) => Ok(LoadedConfig {
                config: LockConfig::default(),
                warnings: Vec::new(),
                created_default: false,
                parse_error: Some(e),
            }),
        }
    }

    fn save(&self, config: &LockConfig) -> Result<(), DomainError> {
        let dto = ConfigDto::from(config);
        let data = serde_json::to_string_pretty(&dto)
            .map_err(|e| DomainError::IoError(format!("serialize config: {e}")))?;
        write_atomic(&self.config_path, data.as_bytes())
            .map_err(|e| DomainError::IoError(format!("write config: {e}")))
    }

    fn exists(&self) -> bool {
        self.config_path.exists()
    }

    fn location(&self) -> PathBuf {
        self.config_path.clone()
    }
}

/// JSONオブジェクトをドキュメントに変換（ルートがオブジェクトでなければ Err）
pub fn document_from_json(value: &serde_json::Value) -> Result<ConfigDocument, String> {
    let Some(object) = value.as_object() else {
        return Err("config root must be a JSON object".to_string());
    };
    Ok(object
        .iter()
        .map(|(key, value)| (key.clone(), raw_value(value)))
        .collect())
}

fn raw_value(value: &serde_json::Value) -> RawValue {
    match value {
        serde_json::Value::Bool(b) => RawValue::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => RawValue::Int(i),
            None => n.as_f64().map(RawValue::Float).unwrap_or(RawValue::Other),
        },
        serde_json::Value::String(s) => RawValue::Text(s.clone()),
        _ => RawValue::Other,
    }
}

// ---------- DTO 定義 ----------

#[derive(Serialize)]
struct ConfigDto {
    unlock_mode: String,
    unlock_key: String,
    safe_key: String,
    unlock_passcode: String,
    camera_enabled: bool,
    audio_enabled: bool,
    audio_seconds: u32,
    screenshot_enabled: bool,
    email_enabled: bool,
    mail_attach_media: bool,
    cooldown_seconds_between_captures: u64,
    show_consent_banner: bool,
    mouse_triggers_enabled: bool,
    security_mode_enabled: bool,
    disable_task_manager: bool,
    block_system_keys: bool,
    ui_theme: String,
    show_animations: bool,
    include_system_info: bool,
    /// UI言語（"ja" または "en"）
    language: String,
}

impl From<&LockConfig> for ConfigDto {
    fn from(cfg: &LockConfig) -> Self {
        let key_name = |key: Option<sl_domain::model::KeyId>| {
            key.and_then(|k| k.name()).unwrap_or_default()
        };
        Self {
            unlock_mode: cfg.unlock.mode.to_code().to_string(),
            unlock_key: key_name(cfg.unlock.unlock_key),
            safe_key: key_name(cfg.unlock.safe_key),
            unlock_passcode: cfg.unlock.passcode.clone(),
            camera_enabled: cfg.evidence.camera_enabled,
            audio_enabled: cfg.evidence.audio_enabled,
            audio_seconds: cfg.evidence.audio_seconds,
            screenshot_enabled: cfg.evidence.screenshot_enabled,
            email_enabled: cfg.notify.email_enabled,
            mail_attach_media: cfg.notify.attach_media,
            cooldown_seconds_between_captures: cfg.unlock.cooldown_seconds,
            show_consent_banner: cfg.ui.show_consent_banner,
            mouse_triggers_enabled: cfg.unlock.mouse_triggers_enabled,
            security_mode_enabled: cfg.unlock.security_mode_enabled,
            disable_task_manager: cfg.unlock.disable_task_switcher,
            block_system_keys: cfg.unlock.block_system_keys,
            ui_theme: cfg.ui.theme.to_code().to_string(),
            show_animations: cfg.ui.show_animations,
            include_system_info: cfg.evidence.include_system_info,
            language: cfg.ui.language.to_code().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_domain::model::{KeyId, Language, UnlockMode};
    use sl_domain::service::DOCUMENT_KEYS;

    fn repo(dir: &tempfile::TempDir) -> JsonConfigRepository {
        JsonConfigRepository::new(dir.path().join("config").join("config.json"))
    }

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(&dir);
        assert!(!repo.exists());
        let loaded = repo.load().unwrap();
        assert!(loaded.created_default);
        assert_eq!(loaded.config, LockConfig::default());
        assert!(repo.exists());

        let text = fs::read_to_string(repo.location()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["unlock_key"], "F12");
        assert_eq!(value["cooldown_seconds_between_captures"], 30);
        for key in DOCUMENT_KEYS {
            assert!(value.get(*key).is_some(), "{key}");
        }
    }

    #[test]
    fn invalid_fields_fall_back_individually() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(&dir);
        fs::create_dir_all(repo.location().parent().unwrap()).unwrap();
        fs::write(
            repo.location(),
            r#"{"unlock_mode":"passcode","unlock_passcode":"987654","audio_enabled":"yes",
               "cooldown_seconds_between_captures":"10","language":"en","extra":1}"#,
        )
        .unwrap();
        let loaded = repo.load().unwrap();
        assert_eq!(loaded.config.unlock.mode, UnlockMode::Passcode);
        assert_eq!(loaded.config.unlock.passcode, "987654");
        assert!(!loaded.config.evidence.audio_enabled);
        assert_eq!(loaded.config.unlock.cooldown_seconds, 10);
        assert_eq!(loaded.config.ui.language, Language::English);
        assert_eq!(loaded.warnings.len(), 1);
        assert_eq!(loaded.warnings[0].field, "audio_enabled");
    }

    #[test]
    fn unparseable_file_uses_defaults_and_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(&dir);
        fs::create_dir_all(repo.location().parent().unwrap()).unwrap();
        fs::write(repo.location(), "{ not json").unwrap();
        let loaded = repo.load().unwrap();
        assert!(loaded.parse_error.is_some());
        assert_eq!(loaded.config, LockConfig::default());
        assert_eq!(fs::read_to_string(repo.location()).unwrap(), "{ not json");
    }

    #[test]
    fn non_object_root_is_a_parse_error() {
        assert!(document_from_json(&serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(&dir);
        let mut cfg = LockConfig::default();
        cfg.unlock.unlock_key = None;
        cfg.unlock.safe_key = KeyId::from_name("7");
        cfg.evidence.camera_enabled = true;
        repo.save(&cfg).unwrap();
        repo.save(&cfg).unwrap();
        let loaded = repo.load().unwrap();
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.config, cfg);
    }
}
