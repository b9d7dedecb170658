//! 設定ドキュメントの検証と変換
//!
//! フィールド単位で検証し、不正なフィールドは既定値のまま警告を返す。
//! 設定読込が起動を止めることはない。

use crate::error::DomainError;
use crate::model::{
    ConfigDocument, ConfigWarning, KeyId, Language, LockConfig, MAX_AUDIO_SECONDS,
    MAX_COOLDOWN_SECONDS, MIN_AUDIO_SECONDS, MIN_PASSCODE_LEN, RawValue, Theme, UnlockMode,
};

pub const KEY_UNLOCK_MODE: &str = "unlock_mode";
pub const KEY_UNLOCK_KEY: &str = "unlock_key";
pub const KEY_SAFE_KEY: &str = "safe_key";
pub const KEY_UNLOCK_PASSCODE: &str = "unlock_passcode";
pub const KEY_CAMERA_ENABLED: &str = "camera_enabled";
pub const KEY_AUDIO_ENABLED: &str = "audio_enabled";
pub const KEY_AUDIO_SECONDS: &str = "audio_seconds";
pub const KEY_SCREENSHOT_ENABLED: &str = "screenshot_enabled";
pub const KEY_EMAIL_ENABLED: &str = "email_enabled";
pub const KEY_MAIL_ATTACH_MEDIA: &str = "mail_attach_media";
pub const KEY_COOLDOWN: &str = "cooldown_seconds_between_captures";
pub const KEY_SHOW_CONSENT_BANNER: &str = "show_consent_banner";
pub const KEY_MOUSE_TRIGGERS: &str = "mouse_triggers_enabled";
pub const KEY_SECURITY_MODE: &str = "security_mode_enabled";
pub const KEY_DISABLE_TASK_MANAGER: &str = "disable_task_manager";
pub const KEY_BLOCK_SYSTEM_KEYS: &str = "block_system_keys";
pub const KEY_UI_THEME: &str = "ui_theme";
pub const KEY_SHOW_ANIMATIONS: &str = "show_animations";
pub const KEY_INCLUDE_SYSTEM_INFO: &str = "include_system_info";
pub const KEY_LANGUAGE: &str = "language";

/// ドキュメントのキー（保存・表示順）
pub const DOCUMENT_KEYS: &[&str] = &[
    KEY_UNLOCK_MODE,
    KEY_UNLOCK_KEY,
    KEY_SAFE_KEY,
    KEY_UNLOCK_PASSCODE,
    KEY_CAMERA_ENABLED,
    KEY_AUDIO_ENABLED,
    KEY_AUDIO_SECONDS,
    KEY_SCREENSHOT_ENABLED,
    KEY_EMAIL_ENABLED,
    KEY_MAIL_ATTACH_MEDIA,
    KEY_COOLDOWN,
    KEY_SHOW_CONSENT_BANNER,
    KEY_MOUSE_TRIGGERS,
    KEY_SECURITY_MODE,
    KEY_DISABLE_TASK_MANAGER,
    KEY_BLOCK_SYSTEM_KEYS,
    KEY_UI_THEME,
    KEY_SHOW_ANIMATIONS,
    KEY_INCLUDE_SYSTEM_INFO,
    KEY_LANGUAGE,
];

/// ドキュメントから設定を組み立てる
pub fn config_from_document(doc: &ConfigDocument) -> (LockConfig, Vec<ConfigWarning>) {
    let mut cfg = LockConfig::default();
    let mut warnings = Vec::new();

    if let Some(value) = doc.get(KEY_UNLOCK_MODE) {
        match text_of(value).as_deref().and_then(UnlockMode::from_code) {
            Some(mode) => cfg.unlock.mode = mode,
            None => warnings.push(invalid(KEY_UNLOCK_MODE, value, "expected \"key\" or \"passcode\"")),
        }
    }

    if let Some(value) = doc.get(KEY_UNLOCK_KEY) {
        match text_of(value) {
            Some(text) if text.trim().is_empty() => cfg.unlock.unlock_key = None,
            Some(text) => match KeyId::from_name(&text) {
                Some(key) => cfg.unlock.unlock_key = Some(key),
                None => warnings.push(invalid(KEY_UNLOCK_KEY, value, "unknown key name")),
            },
            None => warnings.push(invalid(KEY_UNLOCK_KEY, value, "expected a key name")),
        }
    }

    if let Some(value) = doc.get(KEY_SAFE_KEY) {
        match text_of(value) {
            Some(text) if text.trim().is_empty() => cfg.unlock.safe_key = None,
            Some(text) => match KeyId::from_name(&text) {
                Some(key) if key.is_alphanumeric() => cfg.unlock.safe_key = Some(key),
                _ => warnings.push(invalid(KEY_SAFE_KEY, value, "expected a single letter or digit")),
            },
            None => warnings.push(invalid(KEY_SAFE_KEY, value, "expected a single letter or digit")),
        }
    }

    if let Some(value) = doc.get(KEY_UNLOCK_PASSCODE) {
        match text_of(value) {
            Some(text) if text.chars().count() >= MIN_PASSCODE_LEN => cfg.unlock.passcode = text,
            Some(_) => warnings.push(ConfigWarning::new(
                KEY_UNLOCK_PASSCODE,
                format!("passcode shorter than {} characters", MIN_PASSCODE_LEN),
            )),
            None => warnings.push(invalid(KEY_UNLOCK_PASSCODE, value, "expected a string")),
        }
    }

    read_bool(doc, KEY_CAMERA_ENABLED, &mut cfg.evidence.camera_enabled, &mut warnings);
    read_bool(doc, KEY_AUDIO_ENABLED, &mut cfg.evidence.audio_enabled, &mut warnings);
    read_bool(doc, KEY_SCREENSHOT_ENABLED, &mut cfg.evidence.screenshot_enabled, &mut warnings);
    read_bool(doc, KEY_INCLUDE_SYSTEM_INFO, &mut cfg.evidence.include_system_info, &mut warnings);
    read_bool(doc, KEY_EMAIL_ENABLED, &mut cfg.notify.email_enabled, &mut warnings);
    read_bool(doc, KEY_MAIL_ATTACH_MEDIA, &mut cfg.notify.attach_media, &mut warnings);
    read_bool(doc, KEY_SHOW_CONSENT_BANNER, &mut cfg.ui.show_consent_banner, &mut warnings);
    read_bool(doc, KEY_SHOW_ANIMATIONS, &mut cfg.ui.show_animations, &mut warnings);
    read_bool(doc, KEY_MOUSE_TRIGGERS, &mut cfg.unlock.mouse_triggers_enabled, &mut warnings);
    read_bool(doc, KEY_SECURITY_MODE, &mut cfg.unlock.security_mode_enabled, &mut warnings);
    read_bool(doc, KEY_DISABLE_TASK_MANAGER, &mut cfg.unlock.disable_task_switcher, &mut warnings);
    read_bool(doc, KEY_BLOCK_SYSTEM_KEYS, &mut cfg.unlock.block_system_keys, &mut warnings);

    if let Some(value) = doc.get(KEY_AUDIO_SECONDS) {
        match int_of(value) {
            Some(n) if (MIN_AUDIO_SECONDS as i64..=MAX_AUDIO_SECONDS as i64).contains(&n) => {
                cfg.evidence.audio_seconds = n as u32
            }
            Some(n) => warnings.push(ConfigWarning::new(
                KEY_AUDIO_SECONDS,
                format!("{} is outside {}-{}", n, MIN_AUDIO_SECONDS, MAX_AUDIO_SECONDS),
            )),
            None => warnings.push(invalid(KEY_AUDIO_SECONDS, value, "expected an integer")),
        }
    }

    if let Some(value) = doc.get(KEY_COOLDOWN) {
        match int_of(value) {
            Some(n) if (0..=MAX_COOLDOWN_SECONDS as i64).contains(&n) => {
                cfg.unlock.cooldown_seconds = n as u64
            }
            Some(n) => warnings.push(ConfigWarning::new(
                KEY_COOLDOWN,
                format!("{} is outside 0-{}", n, MAX_COOLDOWN_SECONDS),
            )),
            None => warnings.push(invalid(KEY_COOLDOWN, value, "expected an integer")),
        }
    }

    if let Some(value) = doc.get(KEY_UI_THEME) {
        match text_of(value).as_deref().and_then(Theme::from_code) {
            Some(theme) => cfg.ui.theme = theme,
            None => warnings.push(invalid(KEY_UI_THEME, value, "expected \"dark\" or \"light\"")),
        }
    }

    if let Some(value) = doc.get(KEY_LANGUAGE) {
        match text_of(value).as_deref().and_then(Language::parse_code) {
            Some(lang) => cfg.ui.language = lang,
            None => warnings.push(invalid(KEY_LANGUAGE, value, "expected \"ja\" or \"en\"")),
        }
    }

    // 解除キーとセーフキーが同じだと解除できないため、セーフキー側を捨てる
    if cfg.unlock.mode == UnlockMode::SingleKey
        && cfg.unlock.unlock_key.is_some()
        && cfg.unlock.unlock_key == cfg.unlock.safe_key
    {
        warnings.push(ConfigWarning::new(
            KEY_SAFE_KEY,
            "same as unlock_key; safe key disabled",
        ));
        cfg.unlock.safe_key = None;
    }

    (cfg, warnings)
}

/// 設定をドキュメントへ変換（`DOCUMENT_KEYS` 順）
pub fn config_to_document(cfg: &LockConfig) -> Vec<(&'static str, RawValue)> {
    let key_text = |key: Option<KeyId>| RawValue::Text(key.and_then(|k| k.name()).unwrap_or_default());
    vec![
        (KEY_UNLOCK_MODE, RawValue::Text(cfg.unlock.mode.to_code().into())),
        (KEY_UNLOCK_KEY, key_text(cfg.unlock.unlock_key)),
        (KEY_SAFE_KEY, key_text(cfg.unlock.safe_key)),
        (KEY_UNLOCK_PASSCODE, RawValue::Text(cfg.unlock.passcode.clone())),
        (KEY_CAMERA_ENABLED, RawValue::Bool(cfg.evidence.camera_enabled)),
        (KEY_AUDIO_ENABLED, RawValue::Bool(cfg.evidence.audio_enabled)),
        (KEY_AUDIO_SECONDS, RawValue::Int(cfg.evidence.audio_seconds as i64)),
        (KEY_SCREENSHOT_ENABLED, RawValue::Bool(cfg.evidence.screenshot_enabled)),
        (KEY_EMAIL_ENABLED, RawValue::Bool(cfg.notify.email_enabled)),
        (KEY_MAIL_ATTACH_MEDIA, RawValue::Bool(cfg.notify.attach_media)),
        (KEY_COOLDOWN, RawValue::Int(cfg.unlock.cooldown_seconds as i64)),
        (KEY_SHOW_CONSENT_BANNER, RawValue::Bool(cfg.ui.show_consent_banner)),
        (KEY_MOUSE_TRIGGERS, RawValue::Bool(cfg.unlock.mouse_triggers_enabled)),
        (KEY_SECURITY_MODE, RawValue::Bool(cfg.unlock.security_mode_enabled)),
        (KEY_DISABLE_TASK_MANAGER, RawValue::Bool(cfg.unlock.disable_task_switcher)),
        (KEY_BLOCK_SYSTEM_KEYS, RawValue::Bool(cfg.unlock.block_system_keys)),
        (KEY_UI_THEME, RawValue::Text(cfg.ui.theme.to_code().into())),
        (KEY_SHOW_ANIMATIONS, RawValue::Bool(cfg.ui.show_animations)),
        (KEY_INCLUDE_SYSTEM_INFO, RawValue::Bool(cfg.evidence.include_system_info)),
        (KEY_LANGUAGE, RawValue::Text(cfg.ui.language.to_code().into())),
    ]
}

/// コマンドライン入力を値に解釈（true/false、整数、それ以外は文字列）
pub fn parse_setting_text(text: &str) -> RawValue {
    let trimmed = text.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" => return RawValue::Bool(true),
        "false" | "off" | "no" => return RawValue::Bool(false),
        _ => {}
    }
    match trimmed.parse::<i64>() {
        Ok(n) => RawValue::Int(n),
        Err(_) => RawValue::Text(text.to_string()),
    }
}

/// 文字列のまま保持するキー（先頭の 0 を落とさない）
const TEXT_KEYS: &[&str] = &[
    KEY_UNLOCK_MODE,
    KEY_UNLOCK_KEY,
    KEY_SAFE_KEY,
    KEY_UNLOCK_PASSCODE,
    KEY_UI_THEME,
    KEY_LANGUAGE,
];

/// キーに応じてコマンドライン入力を解釈
pub fn parse_setting_for(key: &str, text: &str) -> RawValue {
    if TEXT_KEYS.contains(&key) {
        RawValue::Text(text.to_string())
    } else {
        parse_setting_text(text)
    }
}

/// 1フィールドだけ変更した設定を返す（検証に失敗したら Err）
pub fn apply_setting(cfg: &LockConfig, key: &str, value: RawValue) -> Result<LockConfig, DomainError> {
    if !DOCUMENT_KEYS.contains(&key) {
        return Err(DomainError::ValidationError(format!("unknown setting: {}", key)));
    }
    let mut doc: ConfigDocument = config_to_document(cfg)
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    doc.insert(key.to_string(), value);
    let (updated, warnings) = config_from_document(&doc);
    if let Some(w) = warnings.into_iter().next() {
        return Err(DomainError::ValidationError(w.to_string()));
    }
    Ok(updated)
}

fn read_bool(doc: &ConfigDocument, key: &str, slot: &mut bool, warnings: &mut Vec<ConfigWarning>) {
    match doc.get(key) {
        None => {}
        Some(RawValue::Bool(b)) => *slot = *b,
        Some(other) => warnings.push(invalid(key, other, "expected a boolean")),
    }
}

fn text_of(value: &RawValue) -> Option<String> {
    match value {
        RawValue::Text(s) => Some(s.clone()),
        RawValue::Int(n) => Some(n.to_string()),
        _ => None,
    }
}

fn int_of(value: &RawValue) -> Option<i64> {
    match value {
        RawValue::Int(n) => Some(*n),
        RawValue::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
        RawValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn invalid(field: &str, value: &RawValue, expected: &str) -> ConfigWarning {
    let shown = match value {
        RawValue::Text(s) => format!("\"{}\"", s),
        RawValue::Int(n) => n.to_string(),
        RawValue::Float(f) => f.to_string(),
        RawValue::Bool(b) => b.to_string(),
        RawValue::Other => value.kind().to_string(),
    };
    ConfigWarning::new(field, format!("invalid value {} ({})", shown, expected))
}
