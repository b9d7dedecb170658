//! 多言語対応（i18n）モジュール
//!
//! 日本語/英語の切り替えをサポート。
//! 設定ファイルの言語設定に基づいてUIテキストを提供。

use sl_domain::model::Language;

/// 翻訳テキストを取得するトレイト
pub trait Translations {
    // === ロック画面 ===
    fn lock_title(&self) -> &'static str;
    fn lock_heading(&self) -> &'static str;
    fn lock_press_key(&self, key: &str) -> String;
    fn lock_no_escape(&self, safe_key: Option<&str>) -> String;
    fn lock_enter_passcode(&self) -> &'static str;
    fn lock_consent(&self) -> &'static str;
    fn lock_wrong_passcode(&self) -> &'static str;
    fn lock_wrong_input(&self) -> &'static str;
    fn lock_unlocked(&self) -> &'static str;

    // === コンソール代替 ===
    fn console_key_prompt(&self) -> &'static str;
    fn console_passcode_prompt(&self) -> &'static str;
    fn console_unknown_key(&self, input: &str) -> String;

    // === エラー ===
    fn error_title(&self) -> &'static str;
    fn error_startup(&self, detail: &str) -> String;
}

/// 日本語
pub struct Japanese;

impl Translations for Japanese {
    fn lock_title(&self) -> &'static str { "SecureLock" }
    fn lock_heading(&self) -> &'static str { "このデバイスはロックされています。" }
    fn lock_press_key(&self, key: &str) -> String {
        format!("解除するには {} キーを押してください。", key)
    }
    fn lock_no_escape(&self, safe_key: Option<&str>) -> String {
        match safe_key {
            Some(key) => format!("{} キー以外のすべてのキーが監視の対象です。", key),
            None => "すべてのキーが監視の対象です。".to_string(),
        }
    }
    fn lock_enter_passcode(&self) -> &'static str {
        "解除するにはパスコードを入力して Enter を押してください。"
    }
    fn lock_consent(&self) -> &'static str {
        "このデバイスはロック中で監視されています。誤った入力は記録され、設定によってはカメラ・音声の記録やメール送信が行われます。"
    }
    fn lock_wrong_passcode(&self) -> &'static str { "パスコードが違います。" }
    fn lock_wrong_input(&self) -> &'static str { "誤った入力を記録しました。" }
    fn lock_unlocked(&self) -> &'static str { "ロックを解除しました。" }
    fn console_key_prompt(&self) -> &'static str { "キー名を入力 (例: F12, A, ESC): " }
    fn console_passcode_prompt(&self) -> &'static str { "パスコード: " }
    fn console_unknown_key(&self, input: &str) -> String {
        format!("不明なキー名です: {}", input)
    }
    fn error_title(&self) -> &'static str { "SecureLock エラー" }
    fn error_startup(&self, detail: &str) -> String {
        format!("ロックを開始できませんでした。\n{}", detail)
    }
}

/// 英語
pub struct English;

impl Translations for English {
    fn lock_title(&self) -> &'static str { "SecureLock" }
    fn lock_heading(&self) -> &'static str { "This device is locked." }
    fn lock_press_key(&self, key: &str) -> String {
        format!("Press {} to unlock.", key)
    }
    fn lock_no_escape(&self, safe_key: Option<&str>) -> String {
        match safe_key {
            Some(key) => format!("Every key except {} triggers monitoring.", key),
            None => "Every key triggers monitoring.".to_string(),
        }
    }
    fn lock_enter_passcode(&self) -> &'static str { "Enter the passcode and press Enter to unlock." }
    fn lock_consent(&self) -> &'static str {
        "This device is locked and monitored. Wrong input is recorded and, if enabled, camera/audio may be captured and an e-mail sent."
    }
    fn lock_wrong_passcode(&self) -> &'static str { "Wrong passcode." }
    fn lock_wrong_input(&self) -> &'static str { "Wrong input recorded." }
    fn lock_unlocked(&self) -> &'static str { "Unlocked." }
    fn console_key_prompt(&self) -> &'static str { "Key name (e.g. F12, A, ESC): " }
    fn console_passcode_prompt(&self) -> &'static str { "Passcode: " }
    fn console_unknown_key(&self, input: &str) -> String {
        format!("Unknown key name: {}", input)
    }
    fn error_title(&self) -> &'static str { "SecureLock Error" }
    fn error_startup(&self, detail: &str) -> String {
        format!("The lock could not be started.\n{}", detail)
    }
}

/// 言語設定から翻訳インスタンスを取得
pub fn get_translations(lang: Language) -> &'static dyn Translations {
    match lang {
        Language::Japanese => &Japanese,
        Language::English => &English,
    }
}

/// グローバル翻訳コンテキスト（スレッドローカル）
use std::cell::RefCell;

thread_local! {
    static CURRENT_LANG: RefCell<Language> = RefCell::new(Language::default());
}

/// 現在の言語を設定
pub fn set_language(lang: Language) {
    CURRENT_LANG.with(|l| *l.borrow_mut() = lang);
}

/// 現在の言語を取得
pub fn current_language() -> Language {
    CURRENT_LANG.with(|l| *l.borrow())
}

/// 現在の言語に基づく翻訳を取得
pub fn t() -> &'static dyn Translations {
    get_translations(current_language())
}

/// ロック画面の案内文（見出し、操作説明、同意文）
pub fn banner_lines(
    tr: &dyn Translations,
    passcode_mode: bool,
    unlock_key: Option<&str>,
    safe_key: Option<&str>,
    consent: bool,
) -> Vec<String> {
    let mut lines = vec![tr.lock_heading().to_string()];
    lines.push(if passcode_mode {
        tr.lock_enter_passcode().to_string()
    } else {
        match unlock_key {
            Some(key) => tr.lock_press_key(key),
            None => tr.lock_no_escape(safe_key),
        }
    });
    if consent {
        lines.push(tr.lock_consent().to_string());
    }
    lines
}
