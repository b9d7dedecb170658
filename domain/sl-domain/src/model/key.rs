//! キー識別子
//!
//! Windows 仮想キーコードをそのまま値として持つ。設定ファイルではキー名で表現する。

use std::fmt;

/// 仮想キーコードのラッパー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(u16);

impl KeyId {
    pub const BACKSPACE: KeyId = KeyId(0x08);
    pub const TAB: KeyId = KeyId(0x09);
    pub const ENTER: KeyId = KeyId(0x0D);
    pub const SHIFT: KeyId = KeyId(0x10);
    pub const CONTROL: KeyId = KeyId(0x11);
    pub const ALT: KeyId = KeyId(0x12);
    pub const ESCAPE: KeyId = KeyId(0x1B);
    pub const SPACE: KeyId = KeyId(0x20);
    pub const DELETE: KeyId = KeyId(0x2E);
    pub const LWIN: KeyId = KeyId(0x5B);
    pub const RWIN: KeyId = KeyId(0x5C);
    pub const F4: KeyId = KeyId(0x73);
    pub const F12: KeyId = KeyId(0x7B);

    pub const fn from_vk(vk: u16) -> Self {
        Self(vk)
    }

    pub const fn vk(&self) -> u16 {
        self.0
    }

    /// キー名から変換（大文字小文字を区別しない）
    ///
    /// 受理する名前: F1-F24, A-Z, 0-9, ESC, ENTER, SPACE, TAB, BACKSPACE
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        match upper.as_str() {
            "ESC" | "ESCAPE" => return Some(Self::ESCAPE),
            "ENTER" | "RETURN" => return Some(Self::ENTER),
            "SPACE" => return Some(Self::SPACE),
            "TAB" => return Some(Self::TAB),
            "BACKSPACE" => return Some(Self::BACKSPACE),
            _ => {}
        }
        let bytes = upper.as_bytes();
        if bytes.len() == 1 {
            let c = bytes[0];
            if c.is_ascii_uppercase() || c.is_ascii_digit() {
                // A-Z / 0-9 は ASCII コードと同じ
                return Some(Self(c as u16));
            }
            return None;
        }
        if let Some(num) = upper.strip_prefix('F') {
            if let Ok(n) = num.parse::<u16>() {
                if (1..=24).contains(&n) {
                    return Some(Self(0x70 + n - 1));
                }
            }
        }
        None
    }

    /// 設定ファイル向けの正規名（名前を持たないキーは None）
    pub fn name(&self) -> Option<String> {
        match self.0 {
            0x08 => Some("BACKSPACE".into()),
            0x09 => Some("TAB".into()),
            0x0D => Some("ENTER".into()),
            0x1B => Some("ESC".into()),
            0x20 => Some("SPACE".into()),
            0x30..=0x39 | 0x41..=0x5A => Some(char::from(self.0 as u8).to_string()),
            0x70..=0x87 => Some(format!("F{}", self.0 - 0x70 + 1)),
            _ => None,
        }
    }

    /// 単一の英数字キーか（セーフキーの制約）
    pub fn is_alphanumeric(&self) -> bool {
        matches!(self.0, 0x30..=0x39 | 0x41..=0x5A)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "VK_0x{:02X}", self.0),
        }
    }
}

/// 解除モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnlockMode {
    /// 単一キーで解除（または解除不能モード）
    #[default]
    SingleKey,
    /// パスコード入力で解除
    Passcode,
}

impl UnlockMode {
    /// 設定ファイル上の表記から変換（"key" / "passcode"）
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "key" => Some(Self::SingleKey),
            "passcode" => Some(Self::Passcode),
            _ => None,
        }
    }

    pub fn to_code(&self) -> &'static str {
        match self {
            Self::SingleKey => "key",
            Self::Passcode => "passcode",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_function_keys() {
        assert_eq!(KeyId::from_name("F1"), Some(KeyId::from_vk(0x70)));
        assert_eq!(KeyId::from_name("f12"), Some(KeyId::F12));
        assert_eq!(KeyId::from_name("F24"), Some(KeyId::from_vk(0x87)));
        assert_eq!(KeyId::from_name("F25"), None);
        assert_eq!(KeyId::from_name("F0"), None);
    }

    #[test]
    fn parses_alphanumerics_and_named_keys() {
        assert_eq!(KeyId::from_name("y"), Some(KeyId::from_vk(0x59)));
        assert_eq!(KeyId::from_name("7"), Some(KeyId::from_vk(0x37)));
        assert_eq!(KeyId::from_name("esc"), Some(KeyId::ESCAPE));
        assert_eq!(KeyId::from_name(" Enter "), Some(KeyId::ENTER));
        assert_eq!(KeyId::from_name("%"), None);
        assert_eq!(KeyId::from_name(""), None);
    }

    #[test]
    fn names_round_trip_for_named_keys() {
        for name in ["F5", "Q", "3", "ESC", "SPACE", "TAB", "BACKSPACE", "ENTER"] {
            let key = KeyId::from_name(name).unwrap();
            assert_eq!(key.name().as_deref(), Some(name));
        }
        assert_eq!(KeyId::LWIN.name(), None);
        assert_eq!(KeyId::LWIN.to_string(), "VK_0x5B");
    }

    #[test]
    fn unlock_mode_codes() {
        assert_eq!(UnlockMode::from_code("Passcode"), Some(UnlockMode::Passcode));
        assert_eq!(UnlockMode::from_code("key"), Some(UnlockMode::SingleKey));
        assert_eq!(UnlockMode::from_code("pin"), None);
    }
}
