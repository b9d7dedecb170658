//! 言語設定
//!
//! ロック画面のバナーと運用者向けメッセージの表示言語。

use std::fmt;

/// サポートする言語
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    /// 日本語
    #[default]
    Japanese,
    /// 英語
    English,
}

impl Language {
    /// 言語コードから変換（未知のコードは None）
    pub fn parse_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "en" | "english" => Some(Language::English),
            "ja" | "jp" | "japanese" => Some(Language::Japanese),
            _ => None,
        }
    }

    /// 言語コードから変換（未知のコードは既定）
    pub fn from_code(code: &str) -> Self {
        Self::parse_code(code).unwrap_or_default()
    }

    /// 言語コードに変換
    pub fn to_code(&self) -> &'static str {
        match self {
            Language::Japanese => "ja",
            Language::English => "en",
        }
    }

    /// 表示名を取得
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Japanese => "日本語",
            Language::English => "English",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(Language::from_code("ja"), Language::Japanese);
        assert_eq!(Language::from_code("EN"), Language::English);
        assert_eq!(Language::from_code("klingon"), Language::Japanese); // 既定
        assert_eq!(Language::parse_code("klingon"), None);
    }

    #[test]
    fn test_to_code() {
        assert_eq!(Language::Japanese.to_code(), "ja");
        assert_eq!(Language::English.to_code(), "en");
    }
}
