//! 設定ドキュメントの値表現
//!
//! JSON などの具体形式に依存しないキー/値表現。アダプターが変換して渡す。

use std::collections::BTreeMap;
use std::fmt;

/// ドキュメント上の1値
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// null / 配列 / オブジェクト等
    Other,
}

impl RawValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::Float(_) => "number",
            Self::Text(_) => "string",
            Self::Other => "other",
        }
    }
}

/// キー名 → 値
pub type ConfigDocument = BTreeMap<String, RawValue>;

/// フィールド単位の検証警告（該当フィールドは既定値のまま）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
}

impl ConfigWarning {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
