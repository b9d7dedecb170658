//! SecureLockの既定パス解決

use std::path::PathBuf;

#[cfg(windows)]
fn known_folder_path(id: &windows::core::GUID) -> Option<PathBuf> {
    use windows::Win32::System::Com::CoTaskMemFree;
    use windows::Win32::UI::Shell::{KF_FLAG_DEFAULT, SHGetKnownFolderPath};
    use windows::core::PWSTR;

    unsafe {
        let raw: PWSTR = SHGetKnownFolderPath(id, KF_FLAG_DEFAULT, None).ok()?;
        let s = raw.to_string().unwrap_or_default();
        CoTaskMemFree(Some(raw.0 as _));
        if s.is_empty() { None } else { Some(PathBuf::from(s)) }
    }
}

/// 既定のデータディレクトリ
///
/// - Windows: `C:\ProgramData\SecureLock`（既知フォルダ）
/// - その他: `./var`（開発/テスト用）
pub fn default_data_dir() -> PathBuf {
    #[cfg(windows)]
    {
        use windows::Win32::UI::Shell::FOLDERID_ProgramData;

        known_folder_path(&FOLDERID_ProgramData)
            .or_else(|| std::env::var("ProgramData").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData"))
            .join("SecureLock")
    }
    #[cfg(not(windows))]
    {
        PathBuf::from("./var")
    }
}

/// 設定ファイル用ディレクトリ
pub fn default_config_dir() -> PathBuf {
    default_data_dir().join("config")
}

/// 設定ファイルの既定パス
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.json")
}

/// メール送信設定（env形式）の既定パス
pub fn default_mail_env_path() -> PathBuf {
    default_config_dir().join("mail.env")
}

/// ログファイル用ディレクトリ
pub fn default_log_dir() -> PathBuf {
    default_data_dir().join("logs")
}

/// 活動ログの既定パス
pub fn default_activity_log_path() -> PathBuf {
    default_log_dir().join("activity.log.jsonl")
}

/// 証拠ファイル用ディレクトリ
pub fn default_capture_dir() -> PathBuf {
    default_data_dir().join("captures")
}

/// 設定ファイルと同じ場所にある mail.env
pub fn mail_env_path_beside(config_path: &std::path::Path) -> PathBuf {
    config_path
        .parent()
        .map(|dir| dir.join("mail.env"))
        .unwrap_or_else(default_mail_env_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted_in_data_dir() {
        let root = default_data_dir();
        assert!(default_config_path().starts_with(&root));
        assert!(default_activity_log_path().starts_with(root.join("logs")));
        assert!(default_capture_dir().ends_with("captures"));
    }

    #[test]
    fn mail_env_sits_beside_config() {
        let path = mail_env_path_beside(std::path::Path::new("/tmp/cfg/config.json"));
        assert_eq!(path, PathBuf::from("/tmp/cfg/mail.env"));
    }
}
