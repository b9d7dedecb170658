//! ライフサイクルログ
//!
//! 活動ログ（JSONL）を開く前後の起動・終了・パニックを1行ずつ残す。
//! 書込先は候補を順に試し、最初に開けた場所だけに書く。

use sl_domain::time::rfc3339_millis;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

const LIFECYCLE_FILE: &str = "sl-lifecycle.log";

/// 現在時刻（UTC, RFC3339 ミリ秒付き）
pub fn utc_now() -> String {
    let ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    rfc3339_millis(ms)
}

/// `[timestamp] [component] message` 形式の1行（改行はエスケープ）
pub fn lifecycle_line(component: &str, message: &str) -> String {
    format!("[{}] [{}] {}\n", utc_now(), component, message.replace('\n', "\\n"))
}

/// 書込先の候補リスト
#[derive(Debug, Clone)]
pub struct LifecycleLog {
    candidates: Vec<PathBuf>,
}

impl Default for LifecycleLog {
    /// 製品のログディレクトリ、だめなら一時ディレクトリ
    fn default() -> Self {
        let product_dir = if cfg!(windows) {
            std::env::var_os("ProgramData")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData"))
                .join("SecureLock")
        } else {
            PathBuf::from("./var")
        };
        Self::with_candidates(vec![
            product_dir.join("logs").join(LIFECYCLE_FILE),
            std::env::temp_dir().join(LIFECYCLE_FILE),
        ])
    }
}

impl LifecycleLog {
    pub fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// 書き込めた場所を返す。どこにも書けなければ None
    pub fn append(&self, line: &str) -> Option<PathBuf> {
        self.candidates.iter().find_map(|path| {
            if let Some(dir) = path.parent() {
                let _ = fs::create_dir_all(dir);
            }
            let mut file = OpenOptions::new().create(true).append(true).open(path).ok()?;
            file.write_all(line.as_bytes()).ok()?;
            Some(path.clone())
        })
    }
}

pub fn write_lifecycle_line(component: &str, message: &str) {
    let _ = LifecycleLog::default().append(&lifecycle_line(component, message));
}

/// パニック内容をライフサイクルログへ残す（元のフックも呼ぶ）
pub fn install_panic_hook(component: &'static str) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let at = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "?".to_string());
        let what = match (
            info.payload().downcast_ref::<&str>(),
            info.payload().downcast_ref::<String>(),
        ) {
            (Some(s), _) => s.to_string(),
            (None, Some(s)) => s.clone(),
            (None, None) => "non-string panic payload".to_string(),
        };
        write_lifecycle_line(component, &format!("panic at {}: {}", at, what));
        previous(info);
    }));
}
