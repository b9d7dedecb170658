//! ネイティブMessageBox補助（Windows以外は標準エラー出力）

use crate::i18n;
use sl_log_utils::write_lifecycle_line;

#[cfg(windows)]
mod win_flags {
    use windows::Win32::UI::WindowsAndMessaging::{
        MB_ICONERROR, MB_OK, MB_SETFOREGROUND, MB_TOPMOST, MESSAGEBOX_STYLE,
    };

    pub const ERROR: MESSAGEBOX_STYLE =
        MESSAGEBOX_STYLE(MB_OK.0 | MB_ICONERROR.0 | MB_TOPMOST.0 | MB_SETFOREGROUND.0);
}

fn log_message_box(kind: &str, title: &str, msg: &str) {
    write_lifecycle_line("UI", &format!("{}: {} - {}", kind, title, msg));
}

#[cfg(windows)]
fn show_message_box(title: &str, msg: &str, flags: windows::Win32::UI::WindowsAndMessaging::MESSAGEBOX_STYLE) {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use windows::Win32::UI::WindowsAndMessaging::MessageBoxW;
    use windows::core::PCWSTR;

    let title_w: Vec<u16> = OsStr::new(title).encode_wide().chain(std::iter::once(0)).collect();
    let text_w: Vec<u16> = OsStr::new(msg).encode_wide().chain(std::iter::once(0)).collect();

    let _ = unsafe { MessageBoxW(None, PCWSTR(text_w.as_ptr()), PCWSTR(title_w.as_ptr()), flags) };
}

pub fn show_error_msgbox(msg: &str) {
    let title = i18n::t().error_title();
    log_message_box("error", title, msg);
    #[cfg(windows)]
    show_message_box(title, msg, win_flags::ERROR);
    #[cfg(not(windows))]
    eprintln!("{}: {}", title, msg);
}
