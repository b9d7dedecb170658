//! 時刻・修飾キー状態アダプター
use sl_domain::model::Modifiers;
use sl_domain::port::driven::{Clock, ModifierState};
use sl_domain::time::rfc3339_millis;
use std::time::Instant;

#[cfg(windows)]
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, VIRTUAL_KEY, VK_CONTROL, VK_LWIN, VK_MENU, VK_RWIN, VK_SHIFT,
};

/// 単調時計の起点は生成時刻
#[derive(Debug, Clone, Copy)]
pub struct ClockAdapter {
    anchor: Instant,
}

impl ClockAdapter {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }
}

impl Default for ClockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ClockAdapter {
    fn now_ms(&self) -> u64 {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        now.as_millis() as u64
    }

    fn now_iso8601(&self) -> String {
        rfc3339_millis(self.now_ms())
    }

    fn monotonic_ms(&self) -> u64 {
        self.anchor.elapsed().as_millis() as u64
    }
}

impl ModifierState for ClockAdapter {
    fn snapshot(&self) -> Modifiers {
        #[cfg(windows)]
        {
            fn key_down(vk: VIRTUAL_KEY) -> bool {
                unsafe { (GetAsyncKeyState(vk.0 as i32) as u16 & 0x8000) != 0 }
            }

            Modifiers {
                ctrl: key_down(VK_CONTROL),
                alt: key_down(VK_MENU),
                shift: key_down(VK_SHIFT),
                win: key_down(VK_LWIN) || key_down(VK_RWIN),
            }
        }
        #[cfg(not(windows))]
        {
            Modifiers::default()
        }
    }
}
