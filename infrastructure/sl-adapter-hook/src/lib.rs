//! 低レベルキーボードフック（WH_KEYBOARD_LL）アダプター
//!
//! コールバック内ではロックもログ出力もしない。
//! 判定は `sl_domain::service::filter_decision` に委ね、ブロック件数だけ原子的に数える。

use sl_domain::error::HookError;
use sl_domain::model::{FilterDecision, HookHandle, KeyEvent, KeyId, Modifiers};
use sl_domain::port::driven::{InputFilterHost, ModifierState};
use sl_domain::service::filter_decision;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

static MODIFIERS: OnceLock<Arc<dyn ModifierState>> = OnceLock::new();
static BLOCKED: AtomicU64 = AtomicU64::new(0);
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// フックから見た1回のキー遷移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyStroke {
    pub vk: u16,
    pub key_down: bool,
    /// KBDLLHOOKSTRUCT の LLKHF_ALTDOWN
    pub alt_flag: bool,
}

/// 1回のキー遷移を判定し、ブロックした押下を数える
pub fn judge_stroke(stroke: RawKeyStroke, held: Modifiers) -> FilterDecision {
    let modifiers = Modifiers {
        alt: held.alt || stroke.alt_flag,
        ..held
    };
    let decision = filter_decision(&KeyEvent::new(KeyId::from_vk(stroke.vk), modifiers));
    if decision == FilterDecision::Block && stroke.key_down {
        BLOCKED.fetch_add(1, Ordering::Relaxed);
    }
    decision
}

fn current_modifiers() -> Modifiers {
    MODIFIERS
        .get()
        .map(|state| state.snapshot())
        .unwrap_or_default()
}

/// プロセスに1つだけ登録できるキーボードフィルタ
pub struct LowLevelKeyboardHost {
    _private: (),
}

impl LowLevelKeyboardHost {
    /// 修飾キーの読み取り元は最初に渡したものが使われる
    pub fn new(modifiers: Arc<dyn ModifierState>) -> Self {
        let _ = MODIFIERS.set(modifiers);
        Self { _private: () }
    }
}

impl InputFilterHost for LowLevelKeyboardHost {
    fn install(&self) -> Result<HookHandle, HookError> {
        if INSTALLED.swap(true, Ordering::SeqCst) {
            return Err(HookError::AlreadyInstalled);
        }
        match platform::install() {
            Ok(handle) => Ok(handle),
            Err(err) => {
                INSTALLED.store(false, Ordering::SeqCst);
                Err(err)
            }
        }
    }

    fn remove(&self, handle: HookHandle) -> Result<(), HookError> {
        platform::remove(handle)?;
        INSTALLED.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn blocked_count(&self) -> u64 {
        BLOCKED.load(Ordering::Relaxed)
    }
}

#[cfg(windows)]
mod platform {
    use super::{RawKeyStroke, current_modifiers, judge_stroke};
    use sl_domain::error::HookError;
    use sl_domain::model::{FilterDecision, HookHandle};
    use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::WindowsAndMessaging::{
        CallNextHookEx, HC_ACTION, HHOOK, KBDLLHOOKSTRUCT, LLKHF_ALTDOWN, SetWindowsHookExW,
        UnhookWindowsHookEx, WH_KEYBOARD_LL, WM_KEYDOWN, WM_KEYUP, WM_SYSKEYDOWN, WM_SYSKEYUP,
    };

    fn error_code(err: &windows::core::Error) -> u32 {
        err.code().0 as u32
    }

    pub(super) fn install() -> Result<HookHandle, HookError> {
        let module = unsafe { GetModuleHandleW(None) }.map_err(|e| HookError::InstallFailed(error_code(&e)))?;
        let hook = unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_proc), Some(module.into()), 0) }
            .map_err(|e| HookError::InstallFailed(error_code(&e)))?;
        Ok(HookHandle::from_raw(hook.0 as usize))
    }

    pub(super) fn remove(handle: HookHandle) -> Result<(), HookError> {
        let hook = HHOOK(handle.raw() as *mut _);
        unsafe { UnhookWindowsHookEx(hook) }.map_err(|e| HookError::RemoveFailed(error_code(&e)))
    }

    unsafe extern "system" fn keyboard_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
        if code == HC_ACTION as i32 && lparam.0 != 0 {
            let message = wparam.0 as u32;
            let key_down = message == WM_KEYDOWN || message == WM_SYSKEYDOWN;
            let key_up = message == WM_KEYUP || message == WM_SYSKEYUP;
            if key_down || key_up {
                let info = unsafe { &*(lparam.0 as *const KBDLLHOOKSTRUCT) };
                let stroke = RawKeyStroke {
                    vk: info.vkCode as u16,
                    key_down,
                    alt_flag: (info.flags.0 & LLKHF_ALTDOWN.0) != 0,
                };
                if judge_stroke(stroke, current_modifiers()) == FilterDecision::Block {
                    return LRESULT(1);
                }
            }
        }
        unsafe { CallNextHookEx(None, code, wparam, lparam) }
    }
}

#[cfg(not(windows))]
mod platform {
    use sl_domain::error::HookError;
    use sl_domain::model::HookHandle;

    pub(super) fn install() -> Result<HookHandle, HookError> {
        Err(HookError::Unsupported)
    }

    pub(super) fn remove(_handle: HookHandle) -> Result<(), HookError> {
        Ok(())
    }
}
