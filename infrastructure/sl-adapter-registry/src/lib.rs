//! タスクマネージャー抑止ポリシーのレジストリアダプター
//!
//! `HKCU\Software\Microsoft\Windows\CurrentVersion\Policies\System\DisableTaskMgr`
//! を REG_DWORD=1 にして抑止し、復元時は元の値に戻す（元々無ければ削除）。

use sl_domain::error::DomainError;
use sl_domain::port::driven::TaskSwitcherPolicy;
use std::sync::Mutex;

pub const POLICY_SUBKEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Policies\System";
pub const POLICY_VALUE: &str = "DisableTaskMgr";

#[cfg(windows)]
pub type TaskManagerPolicy = WindowsTaskManagerPolicy;
#[cfg(not(windows))]
pub type TaskManagerPolicy = NonWindowsTaskManagerPolicy;

/// 抑止前の値（None: 未抑止、Some(None): 値なし、Some(Some(v)): 既存値）
type Saved = Mutex<Option<Option<u32>>>;

#[cfg(windows)]
#[derive(Debug, Default)]
pub struct WindowsTaskManagerPolicy {
    saved: Saved,
}

#[cfg(windows)]
impl WindowsTaskManagerPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(windows)]
impl TaskSwitcherPolicy for WindowsTaskManagerPolicy {
    fn disable(&self) -> Result<(), DomainError> {
        let mut saved = self.saved.lock().unwrap_or_else(|p| p.into_inner());
        if saved.is_some() {
            return Ok(());
        }
        let previous = win::read_dword()?;
        win::write_dword(1)?;
        *saved = Some(previous);
        Ok(())
    }

    fn restore(&self) -> Result<(), DomainError> {
        let mut saved = self.saved.lock().unwrap_or_else(|p| p.into_inner());
        match saved.take() {
            None => Ok(()),
            Some(Some(previous)) => win::write_dword(previous),
            Some(None) => win::delete_value(),
        }
    }
}

#[cfg(not(windows))]
#[derive(Debug, Default)]
pub struct NonWindowsTaskManagerPolicy {
    saved: Saved,
}

#[cfg(not(windows))]
impl NonWindowsTaskManagerPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// 抑止中か（開発用）
    pub fn is_disabled(&self) -> bool {
        self.saved.lock().unwrap_or_else(|p| p.into_inner()).is_some()
    }
}

#[cfg(not(windows))]
impl TaskSwitcherPolicy for NonWindowsTaskManagerPolicy {
    fn disable(&self) -> Result<(), DomainError> {
        let mut saved = self.saved.lock().unwrap_or_else(|p| p.into_inner());
        if saved.is_none() {
            *saved = Some(None);
        }
        Ok(())
    }

    fn restore(&self) -> Result<(), DomainError> {
        self.saved.lock().unwrap_or_else(|p| p.into_inner()).take();
        Ok(())
    }
}

#[cfg(windows)]
mod win {
    use super::{POLICY_SUBKEY, POLICY_VALUE};
    use sl_domain::error::DomainError;
    use windows::Win32::Foundation::{ERROR_ACCESS_DENIED, ERROR_SUCCESS, WIN32_ERROR};
    use windows::Win32::System::Registry::{
        HKEY, HKEY_CURRENT_USER, KEY_SET_VALUE, REG_DWORD, REG_OPTION_NON_VOLATILE, RRF_RT_REG_DWORD,
        RegCloseKey, RegCreateKeyExW, RegDeleteValueW, RegGetValueW, RegOpenKeyExW, RegSetValueExW,
    };
    use windows::core::PCWSTR;

    fn to_wide(s: &str) -> Vec<u16> {
        let mut wide: Vec<u16> = s.encode_utf16().collect();
        wide.push(0);
        wide
    }

    fn map_status(status: WIN32_ERROR, action: &str) -> Result<(), DomainError> {
        if status == ERROR_SUCCESS {
            return Ok(());
        }
        match status.0 {
            code if code == ERROR_ACCESS_DENIED.0 => Err(DomainError::RegistryAccessDenied(format!(
                "Access denied {} {}",
                action, POLICY_VALUE
            ))),
            _ => Err(DomainError::Unknown(format!(
                "Failed {} {}: status={}",
                action, POLICY_VALUE, status.0
            ))),
        }
    }

    pub(super) fn read_dword() -> Result<Option<u32>, DomainError> {
        let subkey = to_wide(POLICY_SUBKEY);
        let name = to_wide(POLICY_VALUE);
        let mut data: u32 = 0;
        let mut size = std::mem::size_of::<u32>() as u32;
        let status = unsafe {
            RegGetValueW(
                HKEY_CURRENT_USER,
                PCWSTR(subkey.as_ptr()),
                PCWSTR(name.as_ptr()),
                RRF_RT_REG_DWORD,
                None,
                Some(&mut data as *mut u32 as *mut _),
                Some(&mut size),
            )
        };
        match status.0 {
            0 => Ok(Some(data)),
            2 | 3 => Ok(None), // キーまたは値が無い
            _ => map_status(status, "reading").map(|_| None),
        }
    }

    pub(super) fn write_dword(value: u32) -> Result<(), DomainError> {
        let subkey = to_wide(POLICY_SUBKEY);
        let name = to_wide(POLICY_VALUE);
        let mut key = HKEY::default();
        let status = unsafe {
            RegCreateKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR(subkey.as_ptr()),
                Some(0),
                None,
                REG_OPTION_NON_VOLATILE,
                KEY_SET_VALUE,
                None,
                &mut key,
                None,
            )
        };
        map_status(status, "opening policy key for")?;
        let bytes = value.to_le_bytes();
        let status = unsafe { RegSetValueExW(key, PCWSTR(name.as_ptr()), Some(0), REG_DWORD, Some(&bytes)) };
        let _ = unsafe { RegCloseKey(key) };
        map_status(status, "writing")
    }

    pub(super) fn delete_value() -> Result<(), DomainError> {
        let subkey = to_wide(POLICY_SUBKEY);
        let name = to_wide(POLICY_VALUE);
        let mut key = HKEY::default();
        let status = unsafe {
            RegOpenKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR(subkey.as_ptr()),
                Some(0),
                KEY_SET_VALUE,
                &mut key,
            )
        };
        if status.0 == 2 {
            return Ok(());
        }
        map_status(status, "opening policy key for")?;
        let status = unsafe { RegDeleteValueW(key, PCWSTR(name.as_ptr())) };
        let _ = unsafe { RegCloseKey(key) };
        if status.0 == 2 {
            return Ok(()); // 値が見つからない
        }
        map_status(status, "deleting")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_path_matches_windows_policy_location() {
        assert!(POLICY_SUBKEY.ends_with(r"Policies\System"));
        assert_eq!(POLICY_VALUE, "DisableTaskMgr");
    }

    #[cfg(not(windows))]
    #[test]
    fn toggles_are_idempotent_off_windows() {
        let policy = TaskManagerPolicy::new();
        policy.restore().unwrap();
        policy.disable().unwrap();
        policy.disable().unwrap();
        assert!(policy.is_disabled());
        policy.restore().unwrap();
        assert!(!policy.is_disabled());
    }
}
