//! ロック画面の実装（Win32 / コンソール代替）

use crate::error::Result;
use sl_domain::port::driven::{LockSurface, LockView};
use sl_domain::port::driving::LockController;
use sl_ui_common::i18n;

#[derive(Debug, Default)]
pub struct LockScreen;

impl LockScreen {
    pub fn new() -> Self {
        Self
    }
}

impl LockSurface for LockScreen {
    fn run(&self, controller: &mut dyn LockController, view: &LockView) -> Result<()> {
        i18n::set_language(view.language);

        #[cfg(target_os = "windows")]
        {
            win32_screen::run(controller, view)
        }
        #[cfg(not(target_os = "windows"))]
        {
            console_fallback::run(controller, view)
        }
    }
}

#[cfg(target_os = "windows")]
mod win32_screen {
    use crate::error::{Result, err};
    use crate::input::{Effect, SurfaceState};
    use sl_domain::model::{PointerKind, Theme};
    use sl_domain::port::driven::LockView;
    use sl_domain::port::driving::LockController;
    use std::ffi::c_void;
    use std::mem::size_of;

    use windows::Win32::Foundation::{COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM};
    use windows::Win32::Graphics::Gdi::*;
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::HiDpi::*;
    use windows::Win32::UI::WindowsAndMessaging::*;
    use windows::core::PCWSTR;

    const fn rgb(r: u8, g: u8, b: u8) -> u32 {
        (r as u32) | ((g as u32) << 8) | ((b as u32) << 16)
    }

    struct Palette {
        bg: u32,
        text: u32,
        muted: u32,
        alert: u32,
    }

    const DARK: Palette = Palette {
        bg: rgb(17, 17, 19),
        text: rgb(244, 244, 245),
        muted: rgb(161, 161, 170),
        alert: rgb(248, 113, 113),
    };
    const LIGHT: Palette = Palette {
        bg: rgb(255, 255, 255),
        text: rgb(9, 9, 11),
        muted: rgb(113, 113, 122),
        alert: rgb(220, 38, 38),
    };

    const TIMER_ID: usize = 7;
    const TIMER_MS: u32 = 500;
    const CLASS_NAME: &str = "SecureLockSurface";

    struct WinState<'a> {
        controller: &'a mut dyn LockController,
        ui: SurfaceState,
        palette: &'static Palette,
        font_title: HFONT,
        font_body: HFONT,
        font_code: HFONT,
        scale: f32,
        caret_on: bool,
        ticks: u32,
    }

    impl Drop for WinState<'_> {
        fn drop(&mut self) {
            unsafe {
                for font in [self.font_title, self.font_body, self.font_code] {
                    if !font.is_invalid() {
                        let _ = DeleteObject(HGDIOBJ(font.0));
                    }
                }
            }
        }
    }

    pub fn run(controller: &mut dyn LockController, view: &LockView) -> Result<()> {
        unsafe {
            let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
        }
        let hmod = unsafe { GetModuleHandleW(None) }.map_err(|e| err(format!("module handle: {}", e)))?;
        let hinst = HINSTANCE(hmod.0);
        let cls = wstr(CLASS_NAME);
        reg_class(hinst, &cls);

        let scale = unsafe {
            let hdc = GetDC(None);
            let dpi = if !hdc.is_invalid() {
                GetDeviceCaps(Some(hdc), LOGPIXELSX)
            } else {
                96
            };
            if !hdc.is_invalid() {
                ReleaseDC(None, hdc);
            }
            dpi as f32 / 96.0
        };
        let m = |x: i32| ((x as f32) * scale) as i32;

        let ui = SurfaceState::new(view.clone());
        let title = wstr(ui.title());
        let st = Box::new(WinState {
            controller,
            ui,
            palette: match view.theme {
                Theme::Dark => &DARK,
                Theme::Light => &LIGHT,
            },
            font_title: mk_font(m(-40), FW_SEMIBOLD.0 as i32),
            font_body: mk_font(m(-20), FW_NORMAL.0 as i32),
            font_code: mk_font(m(-32), FW_NORMAL.0 as i32),
            scale,
            caret_on: true,
            ticks: 0,
        });
        let sp = Box::into_raw(st);

        let (x, y, w, h) = unsafe {
            (
                GetSystemMetrics(SM_XVIRTUALSCREEN),
                GetSystemMetrics(SM_YVIRTUALSCREEN),
                GetSystemMetrics(SM_CXVIRTUALSCREEN),
                GetSystemMetrics(SM_CYVIRTUALSCREEN),
            )
        };
        let hwnd = unsafe {
            CreateWindowExW(
                WS_EX_TOPMOST | WS_EX_TOOLWINDOW,
                PCWSTR(cls.as_ptr()),
                PCWSTR(title.as_ptr()),
                WS_POPUP,
                x,
                y,
                w,
                h,
                None,
                None,
                Some(hinst),
                Some(sp as *const c_void),
            )
        };
        let hwnd = match hwnd {
            Ok(h) => h,
            Err(e) => {
                unsafe {
                    drop(Box::from_raw(sp));
                }
                return Err(err(format!("lock window create failed: {}", e)));
            }
        };
        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOW);
            let _ = SetForegroundWindow(hwnd);
        }

        let mut msg = MSG::default();
        while unsafe { GetMessageW(&mut msg, None, 0, 0) }.as_bool() {
            unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
            let finished = unsafe { (*sp).ui.is_finished() };
            if finished {
                break;
            }
        }
        unsafe {
            let _ = KillTimer(Some(hwnd), TIMER_ID);
            let _ = SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
            let _ = DestroyWindow(hwnd);
            drop(Box::from_raw(sp));
        }
        Ok(())
    }

    fn lparam_point(lp: LPARAM) -> (i32, i32) {
        let x = (lp.0 & 0xFFFF) as i16 as i32;
        let y = ((lp.0 >> 16) & 0xFFFF) as i16 as i32;
        (x, y)
    }

    fn reassert_topmost(hwnd: HWND) {
        unsafe {
            let _ = SetWindowPos(
                hwnd,
                Some(HWND_TOPMOST),
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_SHOWWINDOW,
            );
            let _ = SetForegroundWindow(hwnd);
        }
    }

    fn handle_effect(hwnd: HWND, effect: Effect) {
        match effect {
            Effect::Nothing => {}
            Effect::Redraw => unsafe {
                let _ = InvalidateRect(Some(hwnd), None, false);
            },
            // メッセージループが状態を見てウィンドウを破棄する
            Effect::Close => unsafe {
                let _ = PostMessageW(Some(hwnd), WM_NULL, WPARAM(0), LPARAM(0));
            },
        }
    }

    unsafe extern "system" fn wndproc(hwnd: HWND, msg: u32, wp: WPARAM, lp: LPARAM) -> LRESULT {
        if msg == WM_CREATE {
            unsafe {
                let cs = &*(lp.0 as *const CREATESTRUCTW);
                let _ = SetWindowLongPtrW(hwnd, GWLP_USERDATA, cs.lpCreateParams as isize);
                let _ = SetTimer(Some(hwnd), TIMER_ID, TIMER_MS, None);
            }
            return LRESULT(0);
        }
        let sp = get_st(hwnd);
        if sp.is_null() {
            return unsafe { DefWindowProcW(hwnd, msg, wp, lp) };
        }
        let s = unsafe { &mut *sp };

        match msg {
            WM_KEYDOWN | WM_SYSKEYDOWN => {
                let is_repeat = (lp.0 >> 30) & 1 == 1;
                let effect = s.ui.on_key(s.controller, wp.0 as u16, is_repeat);
                handle_effect(hwnd, effect);
                LRESULT(0)
            }
            WM_KEYUP | WM_SYSKEYUP | WM_SYSCHAR => LRESULT(0),
            WM_CHAR => {
                if let Some(ch) = char::from_u32(wp.0 as u32) {
                    handle_effect(hwnd, s.ui.on_char(ch));
                }
                LRESULT(0)
            }
            WM_LBUTTONDOWN | WM_RBUTTONDOWN | WM_MBUTTONDOWN => {
                let effect = s.ui.on_pointer(s.controller, PointerKind::Press, None);
                handle_effect(hwnd, effect);
                LRESULT(0)
            }
            WM_MOUSEMOVE => {
                let effect = s
                    .ui
                    .on_pointer(s.controller, PointerKind::Move, Some(lparam_point(lp)));
                handle_effect(hwnd, effect);
                LRESULT(0)
            }
            WM_MOUSEWHEEL => {
                let effect = s.ui.on_pointer(s.controller, PointerKind::Wheel, None);
                handle_effect(hwnd, effect);
                LRESULT(0)
            }
            WM_TIMER => {
                s.ticks = s.ticks.wrapping_add(1);
                if s.ticks % 2 == 0 {
                    reassert_topmost(hwnd);
                }
                if s.ui.view().show_animations && s.ui.masked_passcode().is_some() {
                    s.caret_on = !s.caret_on;
                    unsafe {
                        let _ = InvalidateRect(Some(hwnd), None, false);
                    }
                }
                LRESULT(0)
            }
            WM_CLOSE => {
                if s.ui.may_close(&*s.controller) {
                    unsafe { DefWindowProcW(hwnd, msg, wp, lp) }
                } else {
                    LRESULT(0)
                }
            }
            WM_QUERYENDSESSION => LRESULT(1),
            WM_ENDSESSION => {
                if wp.0 != 0 {
                    s.controller.teardown();
                }
                LRESULT(0)
            }
            WM_ERASEBKGND => LRESULT(1),
            WM_PAINT => unsafe {
                let mut ps = PAINTSTRUCT::default();
                let hdc = BeginPaint(hwnd, &mut ps);
                let mut rc = RECT::default();
                let _ = GetClientRect(hwnd, &mut rc);
                let width = rc.right - rc.left;
                let height = rc.bottom - rc.top;
                if width > 0 && height > 0 {
                    let memdc = CreateCompatibleDC(Some(hdc));
                    let hbmp = if memdc.is_invalid() {
                        HBITMAP::default()
                    } else {
                        CreateCompatibleBitmap(hdc, width, height)
                    };
                    if !memdc.is_invalid() && !hbmp.is_invalid() {
                        let old = SelectObject(memdc, HGDIOBJ(hbmp.0));
                        paint(memdc, &rc, s);
                        let _ = BitBlt(hdc, 0, 0, width, height, Some(memdc), 0, 0, SRCCOPY);
                        let _ = SelectObject(memdc, old);
                        let _ = DeleteObject(HGDIOBJ(hbmp.0));
                    } else {
                        paint(hdc, &rc, s);
                    }
                    if !memdc.is_invalid() {
                        let _ = DeleteDC(memdc);
                    }
                }
                let _ = EndPaint(hwnd, &ps);
                LRESULT(0)
            },
            _ => unsafe { DefWindowProcW(hwnd, msg, wp, lp) },
        }
    }

    fn paint(hdc: HDC, rc: &RECT, s: &WinState<'_>) {
        let m = |x: i32| ((x as f32) * s.scale) as i32;
        let p = s.palette;
        unsafe {
            let bg = CreateSolidBrush(COLORREF(p.bg));
            FillRect(hdc, rc, bg);
            let _ = DeleteObject(HGDIOBJ(bg.0));
            let _ = SetBkMode(hdc, TRANSPARENT);
        }

        let column = m(760).min(rc.right - rc.left - m(48));
        let left = rc.left + (rc.right - rc.left - column) / 2;
        let right = left + column;
        let mut y = rc.top + (rc.bottom - rc.top) / 3;

        let lines = s.ui.banner();
        let mut draw = |text: &str, font: HFONT, color: u32, height: i32, flags: DRAW_TEXT_FORMAT| {
            let mut buf = wstr(text);
            let mut r = RECT {
                left,
                top: y,
                right,
                bottom: y + height,
            };
            unsafe {
                let _ = SelectObject(hdc, HGDIOBJ(font.0));
                let _ = SetTextColor(hdc, COLORREF(color));
                DrawTextW(hdc, &mut buf, &mut r, DT_CENTER | flags);
            }
            y += height;
        };

        if let Some((heading, rest)) = lines.split_first() {
            draw(heading, s.font_title, p.text, m(64), DT_SINGLELINE | DT_VCENTER);
            for line in rest {
                draw(line, s.font_body, p.muted, m(56), DT_WORDBREAK);
            }
        }
        if let Some(masked) = s.ui.masked_passcode() {
            let caret = if s.caret_on || !s.ui.view().show_animations { "_" } else { " " };
            draw(&format!("{}{}", masked, caret), s.font_code, p.text, m(56), DT_SINGLELINE | DT_VCENTER);
        }
        if let Some(status) = s.ui.status_line() {
            draw(status, s.font_body, p.alert, m(40), DT_SINGLELINE | DT_VCENTER);
        }
    }

    fn mk_font(h: i32, w: i32) -> HFONT {
        unsafe {
            CreateFontW(
                h,
                0,
                0,
                0,
                w,
                0,
                0,
                0,
                DEFAULT_CHARSET,
                OUT_OUTLINE_PRECIS,
                CLIP_DEFAULT_PRECIS,
                CLEARTYPE_QUALITY,
                VARIABLE_PITCH.0 as u32,
                PCWSTR(wstr("Segoe UI").as_ptr()),
            )
        }
    }

    fn reg_class(hi: HINSTANCE, nm: &[u16]) {
        let wc = WNDCLASSEXW {
            cbSize: size_of::<WNDCLASSEXW>() as u32,
            style: WNDCLASS_STYLES(0),
            lpfnWndProc: Some(wndproc),
            hInstance: hi,
            lpszClassName: PCWSTR(nm.as_ptr()),
            hCursor: unsafe { LoadCursorW(None, IDC_ARROW).unwrap_or_default() },
            hbrBackground: HBRUSH(std::ptr::null_mut()),
            ..Default::default()
        };
        unsafe {
            let _ = RegisterClassExW(&wc);
        }
    }

    fn wstr(s: impl AsRef<str>) -> Vec<u16> {
        let mut v: Vec<u16> = s.as_ref().encode_utf16().collect();
        v.push(0);
        v
    }

    fn get_st(hwnd: HWND) -> *mut WinState<'static> {
        unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut WinState<'static> }
    }
}

#[cfg(not(target_os = "windows"))]
mod console_fallback {
    use crate::error::{Result, err};
    use crate::input::{Effect, SurfaceState};
    use sl_domain::model::{KeyId, UnlockMode};
    use sl_domain::port::driven::LockView;
    use sl_domain::port::driving::LockController;
    use sl_ui_common::i18n::t;
    use std::io::{self, BufRead, Write};

    fn prompt(text: &str) -> Result<()> {
        print!("{}", text);
        io::stdout().flush().map_err(|e| err(format!("stdout: {}", e)))
    }

    pub fn run(controller: &mut dyn LockController, view: &LockView) -> Result<()> {
        let mut ui = SurfaceState::new(view.clone());
        println!("\n=== {} ===", ui.title());
        for line in ui.banner() {
            println!("{}", line);
        }

        let passcode_mode = view.mode == UnlockMode::Passcode;
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        loop {
            prompt(if passcode_mode {
                t().console_passcode_prompt()
            } else {
                t().console_key_prompt()
            })?;
            // 入力終了は画面を閉じたのと同じ扱い（呼び出し側が保護を外す）
            let Some(line) = lines.next() else {
                return Ok(());
            };
            let line = line.map_err(|e| err(format!("stdin: {}", e)))?;
            let input = line.trim();

            let effect = if passcode_mode && !input.eq_ignore_ascii_case("ESC") {
                for ch in input.chars() {
                    ui.on_char(ch);
                }
                ui.on_key(controller, KeyId::ENTER.vk(), false)
            } else {
                match KeyId::from_name(input) {
                    Some(key) => ui.on_key(controller, key.vk(), false),
                    None => {
                        println!("{}", t().console_unknown_key(input));
                        continue;
                    }
                }
            };
            if effect == Effect::Close {
                println!("{}", t().lock_unlocked());
                return Ok(());
            }
            if let Some(status) = ui.status_line() {
                println!("{}", status);
            }
        }
    }
}
