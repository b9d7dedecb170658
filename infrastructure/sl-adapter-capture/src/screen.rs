//! 仮想デスクトップ全体のスクリーンショット

use crate::prepare_dest;
use sl_domain::error::CaptureError;
use sl_domain::model::ArtifactRef;
use sl_domain::port::driven::ScreenGrabber;
use std::path::Path;

#[derive(Debug, Default)]
pub struct DesktopGrabber;

impl DesktopGrabber {
    pub fn new() -> Self {
        Self
    }
}

impl ScreenGrabber for DesktopGrabber {
    fn capture_screen(&self, dest: &Path) -> Result<ArtifactRef, CaptureError> {
        prepare_dest(dest)?;
        #[cfg(windows)]
        {
            let (width, height, pixels) = gdi::grab_virtual_screen()?;
            crate::bmp::write_bmp(dest, width, height, &pixels, true)
                .map_err(|e| CaptureError::Failed(format!("write {}: {}", dest.display(), e)))?;
            Ok(ArtifactRef::captured(dest.to_path_buf()))
        }
        #[cfg(not(windows))]
        {
            Err(CaptureError::Unsupported)
        }
    }
}

#[cfg(windows)]
mod gdi {
    use sl_domain::error::CaptureError;
    use windows::Win32::Graphics::Gdi::{
        BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BitBlt, CAPTUREBLT, CreateCompatibleBitmap,
        CreateCompatibleDC, DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, GetDIBits, HGDIOBJ,
        ReleaseDC, SRCCOPY, SelectObject,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
        SM_YVIRTUALSCREEN,
    };

    /// BGRA（上から下）で返す
    pub(super) fn grab_virtual_screen() -> Result<(u32, u32, Vec<u8>), CaptureError> {
        let (x, y, width, height) = unsafe {
            (
                GetSystemMetrics(SM_XVIRTUALSCREEN),
                GetSystemMetrics(SM_YVIRTUALSCREEN),
                GetSystemMetrics(SM_CXVIRTUALSCREEN),
                GetSystemMetrics(SM_CYVIRTUALSCREEN),
            )
        };
        if width <= 0 || height <= 0 {
            return Err(CaptureError::DeviceUnavailable("no visible desktop".into()));
        }

        unsafe {
            let screen_dc = GetDC(None);
            if screen_dc.is_invalid() {
                return Err(CaptureError::DeviceUnavailable("GetDC failed".into()));
            }
            let mem_dc = CreateCompatibleDC(Some(screen_dc));
            if mem_dc.is_invalid() {
                let _ = ReleaseDC(None, screen_dc);
                return Err(CaptureError::Failed("CreateCompatibleDC failed".into()));
            }
            let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
            if bitmap.is_invalid() {
                let _ = DeleteDC(mem_dc);
                let _ = ReleaseDC(None, screen_dc);
                return Err(CaptureError::Failed("CreateCompatibleBitmap failed".into()));
            }

            let old = SelectObject(mem_dc, HGDIOBJ(bitmap.0));
            let blit = BitBlt(
                mem_dc,
                0,
                0,
                width,
                height,
                Some(screen_dc),
                x,
                y,
                SRCCOPY | CAPTUREBLT,
            );
            let _ = SelectObject(mem_dc, old);

            let mut info = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    biHeight: -height,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };
            let mut pixels = vec![0u8; width as usize * height as usize * 4];
            let lines = if blit.is_ok() {
                GetDIBits(
                    mem_dc,
                    bitmap,
                    0,
                    height as u32,
                    Some(pixels.as_mut_ptr().cast()),
                    &mut info,
                    DIB_RGB_COLORS,
                )
            } else {
                0
            };

            let _ = DeleteObject(HGDIOBJ(bitmap.0));
            let _ = DeleteDC(mem_dc);
            let _ = ReleaseDC(None, screen_dc);

            if let Err(e) = blit {
                return Err(CaptureError::Failed(format!("BitBlt: {}", e)));
            }
            if lines != height {
                return Err(CaptureError::Failed(format!(
                    "GetDIBits copied {} of {} lines",
                    lines, height
                )));
            }
            Ok((width as u32, height as u32, pixels))
        }
    }
}
