//! 証拠取得アダプター
//!
//! 画面は GDI、カメラは Media Foundation、音声は cpal で取得する。
//! Windows 以外では画面・カメラ・音声は `CaptureError::Unsupported` を返す。

mod audio;
mod bmp;
mod camera;
mod screen;
mod system_info;

pub use audio::{MicrophoneRecorder, write_wav};
pub use bmp::write_bmp;
pub use camera::{CAMERA_WARMUP_FRAMES, WebcamGrabber};
pub use screen::DesktopGrabber;
pub use system_info::SysinfoProvider;

use sl_domain::error::CaptureError;
use std::path::Path;

/// 保存先ディレクトリを用意する
pub(crate) fn prepare_dest(dest: &Path) -> Result<(), CaptureError> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CaptureError::Failed(format!("create {}: {}", parent.display(), e))
            })?;
        }
    }
    Ok(())
}
