//! 既定カメラから1フレーム取得（Media Foundation）

use crate::prepare_dest;
use sl_domain::error::CaptureError;
use sl_domain::model::ArtifactRef;
use sl_domain::port::driven::CameraGrabber;
use std::path::Path;

/// 露出が安定するまで捨てるフレーム数
pub const CAMERA_WARMUP_FRAMES: u32 = 5;

#[derive(Debug)]
pub struct WebcamGrabber {
    warmup_frames: u32,
}

impl Default for WebcamGrabber {
    fn default() -> Self {
        Self {
            warmup_frames: CAMERA_WARMUP_FRAMES,
        }
    }
}

impl WebcamGrabber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_warmup(warmup_frames: u32) -> Self {
        Self { warmup_frames }
    }
}

impl CameraGrabber for WebcamGrabber {
    fn capture_frame(&self, dest: &Path) -> Result<ArtifactRef, CaptureError> {
        prepare_dest(dest)?;
        #[cfg(windows)]
        {
            let frame = mf::grab_frame(self.warmup_frames)?;
            crate::bmp::write_bmp(dest, frame.width, frame.height, &frame.pixels, frame.top_down)
                .map_err(|e| CaptureError::Failed(format!("write {}: {}", dest.display(), e)))?;
            Ok(ArtifactRef::captured(dest.to_path_buf()))
        }
        #[cfg(not(windows))]
        {
            let _ = self.warmup_frames;
            Err(CaptureError::Unsupported)
        }
    }
}

/// 行ストライドを取り除いて連続した BGRA にする
#[cfg_attr(not(windows), allow(dead_code))]
fn pack_rows(data: &[u8], width: u32, height: u32, stride: usize) -> Option<Vec<u8>> {
    let row = width as usize * 4;
    if stride < row || data.len() < stride * (height as usize).saturating_sub(1) + row {
        return None;
    }
    let mut packed = Vec::with_capacity(row * height as usize);
    for y in 0..height as usize {
        let start = y * stride;
        packed.extend_from_slice(&data[start..start + row]);
    }
    Some(packed)
}

#[cfg(windows)]
mod mf {
    use super::pack_rows;
    use sl_domain::error::CaptureError;
    use windows::Win32::Media::MediaFoundation::{
        IMFActivate, IMFAttributes, IMFMediaSource, IMFSample, IMFSourceReader,
        MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE, MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_VIDCAP_GUID,
        MF_MT_DEFAULT_STRIDE, MF_MT_FRAME_SIZE, MF_MT_MAJOR_TYPE, MF_MT_SUBTYPE,
        MF_SOURCE_READER_ENABLE_VIDEO_PROCESSING, MF_SOURCE_READER_FIRST_VIDEO_STREAM,
        MF_VERSION, MFCreateAttributes, MFCreateMediaType, MFCreateSourceReaderFromMediaSource,
        MFEnumDeviceSources, MFMediaType_Video, MFSTARTUP_FULL, MFShutdown, MFStartup,
        MFVideoFormat_RGB32,
    };
    use windows::Win32::System::Com::{
        COINIT_MULTITHREADED, CoInitializeEx, CoTaskMemFree, CoUninitialize,
    };

    /// 読み取り試行の上限（空サンプルを含む）
    const MAX_READS: u32 = 60;

    pub(super) struct Frame {
        pub width: u32,
        pub height: u32,
        pub pixels: Vec<u8>,
        pub top_down: bool,
    }

    fn failed(what: &str, e: windows::core::Error) -> CaptureError {
        CaptureError::Failed(format!("{}: {}", what, e))
    }

    pub(super) fn grab_frame(warmup: u32) -> Result<Frame, CaptureError> {
        unsafe {
            let com = CoInitializeEx(None, COINIT_MULTITHREADED);
            MFStartup(MF_VERSION, MFSTARTUP_FULL).map_err(|e| failed("MFStartup", e))?;
            let result = open_first_camera().and_then(|source| {
                let frame = read_frame(&source, warmup);
                let _ = source.Shutdown();
                frame
            });
            let _ = MFShutdown();
            if com.is_ok() {
                CoUninitialize();
            }
            result
        }
    }

    unsafe fn open_first_camera() -> Result<IMFMediaSource, CaptureError> {
        unsafe {
            let mut attributes: Option<IMFAttributes> = None;
            MFCreateAttributes(&mut attributes, 1).map_err(|e| failed("MFCreateAttributes", e))?;
            let attributes = attributes
                .ok_or_else(|| CaptureError::Failed("MFCreateAttributes returned nothing".into()))?;
            attributes
                .SetGUID(
                    &MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE,
                    &MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_VIDCAP_GUID,
                )
                .map_err(|e| failed("SetGUID", e))?;

            let mut devices: *mut Option<IMFActivate> = std::ptr::null_mut();
            let mut count: u32 = 0;
            MFEnumDeviceSources(&attributes, &mut devices, &mut count)
                .map_err(|e| failed("MFEnumDeviceSources", e))?;

            let mut first: Option<IMFActivate> = None;
            if !devices.is_null() {
                for i in 0..count as usize {
                    let activate = std::ptr::read(devices.add(i));
                    if first.is_none() {
                        first = activate;
                    }
                }
                CoTaskMemFree(Some(devices as *const _));
            }

            let activate =
                first.ok_or_else(|| CaptureError::DeviceUnavailable("no camera found".into()))?;
            activate
                .ActivateObject::<IMFMediaSource>()
                .map_err(|e| CaptureError::DeviceUnavailable(format!("camera busy: {}", e)))
        }
    }

    unsafe fn read_frame(source: &IMFMediaSource, warmup: u32) -> Result<Frame, CaptureError> {
        unsafe {
            let mut reader_attrs: Option<IMFAttributes> = None;
            MFCreateAttributes(&mut reader_attrs, 1).map_err(|e| failed("MFCreateAttributes", e))?;
            let reader_attrs = reader_attrs
                .ok_or_else(|| CaptureError::Failed("MFCreateAttributes returned nothing".into()))?;
            reader_attrs
                .SetUINT32(&MF_SOURCE_READER_ENABLE_VIDEO_PROCESSING, 1)
                .map_err(|e| failed("SetUINT32", e))?;
            let reader: IMFSourceReader =
                MFCreateSourceReaderFromMediaSource(source, &reader_attrs)
                    .map_err(|e| failed("MFCreateSourceReaderFromMediaSource", e))?;

            let stream = MF_SOURCE_READER_FIRST_VIDEO_STREAM.0 as u32;
            let wanted = MFCreateMediaType().map_err(|e| failed("MFCreateMediaType", e))?;
            wanted
                .SetGUID(&MF_MT_MAJOR_TYPE, &MFMediaType_Video)
                .map_err(|e| failed("SetGUID", e))?;
            wanted
                .SetGUID(&MF_MT_SUBTYPE, &MFVideoFormat_RGB32)
                .map_err(|e| failed("SetGUID", e))?;
            reader
                .SetCurrentMediaType(stream, None, &wanted)
                .map_err(|e| failed("SetCurrentMediaType", e))?;

            let current = reader
                .GetCurrentMediaType(stream)
                .map_err(|e| failed("GetCurrentMediaType", e))?;
            let size = current
                .GetUINT64(&MF_MT_FRAME_SIZE)
                .map_err(|e| failed("MF_MT_FRAME_SIZE", e))?;
            let width = (size >> 32) as u32;
            let height = (size & 0xFFFF_FFFF) as u32;
            if width == 0 || height == 0 {
                return Err(CaptureError::Failed("camera reported empty frame size".into()));
            }
            // RGB の既定ストライドは負（下から上）
            let stride = current
                .GetUINT32(&MF_MT_DEFAULT_STRIDE)
                .map(|s| s as i32)
                .unwrap_or(-((width * 4) as i32));

            let mut seen = 0u32;
            for _ in 0..MAX_READS {
                let mut flags: u32 = 0;
                let mut sample: Option<IMFSample> = None;
                reader
                    .ReadSample(stream, 0, None, Some(&mut flags), None, Some(&mut sample))
                    .map_err(|e| failed("ReadSample", e))?;
                let Some(sample) = sample else {
                    continue;
                };
                seen += 1;
                if seen <= warmup {
                    continue;
                }
                let buffer = sample
                    .ConvertToContiguousBuffer()
                    .map_err(|e| failed("ConvertToContiguousBuffer", e))?;
                let mut data: *mut u8 = std::ptr::null_mut();
                let mut len: u32 = 0;
                buffer
                    .Lock(&mut data, None, Some(&mut len))
                    .map_err(|e| failed("Lock", e))?;
                let bytes = std::slice::from_raw_parts(data, len as usize);
                let packed = pack_rows(bytes, width, height, stride.unsigned_abs() as usize);
                let _ = buffer.Unlock();
                let pixels = packed.ok_or_else(|| {
                    CaptureError::Failed(format!("frame buffer too small ({} bytes)", len))
                })?;
                return Ok(Frame {
                    width,
                    height,
                    pixels,
                    top_down: stride > 0,
                });
            }
            Err(CaptureError::Failed("camera produced no frame".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_rows_drops_padding() {
        // 1x2 画像、行ストライド 8
        let data = [1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8];
        assert_eq!(
            pack_rows(&data, 1, 2, 8),
            Some(vec![1, 2, 3, 4, 5, 6, 7, 8])
        );
    }

    #[test]
    fn pack_rows_rejects_short_buffer() {
        assert_eq!(pack_rows(&[0u8; 7], 1, 2, 4), None);
        assert_eq!(pack_rows(&[0u8; 16], 2, 1, 4), None);
    }

    #[cfg(not(windows))]
    #[test]
    fn unsupported_off_windows() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("snapshot_x.bmp");
        assert_eq!(
            WebcamGrabber::with_warmup(0).capture_frame(&dest).unwrap_err(),
            CaptureError::Unsupported
        );
    }
}
