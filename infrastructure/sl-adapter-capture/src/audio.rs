//! 既定マイクからの短時間録音（cpal 入力 → hound で 16bit モノラル WAV）

use crate::prepare_dest;
use sl_domain::error::CaptureError;
use sl_domain::model::{ArtifactRef, MAX_AUDIO_SECONDS, MIN_AUDIO_SECONDS};
use sl_domain::port::driven::AudioRecorder;
use std::path::Path;

#[derive(Debug, Default)]
pub struct MicrophoneRecorder;

impl MicrophoneRecorder {
    pub fn new() -> Self {
        Self
    }
}

impl AudioRecorder for MicrophoneRecorder {
    fn record(&self, dest: &Path, seconds: u32) -> Result<ArtifactRef, CaptureError> {
        let seconds = seconds.clamp(MIN_AUDIO_SECONDS, MAX_AUDIO_SECONDS);
        prepare_dest(dest)?;
        #[cfg(windows)]
        {
            let (sample_rate, samples) = input::record_mono(seconds)?;
            if samples.is_empty() {
                return Err(CaptureError::Failed("microphone delivered no samples".into()));
            }
            write_wav(dest, sample_rate, &samples)?;
            Ok(ArtifactRef::captured(dest.to_path_buf()))
        }
        #[cfg(not(windows))]
        {
            let _ = seconds;
            Err(CaptureError::Unsupported)
        }
    }
}

/// 16bit モノラル PCM を WAV で保存
pub fn write_wav(path: &Path, sample_rate: u32, samples: &[i16]) -> Result<(), CaptureError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let fail = |e: hound::Error| CaptureError::Failed(format!("write {}: {}", path.display(), e));
    let mut writer = hound::WavWriter::create(path, spec).map_err(fail)?;
    for &sample in samples {
        writer.write_sample(sample).map_err(fail)?;
    }
    writer.finalize().map_err(fail)
}

/// インターリーブされた多チャンネル f32 をモノラル i16 に落とす
#[cfg_attr(not(windows), allow(dead_code))]
fn downmix_to_i16(data: &[f32], channels: usize) -> Vec<i16> {
    if channels == 0 {
        return Vec::new();
    }
    data.chunks_exact(channels)
        .map(|frame| {
            let mean = frame.iter().sum::<f32>() / channels as f32;
            (mean.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
        })
        .collect()
}

#[cfg(windows)]
mod input {
    use super::downmix_to_i16;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{SampleFormat, StreamConfig};
    use sl_domain::error::CaptureError;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Shared = Arc<Mutex<Vec<i16>>>;

    fn push(shared: &Shared, data: &[f32], channels: usize) {
        let mono = downmix_to_i16(data, channels);
        shared
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend_from_slice(&mono);
    }

    pub(super) fn record_mono(seconds: u32) -> Result<(u32, Vec<i16>), CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceUnavailable("no default input device".into()))?;
        let config = device
            .default_input_config()
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;
        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        let stream_config: StreamConfig = config.clone().into();

        let shared: Shared = Arc::new(Mutex::new(Vec::with_capacity(
            sample_rate as usize * seconds as usize,
        )));
        let sink = Arc::clone(&shared);
        let on_error = |_err: cpal::StreamError| {};

        let stream = match config.sample_format() {
            SampleFormat::F32 => device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| push(&sink, data, channels),
                on_error,
                None,
            ),
            SampleFormat::I16 => device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let floats: Vec<f32> = data.iter().map(|&s| s as f32 / 32768.0).collect();
                    push(&sink, &floats, channels)
                },
                on_error,
                None,
            ),
            SampleFormat::U16 => device.build_input_stream(
                &stream_config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    let floats: Vec<f32> =
                        data.iter().map(|&s| (s as f32 - 32768.0) / 32768.0).collect();
                    push(&sink, &floats, channels)
                },
                on_error,
                None,
            ),
            other => {
                return Err(CaptureError::DeviceUnavailable(format!(
                    "unsupported sample format {:?}",
                    other
                )));
            }
        }
        .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        stream
            .play()
            .map_err(|e| CaptureError::Failed(format!("start recording: {}", e)))?;
        std::thread::sleep(Duration::from_secs(seconds as u64));
        drop(stream);

        let samples = std::mem::take(&mut *shared.lock().unwrap_or_else(|p| p.into_inner()));
        Ok((sample_rate, samples))
    }
}
