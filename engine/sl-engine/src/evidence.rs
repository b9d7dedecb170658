//! 証拠パイプライン
//!
//! 発火シグナル1件につき 画面 → カメラ → 音声 → システム情報 の順で取得する。
//! 各ステップは1回きりで、失敗は「欠落」として記録し残りを続行する。

use crate::activity::{log_event, panic_text};
use sl_domain::error::CaptureError;
use sl_domain::model::{ArtifactKind, ArtifactRef, EvidenceBundle, EvidenceSettings, FireSignal};
use sl_domain::port::driven::{
    AudioRecorder, CameraGrabber, Clock, LogLevel, LogWriter, ScreenGrabber, SystemInfoProvider,
};
use sl_domain::time::file_stamp;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;

const COMPONENT: &str = "evidence";

/// パイプラインが使う取得ポート
#[derive(Clone)]
pub struct EvidencePorts {
    pub screen: Arc<dyn ScreenGrabber>,
    pub camera: Arc<dyn CameraGrabber>,
    pub audio: Arc<dyn AudioRecorder>,
    pub system_info: Arc<dyn SystemInfoProvider>,
    pub log: Arc<dyn LogWriter>,
    pub clock: Arc<dyn Clock>,
}

pub struct EvidencePipeline {
    ports: EvidencePorts,
    settings: EvidenceSettings,
    capture_dir: PathBuf,
}

impl EvidencePipeline {
    pub fn new(ports: EvidencePorts, settings: EvidenceSettings, capture_dir: PathBuf) -> Self {
        Self {
            ports,
            settings,
            capture_dir,
        }
    }

    /// 証拠バンドルを組み立てる（全ステップ完了まで戻らない）
    pub fn gather(&self, signal: &FireSignal) -> EvidenceBundle {
        let host = catch_unwind(AssertUnwindSafe(|| self.ports.system_info.host_name()))
            .unwrap_or_else(|_| "unknown".to_string());
        let mut bundle = EvidenceBundle::new(signal.reason.clone(), host, signal.when);
        let stamp = file_stamp(signal.when);

        if self.settings.screenshot_enabled {
            bundle.screenshot = self.step(ArtifactKind::Screenshot, &stamp, |dest| {
                self.ports.screen.capture_screen(dest)
            });
        }
        if self.settings.camera_enabled {
            bundle.camera_frame = self.step(ArtifactKind::CameraFrame, &stamp, |dest| {
                self.ports.camera.capture_frame(dest)
            });
        }
        if self.settings.audio_enabled {
            let seconds = self.settings.audio_seconds;
            bundle.audio_clip = self.step(ArtifactKind::AudioClip, &stamp, |dest| {
                self.ports.audio.record(dest, seconds)
            });
        }
        if self.settings.include_system_info {
            bundle.system_info = match catch_unwind(AssertUnwindSafe(|| self.ports.system_info.describe())) {
                Ok(text) => Some(text),
                Err(payload) => {
                    self.log(
                        LogLevel::Error,
                        format!("system info panicked: {}", panic_text(payload.as_ref())),
                    );
                    None
                }
            };
        }
        bundle
    }

    fn step(
        &self,
        kind: ArtifactKind,
        stamp: &str,
        capture: impl FnOnce(&std::path::Path) -> Result<ArtifactRef, CaptureError>,
    ) -> Option<ArtifactRef> {
        let dest = self.capture_dir.join(kind.file_name(stamp));
        // アダプタ内のパニックもこのステップの欠落として扱う
        let outcome = match catch_unwind(AssertUnwindSafe(|| capture(&dest))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                self.log(
                    LogLevel::Error,
                    format!("{} panicked: {}", kind.label(), panic_text(payload.as_ref())),
                );
                return None;
            }
        };
        match outcome {
            Ok(artifact) if artifact.succeeded => {
                self.log(
                    LogLevel::Info,
                    format!("{} saved: {}", kind.label(), artifact.path.display()),
                );
                Some(artifact)
            }
            Ok(artifact) => {
                self.log(
                    LogLevel::Warn,
                    format!("{} incomplete: {}", kind.label(), artifact.path.display()),
                );
                None
            }
            Err(e) => {
                self.log(LogLevel::Warn, format!("{} unavailable: {}", kind.label(), e));
                None
            }
        }
    }

    fn log(&self, level: LogLevel, message: String) {
        log_event(self.ports.log.as_ref(), self.ports.clock.as_ref(), level, COMPONENT, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryLog, MockClock, MockGrabber, MockSystemInfo};
    use std::sync::atomic::Ordering;

    fn ports(grabber: Arc<MockGrabber>, log: Arc<MemoryLog>) -> EvidencePorts {
        EvidencePorts {
            screen: grabber.clone(),
            camera: grabber.clone(),
            audio: grabber,
            system_info: Arc::new(MockSystemInfo {
                text: "OS: test".into(),
            }),
            log,
            clock: Arc::new(MockClock::at(0)),
        }
    }

    fn all_enabled() -> EvidenceSettings {
        EvidenceSettings {
            screenshot_enabled: true,
            camera_enabled: true,
            audio_enabled: true,
            audio_seconds: 7,
            include_system_info: true,
        }
    }

    fn signal() -> FireSignal {
        FireSignal {
            reason: "wrong passcode".into(),
            when: 1_709_210_096_789,
        }
    }

    #[test]
    fn all_failures_still_produce_complete_bundle() {
        let grabber = Arc::new(MockGrabber::failing());
        let log = Arc::new(MemoryLog::default());
        let pipeline = EvidencePipeline::new(
            ports(grabber.clone(), log.clone()),
            EvidenceSettings {
                include_system_info: false,
                ..all_enabled()
            },
            PathBuf::from("captures"),
        );
        let bundle = pipeline.gather(&signal());
        assert_eq!(grabber.calls.load(Ordering::SeqCst), 3);
        assert!(bundle.screenshot.is_none());
        assert!(bundle.camera_frame.is_none());
        assert!(bundle.audio_clip.is_none());
        assert!(bundle.system_info.is_none());
        assert_eq!(bundle.reason, "wrong passcode");
        assert_eq!(bundle.host, "desk-01");
        assert_eq!(bundle.when, 1_709_210_096_789);
        assert_eq!(log.count(LogLevel::Warn), 3);
    }

    #[test]
    fn artifacts_are_named_by_kind_and_stamp() {
        let grabber = Arc::new(MockGrabber::default());
        let pipeline = EvidencePipeline::new(
            ports(grabber.clone(), Arc::new(MemoryLog::default())),
            all_enabled(),
            PathBuf::from("captures"),
        );
        let bundle = pipeline.gather(&signal());
        let name = |a: &Option<ArtifactRef>| {
            a.as_ref()
                .unwrap()
                .path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        };
        assert_eq!(name(&bundle.screenshot), "screenshot_20240229_123456_789.bmp");
        assert_eq!(name(&bundle.camera_frame), "snapshot_20240229_123456_789.bmp");
        assert_eq!(name(&bundle.audio_clip), "audio_20240229_123456_789.wav");
        assert_eq!(bundle.system_info.as_deref(), Some("OS: test"));
        assert_eq!(grabber.last_seconds.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn panicking_capture_is_recorded_as_missing() {
        let grabber = Arc::new(MockGrabber::panicking());
        let log = Arc::new(MemoryLog::default());
        let pipeline = EvidencePipeline::new(
            ports(grabber.clone(), log.clone()),
            all_enabled(),
            PathBuf::from("captures"),
        );
        let bundle = pipeline.gather(&signal());
        assert_eq!(grabber.calls.load(Ordering::SeqCst), 3);
        assert!(bundle.screenshot.is_none());
        assert!(bundle.camera_frame.is_none());
        assert!(bundle.audio_clip.is_none());
        assert_eq!(bundle.system_info.as_deref(), Some("OS: test"));
        assert_eq!(log.count(LogLevel::Error), 3);
        assert!(log.contains(LogLevel::Error, "driver crashed"));
    }

    #[test]
    fn disabled_steps_are_not_attempted() {
        let grabber = Arc::new(MockGrabber::default());
        let pipeline = EvidencePipeline::new(
            ports(grabber.clone(), Arc::new(MemoryLog::default())),
            EvidenceSettings {
                screenshot_enabled: false,
                camera_enabled: false,
                audio_enabled: false,
                audio_seconds: 5,
                include_system_info: false,
            },
            PathBuf::from("captures"),
        );
        let bundle = pipeline.gather(&signal());
        assert_eq!(grabber.calls.load(Ordering::SeqCst), 0);
        assert!(bundle.attachments().is_empty());
    }
}
