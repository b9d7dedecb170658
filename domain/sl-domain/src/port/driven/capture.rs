//! 証拠取得ポート
//!
//! 各取得は1回きり（リトライなし）。失敗はエラーで返し、パイプラインが「欠落」として扱う。

use crate::error::CaptureError;
use crate::model::ArtifactRef;
use std::path::Path;

/// 画面キャプチャ
pub trait ScreenGrabber: Send + Sync {
    fn capture_screen(&self, dest: &Path) -> Result<ArtifactRef, CaptureError>;
}

/// カメラの1フレーム取得
pub trait CameraGrabber: Send + Sync {
    fn capture_frame(&self, dest: &Path) -> Result<ArtifactRef, CaptureError>;
}

/// マイク録音
pub trait AudioRecorder: Send + Sync {
    fn record(&self, dest: &Path, seconds: u32) -> Result<ArtifactRef, CaptureError>;
}

/// システム情報
pub trait SystemInfoProvider: Send + Sync {
    /// 説明文字列（内部失敗時もホスト名を含む代替文字列を返す）
    fn describe(&self) -> String;

    /// ホスト名
    fn host_name(&self) -> String;
}
