//! 証拠バンドルと通知メッセージ

use std::path::PathBuf;

/// 証拠の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Screenshot,
    CameraFrame,
    AudioClip,
}

impl ArtifactKind {
    /// ファイル名の接頭辞
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::Screenshot => "screenshot",
            Self::CameraFrame => "snapshot",
            Self::AudioClip => "audio",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Screenshot | Self::CameraFrame => "bmp",
            Self::AudioClip => "wav",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Screenshot => "screenshot",
            Self::CameraFrame => "camera",
            Self::AudioClip => "audio",
        }
    }

    /// 証拠ファイル名（`<prefix>_<stamp>.<ext>`）
    pub fn file_name(&self, stamp: &str) -> String {
        format!("{}_{}.{}", self.file_prefix(), stamp, self.extension())
    }
}

/// 取得済みアーティファクトへの参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub path: PathBuf,
    pub succeeded: bool,
}

impl ArtifactRef {
    pub fn captured(path: PathBuf) -> Self {
        Self {
            path,
            succeeded: true,
        }
    }
}

/// 1回の発火に対して集めた証拠
///
/// Notifier に渡った後は変更しない。アーティファクトの欠落はエラーではない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceBundle {
    pub screenshot: Option<ArtifactRef>,
    pub camera_frame: Option<ArtifactRef>,
    pub audio_clip: Option<ArtifactRef>,
    pub system_info: Option<String>,
    pub reason: String,
    pub host: String,
    /// エポックミリ秒
    pub when: u64,
}

impl EvidenceBundle {
    pub fn new(reason: impl Into<String>, host: impl Into<String>, when: u64) -> Self {
        Self {
            screenshot: None,
            camera_frame: None,
            audio_clip: None,
            system_info: None,
            reason: reason.into(),
            host: host.into(),
            when,
        }
    }

    /// 成功したアーティファクトのパス
    pub fn attachments(&self) -> Vec<PathBuf> {
        [&self.screenshot, &self.camera_frame, &self.audio_clip]
            .into_iter()
            .flatten()
            .filter(|a| a.succeeded)
            .map(|a| a.path.clone())
            .collect()
    }

    pub fn has(&self, kind: ArtifactKind) -> bool {
        let slot = match kind {
            ArtifactKind::Screenshot => &self.screenshot,
            ArtifactKind::CameraFrame => &self.camera_frame,
            ArtifactKind::AudioClip => &self.audio_clip,
        };
        slot.as_ref().is_some_and(|a| a.succeeded)
    }
}

/// トランスポートへ渡すメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}
