//! 通知メッセージの組み立て

use crate::model::{ArtifactKind, EvidenceBundle, NotifySettings, OutgoingMail};
use crate::time::rfc3339_millis;

/// 証拠バンドルから通知メッセージを作る
///
/// 添付は `attach_media` が有効な場合のみ、取得に成功したものだけ。
pub fn compose_mail(bundle: &EvidenceBundle, settings: &NotifySettings, log_location: &str) -> OutgoingMail {
    let when = rfc3339_millis(bundle.when);
    let mut body = format!(
        "Host: {}\nTime: {}\nReason: {}\n",
        bundle.host, when, bundle.reason
    );
    body.push_str(&format!(
        "Screenshot: {} | Camera: {} | Audio: {}\n",
        bundle.has(ArtifactKind::Screenshot),
        bundle.has(ArtifactKind::CameraFrame),
        bundle.has(ArtifactKind::AudioClip)
    ));
    if let Some(info) = &bundle.system_info {
        body.push_str("\n--- System information ---\n");
        body.push_str(info);
        body.push('\n');
    }
    body.push_str(&format!("\nLog: {}\n", log_location));

    OutgoingMail {
        subject: format!("[SecureLock] Wrong input - {}", when),
        body,
        attachments: if settings.attach_media {
            bundle.attachments()
        } else {
            Vec::new()
        },
    }
}
