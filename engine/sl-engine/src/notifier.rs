//! 通知
//!
//! 無効・未設定は設定の欠落であり失敗ではない。送信失敗はログに残して握りつぶす。

use crate::activity::log_event;
use sl_domain::model::{EvidenceBundle, NotifySettings};
use sl_domain::port::driven::{Clock, LogLevel, LogWriter, MailTransport};
use sl_domain::service::compose_mail;
use std::sync::Arc;

const COMPONENT: &str = "notifier";

/// 通知の結果（呼び出し側に失敗を伝播しない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Disabled,
    NotConfigured,
    Sent { attachments: usize },
    Failed(String),
}

pub struct Notifier {
    transport: Arc<dyn MailTransport>,
    settings: NotifySettings,
    log: Arc<dyn LogWriter>,
    clock: Arc<dyn Clock>,
}

impl Notifier {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        settings: NotifySettings,
        log: Arc<dyn LogWriter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            settings,
            log,
            clock,
        }
    }

    pub fn notify(&self, bundle: &EvidenceBundle) -> NotifyOutcome {
        if !self.settings.email_enabled {
            self.log(LogLevel::Info, "email disabled; notification skipped".into());
            return NotifyOutcome::Disabled;
        }
        if !self.transport.is_configured() {
            self.log(
                LogLevel::Warn,
                "mail transport not configured; notification skipped".into(),
            );
            return NotifyOutcome::NotConfigured;
        }
        let mail = compose_mail(bundle, &self.settings, &self.log.location());
        let attachments = mail.attachments.len();
        match self.transport.send(&mail) {
            Ok(()) => {
                self.log(
                    LogLevel::Info,
                    format!("notification sent ({} attachments)", attachments),
                );
                NotifyOutcome::Sent { attachments }
            }
            Err(e) => {
                self.log(LogLevel::Error, format!("notification failed: {}", e));
                NotifyOutcome::Failed(e.to_string())
            }
        }
    }

    fn log(&self, level: LogLevel, message: String) {
        log_event(self.log.as_ref(), self.clock.as_ref(), level, COMPONENT, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryLog, MockClock, MockMail};
    use sl_domain::model::ArtifactRef;
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;

    fn notifier(mail: Arc<MockMail>, enabled: bool, log: Arc<MemoryLog>) -> Notifier {
        Notifier::new(
            mail,
            NotifySettings {
                email_enabled: enabled,
                attach_media: true,
            },
            log,
            Arc::new(MockClock::at(0)),
        )
    }

    fn bundle() -> EvidenceBundle {
        let mut b = EvidenceBundle::new("mouse click", "desk-01", 0);
        b.screenshot = Some(ArtifactRef::captured(PathBuf::from("s.bmp")));
        b
    }

    #[test]
    fn disabled_is_a_no_op() {
        let mail = Arc::new(MockMail::configured());
        let outcome = notifier(mail.clone(), false, Arc::new(MemoryLog::default())).notify(&bundle());
        assert_eq!(outcome, NotifyOutcome::Disabled);
        assert_eq!(mail.sent_count(), 0);
    }

    #[test]
    fn missing_transport_config_warns_once() {
        let mail = Arc::new(MockMail::default());
        let log = Arc::new(MemoryLog::default());
        let outcome = notifier(mail.clone(), true, log.clone()).notify(&bundle());
        assert_eq!(outcome, NotifyOutcome::NotConfigured);
        assert_eq!(log.count(LogLevel::Warn), 1);
        assert_eq!(mail.sent_count(), 0);
    }

    #[test]
    fn sends_with_attachments() {
        let mail = Arc::new(MockMail::configured());
        let outcome = notifier(mail.clone(), true, Arc::new(MemoryLog::default())).notify(&bundle());
        assert_eq!(outcome, NotifyOutcome::Sent { attachments: 1 });
        let sent = mail.sent.lock().unwrap();
        assert!(sent[0].subject.starts_with("[SecureLock] Wrong input - "));
        assert!(sent[0].body.contains("Log: memory"));
    }

    #[test]
    fn delivery_failure_is_logged_and_swallowed() {
        let mail = Arc::new(MockMail::configured());
        mail.fail.store(true, Ordering::SeqCst);
        let log = Arc::new(MemoryLog::default());
        let outcome = notifier(mail, true, log.clone()).notify(&bundle());
        assert!(matches!(outcome, NotifyOutcome::Failed(_)));
        assert!(log.contains(LogLevel::Error, "smtp 421"));
    }
}
