//! 通知トランスポートポート

use crate::error::TransportError;
use crate::model::OutgoingMail;

/// メール送信
pub trait MailTransport: Send + Sync {
    /// ホストと資格情報が揃っているか
    fn is_configured(&self) -> bool;

    /// 1回だけ送信を試みる
    fn send(&self, mail: &OutgoingMail) -> Result<(), TransportError>;
}
