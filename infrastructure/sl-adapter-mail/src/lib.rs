//! SMTP 通知アダプター
//!
//! 接続情報は環境変数、次に mail.env（KEY=VALUE 形式）から読む。
//! プロセス環境変数が優先。

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport};
use sl_domain::error::TransportError;
use sl_domain::model::OutgoingMail;
use sl_domain::port::driven::MailTransport;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_SMTP_HOST: &str = "SMTP_HOST";
pub const ENV_SMTP_PORT: &str = "SMTP_PORT";
pub const ENV_SMTP_USER: &str = "SMTP_USER";
pub const ENV_SMTP_PASSWORD: &str = "SMTP_PASSWORD";
pub const ENV_MAIL_TO: &str = "MAIL_TO";
pub const ENV_MAIL_FROM_NAME: &str = "MAIL_FROM_NAME";

pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_FROM_NAME: &str = "SecureLock";
/// 暗黙 TLS（SMTPS）のポート
const IMPLICIT_TLS_PORT: u16 = 465;
const SEND_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub to: String,
    pub from_name: String,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("to", &self.to)
            .field("from_name", &self.from_name)
            .finish_non_exhaustive()
    }
}

impl SmtpSettings {
    /// キー検索関数から組み立てる（空文字列は未設定扱い）
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TransportError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get(ENV_SMTP_HOST);
        let user = get(ENV_SMTP_USER);
        let password = get(ENV_SMTP_PASSWORD);
        let to = get(ENV_MAIL_TO).or_else(|| user.clone());

        let mut missing = Vec::new();
        if host.is_none() {
            missing.push(ENV_SMTP_HOST);
        }
        if user.is_none() {
            missing.push(ENV_SMTP_USER);
        }
        if password.is_none() {
            missing.push(ENV_SMTP_PASSWORD);
        }
        let (Some(host), Some(user), Some(password), Some(to)) = (host, user, password, to) else {
            return Err(TransportError::NotConfigured(format!(
                "missing {}",
                missing.join(", ")
            )));
        };

        let port = match get(ENV_SMTP_PORT) {
            None => DEFAULT_SMTP_PORT,
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                TransportError::NotConfigured(format!("{} is not a port: {}", ENV_SMTP_PORT, raw))
            })?,
        };

        Ok(Self {
            host,
            port,
            user,
            password,
            to,
            from_name: get(ENV_MAIL_FROM_NAME).unwrap_or_else(|| DEFAULT_FROM_NAME.to_string()),
        })
    }

    /// プロセス環境変数と mail.env から読む
    pub fn load(env_file: &Path) -> Result<Self, TransportError> {
        let file = read_env_file(env_file);
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| file.get(key).cloned()))
    }
}

/// KEY=VALUE ファイルを読む（無い・壊れた行は無視）
pub fn read_env_file(path: &Path) -> HashMap<String, String> {
    let Ok(iter) = dotenvy::from_path_iter(path) else {
        return HashMap::new();
    };
    iter.filter_map(Result::ok).collect()
}

/// 拡張子から添付の Content-Type を決める
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("bmp") => "image/bmp",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("wav") => "audio/wav",
        Some("txt") | Some("log") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// 組み立て結果。読めなかった添付のパスも返す
#[derive(Debug)]
pub struct BuiltMessage {
    pub message: Message,
    pub skipped: Vec<PathBuf>,
}

/// メッセージを組み立てる。読めない添付は省き、本文末尾にそのパスを書く
pub fn build_message(
    settings: &SmtpSettings,
    mail: &OutgoingMail,
) -> Result<BuiltMessage, TransportError> {
    let from_addr: Address = settings
        .user
        .parse()
        .map_err(|e| TransportError::Message(format!("from address: {}", e)))?;
    let to_addr: Address = settings
        .to
        .parse()
        .map_err(|e| TransportError::Message(format!("to address: {}", e)))?;

    let mut attachments = Vec::new();
    let mut skipped = Vec::new();
    for path in &mail.attachments {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(_) => {
                skipped.push(path.clone());
                continue;
            }
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let content_type = ContentType::parse(content_type_for(path))
            .map_err(|e| TransportError::Message(format!("content type: {}", e)))?;
        attachments.push(Attachment::new(name).body(bytes, content_type));
    }

    let mut body = mail.body.clone();
    if !skipped.is_empty() {
        body.push_str("\n\nNot attached (unreadable):");
        for path in &skipped {
            body.push_str(&format!("\n  {}", path.display()));
        }
    }
    let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(body));
    for attachment in attachments {
        parts = parts.singlepart(attachment);
    }

    let message = Message::builder()
        .from(Mailbox::new(Some(settings.from_name.clone()), from_addr))
        .to(Mailbox::new(None, to_addr))
        .subject(mail.subject.clone())
        .multipart(parts)
        .map_err(|e| TransportError::Message(e.to_string()))?;
    Ok(BuiltMessage { message, skipped })
}

/// lettre による SMTP 送信
pub struct SmtpMailer {
    settings: Result<SmtpSettings, TransportError>,
}

impl SmtpMailer {
    pub fn new(settings: Result<SmtpSettings, TransportError>) -> Self {
        Self { settings }
    }

    pub fn from_env_file(env_file: &Path) -> Self {
        Self::new(SmtpSettings::load(env_file))
    }

    pub fn settings(&self) -> Option<&SmtpSettings> {
        self.settings.as_ref().ok()
    }

    fn transport(settings: &SmtpSettings) -> Result<SmtpTransport, TransportError> {
        let builder = if settings.port == IMPLICIT_TLS_PORT {
            SmtpTransport::relay(&settings.host)
        } else {
            SmtpTransport::starttls_relay(&settings.host)
        }
        .map_err(|e| TransportError::Delivery(format!("relay {}: {}", settings.host, e)))?;

        Ok(builder
            .port(settings.port)
            .credentials(Credentials::new(
                settings.user.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(SEND_TIMEOUT))
            .build())
    }
}

impl MailTransport for SmtpMailer {
    fn is_configured(&self) -> bool {
        self.settings.is_ok()
    }

    fn send(&self, mail: &OutgoingMail) -> Result<(), TransportError> {
        let settings = self.settings.as_ref().map_err(|e| e.clone())?;
        let built = build_message(settings, mail)?;
        Self::transport(settings)?
            .send(&built.message)
            .map(|_| ())
            .map_err(|e| TransportError::Delivery(e.to_string()))
    }
}
