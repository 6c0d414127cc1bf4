#![forbid(unsafe_code)]

use crate::support::{now_ms_i64, ts_ms_to_rfc3339};
use std::path::PathBuf;
use thiserror::Error;

pub const MAIL_FROM: &str = "StreamStory <streamstory@ijs.si>";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail outbox: {0}")]
    Outbox(#[from] std::io::Error),
}

pub trait Mailer {
    fn send(&mut self, mail: &Mail) -> Result<(), MailError>;
}

/// Logs mails instead of delivering them.
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&mut self, mail: &Mail) -> Result<(), MailError> {
        tracing::info!(to = %mail.to, subject = %mail.subject, text = %mail.text, "mail not delivered (no outbox configured)");
        Ok(())
    }
}

/// Writes each mail as a plain-text message file into a directory.
#[derive(Debug)]
pub struct OutboxMailer {
    dir: PathBuf,
    sent: u64,
}

impl OutboxMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, MailError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, sent: 0 })
    }
}

impl Mailer for OutboxMailer {
    fn send(&mut self, mail: &Mail) -> Result<(), MailError> {
        let ts_ms = now_ms_i64();
        self.sent += 1;
        let path = self
            .dir
            .join(format!("{ts_ms}_{}_{:04}.eml", std::process::id(), self.sent));
        let message = format!(
            "From: {MAIL_FROM}\r\nTo: {}\r\nDate: {}\r\nSubject: {}\r\n\r\n{}\r\n",
            mail.to,
            ts_ms_to_rfc3339(ts_ms),
            mail.subject,
            mail.text
        );
        std::fs::write(&path, message)?;
        tracing::debug!(path = %path.display(), to = %mail.to, "mail written to outbox");
        Ok(())
    }
}

pub fn activation_mail(to: &str, host_url: &str, token: &str) -> Mail {
    Mail {
        to: to.to_string(),
        subject: "Activate your account".to_string(),
        text: format!(
            "Thank you for registering.\nOpen the link below to activate your account:\n{host_url}/login/{token}"
        ),
    }
}

pub fn password_reset_mail(to: &str, host_url: &str, token: &str) -> Mail {
    Mail {
        to: to.to_string(),
        subject: "Reset your password".to_string(),
        text: format!(
            "A password reset was requested for your StreamStory account. Open the link below to choose a new password:\n\
{host_url}/password-reset/{token}\n\
The link expires in 24 hours.\n\
If you did not ask for a reset, ignore this message."
        ),
    }
}
