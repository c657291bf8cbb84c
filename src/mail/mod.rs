use async_trait::async_trait;
use tracing::info;

mod smtp;
pub mod templates;

pub use smtp::SmtpMailer;

/// A rendered message ready for delivery.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()>;
}

/// Writes mail to the log instead of delivering it. Used when no SMTP relay
/// is configured.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        info!(to = %mail.to, subject = %mail.subject, body = %mail.text, "mail not sent (no SMTP relay configured)");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{Mailer, OutgoingMail};

    /// Keeps every message in memory; optionally fails every send.
    #[derive(Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<OutgoingMail>>,
        fail: bool,
    }

    impl RecordingMailer {
        pub fn failing() -> Self {
            Self { sent: Mutex::new(Vec::new()), fail: true }
        }

        pub fn sent(&self) -> Vec<OutgoingMail> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("mail relay unavailable");
            }
            self.sent.lock().unwrap().push(mail);
            Ok(())
        }
    }
}
