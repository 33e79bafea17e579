//! Delivery mail composition and dispatch.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;
use serde::Serialize;

use crate::model::Language;

/// A fully composed delivery mail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
}

/// Inputs of one delivery mail.
#[derive(Clone, Copy, Debug)]
pub struct MailDelivery<'a> {
    pub recipient: &'a str,
    pub title: &'a str,
    pub attachment: &'a Path,
    pub language: Language,
}

/// Result of handing a mail to the transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MailOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MailOutcome {
    pub fn sent(message_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message_id: Some(message_id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Sends a rendered artifact to its recipient.
pub trait MailDispatcher {
    fn send(&self, delivery: &MailDelivery<'_>) -> MailOutcome;
}

/// File name the artifact carries when attached.  Spaces and path
/// separators become `_`, so the name is always a single path component.
pub fn attachment_name(title: &str) -> String {
    format!("{}.pdf", title.replace([' ', '/', '\\'], "_"))
}

/// Builds the mail for a delivery.  An empty `sender` falls back to the
/// recipient address.
pub fn compose_message(sender: &str, recipient: &str, title: &str, language: Language) -> MailMessage {
    let (subject, body) = match language {
        Language::Th => (
            format!("🎉 eBook ของคุณพร้อมแล้ว: {}", title),
            format!(
                "สวัสดีค่ะ,\n\nขอบคุณที่สั่งซื้อ eBook จาก Kasip!\n\nแนบไฟล์ \"{}\" มาให้แล้วครับ/ค่ะ \
                 เปิดอ่านได้ทันทีบนอุปกรณ์ของคุณ\n\nหากมีคำถาม ติดต่อ support@kasip.com\n\n\
                 ด้วยความปรารถนาดี,\nทีม Kasip",
                title
            ),
        ),
        Language::En => (
            format!("🎉 Your eBook is Ready: {}", title),
            format!(
                "Hello,\n\nThank you for purchasing from Kasip!\n\nYour eBook \"{}\" is attached.\n\n\
                 If you have any questions, contact support@kasip.com\n\nBest regards,\nKasip Team",
                title
            ),
        ),
    };

    MailMessage {
        to: recipient.to_owned(),
        from: if sender.is_empty() {
            recipient.to_owned()
        } else {
            sender.to_owned()
        },
        subject,
        body,
        attachment_name: attachment_name(title),
    }
}

/// Dispatcher that spools each mail into a directory instead of sending it.
///
/// Every message becomes `<id>.json` plus a copy of the attachment named
/// `<id>-<attachment name>`, ready for a separate transport to pick up.
#[derive(Clone, Debug)]
pub struct OutboxDispatcher {
    directory: PathBuf,
    sender: String,
}

impl OutboxDispatcher {
    pub fn new(directory: impl Into<PathBuf>, sender: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            sender: sender.into(),
        }
    }

    fn spool(&self, delivery: &MailDelivery<'_>) -> std::io::Result<String> {
        let message = compose_message(
            &self.sender,
            delivery.recipient,
            delivery.title,
            delivery.language,
        );
        fs::create_dir_all(&self.directory)?;

        let id = Local::now().format("%Y%m%d%H%M%S%6f").to_string();
        fs::copy(
            delivery.attachment,
            self.directory
                .join(format!("{}-{}", id, message.attachment_name)),
        )?;
        let json = serde_json::to_vec_pretty(&message)?;
        fs::write(self.directory.join(format!("{}.json", id)), json)?;
        Ok(id)
    }
}

impl MailDispatcher for OutboxDispatcher {
    fn send(&self, delivery: &MailDelivery<'_>) -> MailOutcome {
        match self.spool(delivery) {
            Ok(id) => {
                info!("queued mail {} for {}", id, delivery.recipient);
                MailOutcome::sent(id)
            }
            Err(err) => MailOutcome::failed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_message_mentions_title() {
        let message = compose_message("shop@kasip.com", "reader@example.com", "Rust Basics", Language::En);
        assert_eq!(message.subject, "🎉 Your eBook is Ready: Rust Basics");
        assert!(message.body.contains("\"Rust Basics\" is attached"));
        assert_eq!(message.from, "shop@kasip.com");
        assert_eq!(message.attachment_name, "Rust_Basics.pdf");
    }

    #[test]
    fn thai_is_the_default_wording() {
        let message = compose_message("", "reader@example.com", "เล่มแรก", Language::default());
        assert!(message.subject.starts_with("🎉 eBook ของคุณพร้อมแล้ว"));
        assert_eq!(message.from, "reader@example.com");
    }

    #[test]
    fn outbox_spools_message_and_attachment() {
        let dir = tempfile::tempdir().expect("tempdir");
        let artifact = dir.path().join("book.pdf");
        fs::write(&artifact, b"%PDF").expect("write artifact");
        let outbox = dir.path().join("outbox");

        let outcome = OutboxDispatcher::new(&outbox, "noreply@kasip.com").send(&MailDelivery {
            recipient: "reader@example.com",
            title: "My Book",
            attachment: &artifact,
            language: Language::En,
        });

        let id = outcome.message_id.clone().expect("message id");
        assert!(outcome.success);
        assert!(outbox.join(format!("{}-My_Book.pdf", id)).is_file());
        let spooled = fs::read_to_string(outbox.join(format!("{}.json", id))).expect("json");
        assert!(spooled.contains("reader@example.com"));
    }

    #[test]
    fn titles_with_separators_stay_in_the_outbox() {
        let dir = tempfile::tempdir().expect("tempdir");
        let artifact = dir.path().join("book.pdf");
        fs::write(&artifact, b"%PDF").expect("write artifact");
        let outbox = dir.path().join("outbox");

        let outcome = OutboxDispatcher::new(&outbox, "noreply@kasip.com").send(&MailDelivery {
            recipient: "reader@example.com",
            title: "Cats/Dogs\\Birds",
            attachment: &artifact,
            language: Language::En,
        });

        assert!(outcome.success, "{:?}", outcome.error);
        let id = outcome.message_id.expect("message id");
        assert!(outbox.join(format!("{}-Cats_Dogs_Birds.pdf", id)).is_file());
        assert_eq!(attachment_name("Cats/Dogs"), "Cats_Dogs.pdf");
    }

    #[test]
    fn missing_attachment_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let outcome = OutboxDispatcher::new(dir.path(), "noreply@kasip.com").send(&MailDelivery {
            recipient: "reader@example.com",
            title: "Ghost",
            attachment: &dir.path().join("missing.pdf"),
            language: Language::Th,
        });
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }
}
