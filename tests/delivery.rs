use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use ebook_delivery::content::FileContentSource;
use ebook_delivery::delivery::ledger::{ActivityLogger, ActivityRecord, LogOutcome};
use ebook_delivery::delivery::mail::{MailDelivery, MailDispatcher, MailOutcome};
use ebook_delivery::delivery::slip::{SlipCheck, SlipVerifier};
use ebook_delivery::delivery::DeliveryAgent;
use ebook_delivery::pipeline::{DocumentPipeline, TranscriptBackend};
use ebook_delivery::{DeliveryConfig, RenderConfig};
use serde_json::json;

struct FixedSlip(SlipCheck);

impl SlipVerifier for FixedSlip {
    fn verify(&self, _slip_url: &str) -> SlipCheck {
        self.0.clone()
    }
}

#[derive(Clone, Default)]
struct RecordingMailer {
    sent: Rc<RefCell<Vec<(String, PathBuf)>>>,
    failure: Option<String>,
}

impl MailDispatcher for RecordingMailer {
    fn send(&self, delivery: &MailDelivery<'_>) -> MailOutcome {
        if let Some(error) = &self.failure {
            return MailOutcome::failed(error.clone());
        }
        self.sent
            .borrow_mut()
            .push((delivery.recipient.to_owned(), delivery.attachment.to_path_buf()));
        MailOutcome::sent("msg-1")
    }
}

#[derive(Clone, Default)]
struct RecordingLedger {
    statuses: Rc<RefCell<Vec<String>>>,
}

impl ActivityLogger for RecordingLedger {
    fn log(&self, record: &ActivityRecord<'_>) -> LogOutcome {
        self.statuses.borrow_mut().push(record.status.to_owned());
        LogOutcome::logged()
    }
}

struct Harness {
    agent: DeliveryAgent<FileContentSource, TranscriptBackend>,
    mailer: RecordingMailer,
    ledger: RecordingLedger,
    _dir: tempfile::TempDir,
    output_dir: PathBuf,
}

fn harness(slip: SlipCheck, mail_failure: Option<&str>) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let output_dir = dir.path().join("artifacts");
    let config = DeliveryConfig {
        output_dir: output_dir.clone(),
        content_file_path: None,
        ..DeliveryConfig::default()
    };
    let mailer = RecordingMailer {
        failure: mail_failure.map(str::to_owned),
        ..RecordingMailer::default()
    };
    let ledger = RecordingLedger::default();
    let pipeline = DocumentPipeline::new(
        RenderConfig::default(),
        FileContentSource::unconfigured(),
        TranscriptBackend,
    );
    let agent = DeliveryAgent::new(
        config,
        pipeline,
        Box::new(FixedSlip(slip)),
        Box::new(mailer.clone()),
        Box::new(ledger.clone()),
    );
    Harness {
        agent,
        mailer,
        ledger,
        _dir: dir,
        output_dir,
    }
}

fn payload() -> String {
    json!({
        "email": "reader@example.com",
        "slip_image_url": "https://slips.example.com/1.png",
        "ebook_title": "Rust Basics",
        "language": "EN",
        "content_text": "# Rust Basics\nOwnership first."
    })
    .to_string()
}

#[test]
fn successful_delivery_renders_mails_and_logs() {
    let h = harness(SlipCheck::accepted(), None);
    let response = h.agent.handle(&payload());

    assert_eq!(response.status, 200);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["details"]["email"], "reader@example.com");
    assert_eq!(response.body["details"]["ebook"], "Rust Basics");
    assert_eq!(response.body["details"]["email_result"]["message_id"], "msg-1");
    assert_eq!(response.body["details"]["activity_log"]["logged"], true);

    let sent = h.mailer.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "reader@example.com");
    assert!(sent[0].1.starts_with(&h.output_dir));
    let transcript = fs::read_to_string(&sent[0].1).expect("artifact");
    assert!(transcript.contains("Ownership first."));
    assert_eq!(*h.ledger.statuses.borrow(), vec!["delivered".to_owned()]);
}

#[test]
fn malformed_json_is_a_client_error() {
    let h = harness(SlipCheck::accepted(), None);
    let response = h.agent.handle("{not json");

    assert_eq!(response.status, 400);
    assert_eq!(response.body["success"], false);
    assert!(h.ledger.statuses.borrow().is_empty());
}

#[test]
fn missing_fields_are_named() {
    let h = harness(SlipCheck::accepted(), None);
    let response = h
        .agent
        .handle(&json!({ "email": "reader@example.com", "slip_image_url": null }).to_string());

    assert_eq!(response.status, 400);
    assert_eq!(
        response.body["error"],
        "Missing fields: slip_image_url, ebook_title"
    );
    assert!(h.mailer.sent.borrow().is_empty());
}

#[test]
fn rejected_slip_stops_before_rendering() {
    let h = harness(SlipCheck::rejected("http 404"), None);
    let response = h.agent.handle(&payload());

    assert_eq!(response.status, 400);
    assert_eq!(response.body["error"], "Slip verification failed: http 404");
    assert!(!h.output_dir.exists());
    assert_eq!(*h.ledger.statuses.borrow(), vec!["slip_rejected".to_owned()]);
}

#[test]
fn mail_failure_is_a_server_error() {
    let h = harness(SlipCheck::skipped(), Some("smtp down"));
    let response = h.agent.handle(&payload());

    assert_eq!(response.status, 500);
    assert_eq!(response.body["error"], "Email delivery failed: smtp down");
    assert_eq!(*h.ledger.statuses.borrow(), vec!["email_failed".to_owned()]);
}

#[test]
fn unusable_output_directory_fails_the_render() {
    let h = harness(SlipCheck::accepted(), None);
    fs::write(&h.output_dir, b"not a directory").expect("block output dir");
    let response = h.agent.handle(&payload());

    assert_eq!(response.status, 500);
    assert!(h.mailer.sent.borrow().is_empty());
    assert_eq!(*h.ledger.statuses.borrow(), vec!["render_failed".to_owned()]);
}

#[test]
fn health_reports_ok() {
    let h = harness(SlipCheck::accepted(), None);
    let response = h.agent.health();
    assert_eq!(response.status, 200);
    assert_eq!(response.body["status"], "ok");
}
