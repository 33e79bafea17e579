//! Webhook boundary around the rendering pipeline.
//!
//! [`DeliveryAgent::handle`] takes the raw JSON body of a delivery webhook and
//! returns the status code and envelope to answer with.  Transport (HTTP
//! server, mail API, spreadsheet API) stays behind the collaborator traits in
//! the submodules; the agent only sequences them:
//!
//! 1. validate the payload (`400` on malformed JSON or missing fields)
//! 2. check the payment slip (`400` when rejected)
//! 3. render the eBook (`500` on failure, never retried)
//! 4. mail the artifact (`500` when the dispatcher reports failure)
//!
//! Every outcome after validation is written to the activity ledger on a
//! best-effort basis.

pub mod ledger;
pub mod mail;
pub mod slip;

use std::fs;
use std::path::PathBuf;

use chrono::Local;
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::DeliveryConfig;
use crate::content::{ContentSource, FileContentSource};
use crate::model::Language;
use crate::pipeline::{CanvasBackend, DocumentPipeline, GenpdfBackend, RenderRequest};

use ledger::{ActivityLogger, ActivityRecord, JsonLinesLedger};
use mail::{attachment_name, MailDelivery, MailDispatcher, OutboxDispatcher};
use slip::{ProbingVerifier, SlipLocationProbe, SlipVerifier};

/// Fields a delivery payload must carry.
pub const REQUIRED_FIELDS: &[&str] = &["email", "slip_image_url", "ebook_title"];

/// Parsed delivery webhook payload.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct DeliveryRequest {
    pub email: String,
    pub slip_image_url: String,
    pub ebook_title: String,
    #[serde(default)]
    pub language: Language,
    /// Markup to render instead of the configured content file.
    #[serde(default)]
    pub content_text: Option<String>,
}

/// Status code and JSON envelope answering a webhook call.
#[derive(Clone, Debug, PartialEq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: Value,
}

impl WebhookResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "success": false, "error": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Lists the required fields absent (or `null`) in `payload`.
pub fn missing_fields(payload: &Value) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| payload.get(field).map_or(true, Value::is_null))
        .collect()
}

/// Orchestrates verification, rendering, mailing and logging of one delivery.
pub struct DeliveryAgent<S = FileContentSource, B = GenpdfBackend> {
    config: DeliveryConfig,
    pipeline: DocumentPipeline<S, B>,
    verifier: Box<dyn SlipVerifier>,
    mailer: Box<dyn MailDispatcher>,
    ledger: Box<dyn ActivityLogger>,
}

impl DeliveryAgent {
    /// Agent rendering PDFs, probing slips over HTTP or on disk, spooling mail into
    /// `outbox` and logging to the configured ledger file.
    pub fn from_config(config: DeliveryConfig, outbox: impl Into<PathBuf>) -> Self {
        let pipeline = DocumentPipeline::new(
            config.render.clone(),
            FileContentSource::from_option(config.content_file_path.clone()),
            GenpdfBackend,
        );
        let verifier = ProbingVerifier::new(SlipLocationProbe::default())
            .with_skip(config.skip_slip_verification)
            .with_required_image(config.require_image_content_type);
        let mailer = OutboxDispatcher::new(outbox, config.sender_email.clone());
        let ledger = JsonLinesLedger::new(config.ledger_path.clone());
        Self::new(
            config,
            pipeline,
            Box::new(verifier),
            Box::new(mailer),
            Box::new(ledger),
        )
    }
}

impl<S, B> DeliveryAgent<S, B>
where
    S: ContentSource,
    B: CanvasBackend,
{
    pub fn new(
        config: DeliveryConfig,
        pipeline: DocumentPipeline<S, B>,
        verifier: Box<dyn SlipVerifier>,
        mailer: Box<dyn MailDispatcher>,
        ledger: Box<dyn ActivityLogger>,
    ) -> Self {
        Self {
            config,
            pipeline,
            verifier,
            mailer,
            ledger,
        }
    }

    /// Liveness envelope.
    pub fn health(&self) -> WebhookResponse {
        WebhookResponse::ok(json!({ "status": "ok", "service": "ebook-delivery" }))
    }

    /// Handles one webhook body.
    pub fn handle(&self, payload: &str) -> WebhookResponse {
        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(err) => return WebhookResponse::error(400, format!("Invalid JSON: {}", err)),
        };

        let missing = missing_fields(&value);
        if !missing.is_empty() {
            warn!("rejecting delivery, missing fields: {:?}", missing);
            return WebhookResponse::error(400, format!("Missing fields: {}", missing.join(", ")));
        }

        let request: DeliveryRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(err) => return WebhookResponse::error(400, format!("Invalid payload: {}", err)),
        };
        info!(
            "processing delivery of {:?} to {} ({})",
            request.ebook_title, request.email, request.language
        );

        self.deliver(&request)
    }

    fn deliver(&self, request: &DeliveryRequest) -> WebhookResponse {
        let slip = self.verifier.verify(&request.slip_image_url);
        if !slip.valid {
            self.record(request, "slip_rejected", json!({ "slip": &slip }));
            return WebhookResponse::error(
                400,
                format!("Slip verification failed: {}", slip.reason),
            );
        }

        let output_path = match self.output_path(request) {
            Ok(path) => path,
            Err(err) => {
                error!("cannot prepare output directory: {}", err);
                self.record(request, "render_failed", json!({ "error": err.to_string() }));
                return WebhookResponse::error(500, err.to_string());
            }
        };

        let render_request = RenderRequest::new(request.ebook_title.clone())
            .with_language(request.language)
            .with_output_path(output_path)
            .with_content(request.content_text.clone());
        let artifact = match self.pipeline.render_document(&render_request) {
            Ok(path) => path,
            Err(err) => {
                error!("rendering {:?} failed: {}", request.ebook_title, err);
                self.record(request, "render_failed", json!({ "error": err.to_string() }));
                return WebhookResponse::error(500, err.to_string());
            }
        };

        let email_result = self.mailer.send(&MailDelivery {
            recipient: &request.email,
            title: &request.ebook_title,
            attachment: &artifact,
            language: request.language,
        });
        if !email_result.success {
            let reason = email_result.error.clone().unwrap_or_default();
            error!("mail to {} failed: {}", request.email, reason);
            self.record(request, "email_failed", json!({ "email_result": &email_result }));
            return WebhookResponse::error(500, format!("Email delivery failed: {}", reason));
        }

        let log = self.record(
            request,
            "delivered",
            json!({ "slip": &slip, "email_result": &email_result }),
        );
        info!("delivered {:?} to {}", request.ebook_title, request.email);
        WebhookResponse::ok(json!({
            "success": true,
            "message": "eBook delivered successfully",
            "details": {
                "email": request.email,
                "ebook": request.ebook_title,
                "artifact": artifact.display().to_string(),
                "slip": slip,
                "email_result": email_result,
                "activity_log": log,
            }
        }))
    }

    fn output_path(&self, request: &DeliveryRequest) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.config.output_dir)?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S_%6f");
        Ok(self.config.output_dir.join(format!(
            "ebook_{}_{}",
            stamp,
            attachment_name(&request.ebook_title)
        )))
    }

    fn record(&self, request: &DeliveryRequest, status: &str, details: Value) -> ledger::LogOutcome {
        self.ledger.log(&ActivityRecord {
            email: &request.email,
            ebook_title: &request.ebook_title,
            status,
            details,
        })
    }
}
