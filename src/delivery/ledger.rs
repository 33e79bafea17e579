//! Best-effort activity ledger for deliveries.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::warn;
use serde::Serialize;
use serde_json::{json, Value};

/// One delivery attempt worth recording.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityRecord<'a> {
    pub email: &'a str,
    pub ebook_title: &'a str,
    pub status: &'a str,
    pub details: Value,
}

/// Whether a record made it into the ledger.  Failures are reported here
/// instead of being raised.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogOutcome {
    pub logged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LogOutcome {
    pub fn logged() -> Self {
        Self {
            logged: true,
            reason: None,
            error: None,
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            logged: false,
            reason: Some(reason.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            logged: false,
            reason: None,
            error: Some(error.into()),
        }
    }
}

/// Appends delivery records to an external ledger.
pub trait ActivityLogger {
    fn log(&self, record: &ActivityRecord<'_>) -> LogOutcome;
}

/// Ledger appending one JSON object per line to a file.
#[derive(Clone, Debug, Default)]
pub struct JsonLinesLedger {
    path: Option<PathBuf>,
}

impl JsonLinesLedger {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    fn append(&self, path: &Path, record: &ActivityRecord<'_>) -> std::io::Result<()> {
        let row = json!({
            "timestamp": Local::now().to_rfc3339(),
            "email": record.email,
            "ebook_title": record.ebook_title,
            "status": record.status,
            "details": record.details,
        });
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", row)
    }
}

impl ActivityLogger for JsonLinesLedger {
    fn log(&self, record: &ActivityRecord<'_>) -> LogOutcome {
        let Some(path) = &self.path else {
            return LogOutcome::skipped("no_ledger_config");
        };
        match self.append(path, record) {
            Ok(()) => LogOutcome::logged(),
            Err(err) => {
                warn!("failed to append to ledger {}: {}", path.display(), err);
                LogOutcome::failed(err.to_string())
            }
        }
    }
}
