//! Payment slip checks performed before rendering.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use ureq::Agent;

/// Outcome of a slip check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlipCheck {
    pub valid: bool,
    pub skipped: bool,
    pub reason: String,
}

impl SlipCheck {
    pub fn accepted() -> Self {
        Self {
            valid: true,
            skipped: false,
            reason: String::new(),
        }
    }

    pub fn skipped() -> Self {
        Self {
            valid: true,
            skipped: true,
            reason: "verification skipped for testing".to_owned(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            skipped: false,
            reason: reason.into(),
        }
    }
}

/// Decides whether a slip URL is acceptable.
pub trait SlipVerifier {
    fn verify(&self, slip_url: &str) -> SlipCheck;
}

/// Response metadata returned by a [`SlipProbe`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub content_type: Option<String>,
}

/// Fetches a slip reference and reports what came back.
pub trait SlipProbe {
    fn probe(&self, url: &str) -> Result<ProbeResponse, String>;
}

/// Verifier that accepts any slip the probe can fetch.
pub struct ProbingVerifier<P> {
    probe: P,
    skip: bool,
    require_image: bool,
}

impl<P: SlipProbe> ProbingVerifier<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            skip: false,
            require_image: false,
        }
    }

    /// Accepts every slip without probing.
    pub fn with_skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    /// Rejects responses whose content type is not `image/*`.
    pub fn with_required_image(mut self, require_image: bool) -> Self {
        self.require_image = require_image;
        self
    }
}

impl<P: SlipProbe> SlipVerifier for ProbingVerifier<P> {
    fn verify(&self, slip_url: &str) -> SlipCheck {
        if self.skip {
            return SlipCheck::skipped();
        }
        if slip_url.trim().is_empty() {
            return SlipCheck::rejected("empty slip_url");
        }

        let response = match self.probe.probe(slip_url) {
            Ok(response) => response,
            Err(err) => return SlipCheck::rejected(err),
        };
        if response.status != 200 {
            return SlipCheck::rejected(format!("http {}", response.status));
        }
        if self.require_image {
            let content_type = response.content_type.unwrap_or_default();
            if !content_type.starts_with("image/") {
                return SlipCheck::rejected(format!("content-type {}", content_type));
            }
        }
        SlipCheck::accepted()
    }
}

/// Probe for slips stored on the local filesystem (`file://` URLs or plain
/// paths).  Missing files answer with status 404.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFileProbe;

impl SlipProbe for LocalFileProbe {
    fn probe(&self, url: &str) -> Result<ProbeResponse, String> {
        let path = match url.strip_prefix("file://") {
            Some(path) => path,
            None if url.contains("://") => {
                return Err(format!("unsupported slip location {}", url));
            }
            None => url,
        };
        let path = Path::new(path);
        if !path.is_file() {
            return Ok(ProbeResponse {
                status: 404,
                content_type: None,
            });
        }
        Ok(ProbeResponse {
            status: 200,
            content_type: content_type_for(path).map(str::to_owned),
        })
    }
}

/// Timeout applied to a whole slip request.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Probe issuing a `GET` for `http://` and `https://` slips.
///
/// Error statuses are reported as responses, not failures, so the verifier
/// can answer `http {status}`.  Redirects are followed.
#[derive(Clone, Debug)]
pub struct HttpProbe {
    agent: Agent,
}

impl HttpProbe {
    pub fn new() -> Self {
        Self::with_timeout(HTTP_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SlipProbe for HttpProbe {
    fn probe(&self, url: &str) -> Result<ProbeResponse, String> {
        let response = self
            .agent
            .get(url)
            .header("User-Agent", "ebook-delivery")
            .call()
            .map_err(|e| e.to_string())?;
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        Ok(ProbeResponse {
            status: response.status().as_u16(),
            content_type,
        })
    }
}

/// Probe dispatching on the URL scheme: HTTP(S) through [`HttpProbe`],
/// everything else through [`LocalFileProbe`].
#[derive(Clone, Debug, Default)]
pub struct SlipLocationProbe {
    http: HttpProbe,
    local: LocalFileProbe,
}

impl SlipProbe for SlipLocationProbe {
    fn probe(&self, url: &str) -> Result<ProbeResponse, String> {
        let scheme = url.split_once("://").map(|(scheme, _)| scheme.to_ascii_lowercase());
        match scheme.as_deref() {
            Some("http") | Some("https") => self.http.probe(url),
            _ => self.local.probe(url),
        }
    }
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "pdf" => Some("application/pdf"),
        _ => Some("application/octet-stream"),
    }
}
