//! Explicit configuration values passed into each pipeline call.
//!
//! Lengths are expressed in PostScript points (1/72 inch).  Backends that work
//! in millimetres convert at the edge with [`pt_to_mm`] and [`mm_to_pt`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::StyleSheet;

const MM_PER_INCH: f64 = 25.4;
const PT_PER_INCH: f64 = 72.0;

/// Converts points to millimetres.
pub fn pt_to_mm(value: f64) -> f64 {
    value * MM_PER_INCH / PT_PER_INCH
}

/// Converts millimetres to points.
pub fn mm_to_pt(value: f64) -> f64 {
    value * PT_PER_INCH / MM_PER_INCH
}

/// Physical page dimensions in points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// ISO 216 A4 (210 × 297 mm).
    pub const A4: PageSize = PageSize {
        width: 595.2756,
        height: 841.8898,
    };

    /// ISO 216 A5 (148 × 210 mm).
    pub const A5: PageSize = PageSize {
        width: 419.5276,
        height: 595.2756,
    };

    /// Creates a page size from millimetres.
    pub fn from_mm(width: f64, height: f64) -> Self {
        Self {
            width: mm_to_pt(width),
            height: mm_to_pt(height),
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

/// Page margins in points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    /// Creates margins in the order top, right, bottom, left.
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Applies the same margin on every side.
    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::new(40.0, 36.0, 36.0, 36.0)
    }
}

/// Everything the renderer needs besides the content itself.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub page_size: PageSize,
    pub margins: Margins,
    pub style_sheet: StyleSheet,
}

impl RenderConfig {
    /// Width available to text between the left and right margins.
    pub fn usable_width(&self) -> f64 {
        self.page_size.width - self.margins.left - self.margins.right
    }

    /// Height available to text between the top and bottom margins.
    pub fn usable_height(&self) -> f64 {
        self.page_size.height - self.margins.top - self.margins.bottom
    }
}

/// Settings for the delivery boundary around the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// `From` address of delivery mails.
    pub sender_email: String,
    /// Accept every slip without probing it.
    pub skip_slip_verification: bool,
    /// Reject slips whose content type is not `image/*`.
    pub require_image_content_type: bool,
    /// Markup file used when a request carries no content text.
    pub content_file_path: Option<PathBuf>,
    /// Directory that receives rendered artifacts.
    pub output_dir: PathBuf,
    /// JSON-lines file receiving delivery records; disabled when unset.
    pub ledger_path: Option<PathBuf>,
    pub render: RenderConfig,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            sender_email: "noreply@kasip.com".to_owned(),
            skip_slip_verification: true,
            require_image_content_type: false,
            content_file_path: Some(PathBuf::from("ebook_content.md")),
            output_dir: PathBuf::from("temp"),
            ledger_path: None,
            render: RenderConfig::default(),
        }
    }
}

/// Failure to load a [`DeliveryConfig`] from disk.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl DeliveryConfig {
    /// Loads a JSON configuration file; absent keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
