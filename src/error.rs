//! Error types shared by the rendering pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by the rendering pipeline.
pub type Result<T, E = RenderError> = std::result::Result<T, E>;

/// Fatal failures raised while laying out or writing a document.
///
/// A render that returns any of these variants has not produced a usable
/// artifact, even if a file exists at the requested path.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A flowable could not be laid out within the configured page geometry.
    #[error("measurement failure: {0}")]
    Measurement(String),

    /// The artifact could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The document backend (fonts, PDF engine) rejected an operation.
    #[error("document backend error: {0}")]
    Backend(#[from] genpdf::error::Error),

    /// The rendered PDF could not be post-processed with its outline.
    #[cfg(feature = "bookmarks")]
    #[error("failed to embed outline: {0}")]
    Outline(#[from] crate::bookmarks::BookmarkError),
}

impl RenderError {
    pub(crate) fn measurement(message: impl Into<String>) -> Self {
        Self::Measurement(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` when the failure came from writing the artifact.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// Failure to obtain content text from a [`ContentSource`](crate::content::ContentSource).
///
/// The pipeline never surfaces this error; it substitutes a placeholder.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The configured content file does not exist or could not be read.
    #[error("content file {}: {source}", path.display())]
    Unreadable {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// No content source is configured.
    #[error("no content configured")]
    Unconfigured,
}
