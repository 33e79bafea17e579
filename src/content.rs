//! Sources of eBook markup text.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::ContentError;

/// Supplies content text when a render request carries none.
///
/// Closures returning `Result<String, ContentError>` implement this trait,
/// which keeps tests free of filesystem access.
pub trait ContentSource {
    fn load(&self) -> Result<String, ContentError>;
}

impl<F> ContentSource for F
where
    F: Fn() -> Result<String, ContentError>,
{
    fn load(&self) -> Result<String, ContentError> {
        self()
    }
}

/// Reads content from a markup file on disk.
#[derive(Clone, Debug, Default)]
pub struct FileContentSource {
    path: Option<PathBuf>,
}

impl FileContentSource {
    /// Reads from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A source with no file configured; every load fails.
    pub fn unconfigured() -> Self {
        Self { path: None }
    }

    /// Uses `path` when set, otherwise behaves like [`Self::unconfigured`].
    pub fn from_option(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl ContentSource for FileContentSource {
    fn load(&self) -> Result<String, ContentError> {
        let path = self.path.as_ref().ok_or(ContentError::Unconfigured)?;
        fs::read_to_string(path).map_err(|source| ContentError::Unreadable {
            path: path.clone(),
            source,
        })
    }
}

/// Placeholder document used when no content could be loaded.
pub fn placeholder(title: &str, reason: &ContentError) -> String {
    format!("# {}\n\n(no content available: {})", title, reason)
}

/// Picks the text to render: explicit text first, then `source`, then a
/// placeholder naming `title`.
pub fn resolve_content<S>(explicit: Option<&str>, source: &S, title: &str) -> String
where
    S: ContentSource + ?Sized,
{
    if let Some(text) = explicit {
        return text.to_owned();
    }
    match source.load() {
        Ok(text) => text,
        Err(err) => {
            warn!("falling back to placeholder content for {:?}: {}", title, err);
            placeholder(title, &err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_text_wins_over_source() {
        let source = || -> Result<String, ContentError> { Ok("from source".into()) };
        assert_eq!(resolve_content(Some("explicit"), &source, "T"), "explicit");
        assert_eq!(resolve_content(None, &source, "T"), "from source");
    }

    #[test]
    fn empty_explicit_text_is_kept() {
        let source = || -> Result<String, ContentError> { Ok("from source".into()) };
        assert_eq!(resolve_content(Some(""), &source, "T"), "");
    }

    #[test]
    fn missing_file_degrades_to_placeholder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = FileContentSource::new(dir.path().join("ebook_content.md"));
        let text = resolve_content(None, &source, "My Book");
        assert!(text.starts_with("# My Book\n\n"));
        assert!(text.contains("ebook_content.md"));
    }

    #[test]
    fn file_source_reads_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("book.md");
        fs::write(&path, "## Chapter").expect("write");
        let source = FileContentSource::new(&path);
        assert_eq!(source.load().expect("load"), "## Chapter");
    }

    #[test]
    fn unconfigured_source_fails() {
        assert!(matches!(
            FileContentSource::unconfigured().load(),
            Err(ContentError::Unconfigured)
        ));
    }
}
