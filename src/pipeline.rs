//! The `render_document` entry point tying segmenter, layout and renderer
//! together.
//!
//! A [`DocumentPipeline`] owns its configuration, content source and canvas
//! backend, so concurrent callers can hold pipelines with different settings.
//! Each call is synchronous and keeps no state between invocations.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::debug;

use crate::config::{PageSize, RenderConfig};
use crate::content::{resolve_content, ContentSource, FileContentSource};
use crate::error::Result;
use crate::layout::layout;
use crate::markup::Segmenter;
use crate::model::Language;
use crate::render::{Canvas, GenpdfCanvas, RenderedDocument, Renderer, TranscriptCanvas};

/// Default markup file read when a request has no content text.
pub const DEFAULT_CONTENT_PATH: &str = "ebook_content.md";

/// Creates the canvas for a single render call.
pub trait CanvasBackend {
    type Canvas: Canvas;

    fn open(&self, page_size: PageSize, title: &str) -> Result<Self::Canvas>;
}

/// Backend producing PDF files through `genpdf`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GenpdfBackend;

impl CanvasBackend for GenpdfBackend {
    type Canvas = GenpdfCanvas;

    fn open(&self, page_size: PageSize, title: &str) -> Result<GenpdfCanvas> {
        GenpdfCanvas::new(page_size, title)
    }
}

/// Backend producing plain-text page transcripts.
#[derive(Clone, Copy, Debug, Default)]
pub struct TranscriptBackend;

impl CanvasBackend for TranscriptBackend {
    type Canvas = TranscriptCanvas;

    fn open(&self, page_size: PageSize, _title: &str) -> Result<TranscriptCanvas> {
        Ok(TranscriptCanvas::new(page_size))
    }
}

/// Parameters of one render call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderRequest {
    pub title: String,
    /// Informational only; the layout does not depend on it.
    pub language: Language,
    pub output_path: Option<PathBuf>,
    pub content_text: Option<String>,
}

impl RenderRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_output_path(mut self, path: impl Into<Option<PathBuf>>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_content(mut self, text: impl Into<Option<String>>) -> Self {
        self.content_text = text.into();
        self
    }
}

/// Timestamped file name used when a request has no output path.
pub fn default_output_path(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("ebook_{}.pdf", now.format("%Y%m%d_%H%M%S")))
}

/// Segments, lays out and renders eBooks with injected collaborators.
pub struct DocumentPipeline<S = FileContentSource, B = GenpdfBackend> {
    config: RenderConfig,
    content: S,
    backend: B,
}

impl Default for DocumentPipeline {
    fn default() -> Self {
        Self::new(
            RenderConfig::default(),
            FileContentSource::new(DEFAULT_CONTENT_PATH),
            GenpdfBackend,
        )
    }
}

impl<S, B> DocumentPipeline<S, B>
where
    S: ContentSource,
    B: CanvasBackend,
{
    pub fn new(config: RenderConfig, content: S, backend: B) -> Self {
        Self {
            config,
            content,
            backend,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Renders `request` and returns the written document with its page text.
    pub fn render(&self, request: &RenderRequest) -> Result<RenderedDocument> {
        let output_path = request
            .output_path
            .clone()
            .unwrap_or_else(|| default_output_path(Local::now()));
        let text = resolve_content(request.content_text.as_deref(), &self.content, &request.title);
        debug!(
            "rendering {:?} ({}) to {}",
            request.title,
            request.language,
            output_path.display()
        );

        let flowables = layout(Segmenter::new(&text), &request.title, &self.config.style_sheet);
        let canvas = self.backend.open(self.config.page_size, &request.title)?;
        Renderer::new(&self.config).render(flowables, canvas, &output_path)
    }

    /// Renders `request` and returns the path of the artifact.
    pub fn render_document(&self, request: &RenderRequest) -> Result<PathBuf> {
        self.render(request).map(|document| document.path)
    }
}

/// Renders a PDF with the default configuration, reading
/// [`DEFAULT_CONTENT_PATH`] when `content_text` is `None`.
pub fn render_document(
    title: &str,
    language: Language,
    output_path: Option<&Path>,
    content_text: Option<&str>,
) -> Result<PathBuf> {
    let request = RenderRequest::new(title)
        .with_language(language)
        .with_output_path(output_path.map(Path::to_path_buf))
        .with_content(content_text.map(str::to_owned));
    DocumentPipeline::default().render_document(&request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ContentError, RenderError};
    use chrono::TimeZone;

    fn no_content() -> Result<String, ContentError> {
        Err(ContentError::Unconfigured)
    }

    fn pipeline<S: ContentSource>(content: S) -> DocumentPipeline<S, TranscriptBackend> {
        DocumentPipeline::new(RenderConfig::default(), content, TranscriptBackend)
    }

    #[test]
    fn default_path_is_timestamped() {
        let now = Local
            .with_ymd_and_hms(2025, 3, 9, 14, 5, 7)
            .single()
            .expect("valid time");
        assert_eq!(
            default_output_path(now),
            PathBuf::from("ebook_20250309_140507.pdf")
        );
    }

    #[test]
    fn injected_source_supplies_missing_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = || -> Result<String, ContentError> { Ok("## From source".into()) };
        let request =
            RenderRequest::new("Book").with_output_path(dir.path().join("book.txt"));
        let document = pipeline(source).render(&request).expect("render");
        assert_eq!(document.page_of("From source"), Some(2));
    }

    #[test]
    fn placeholder_is_used_when_nothing_loads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let request =
            RenderRequest::new("Lonely Book").with_output_path(dir.path().join("book.txt"));
        let document = pipeline(no_content).render(&request).expect("render");
        assert_eq!(document.page_count(), 2);
        assert_eq!(document.pages[1][0], "Lonely Book");
    }

    #[test]
    fn language_does_not_change_layout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = RenderRequest::new("Book").with_content(Some("# A\nbody".to_owned()));
        let th = pipeline(no_content)
            .render(&base.clone().with_output_path(dir.path().join("th.txt")))
            .expect("render th");
        let en = pipeline(no_content)
            .render(
                &base
                    .with_language(Language::En)
                    .with_output_path(dir.path().join("en.txt")),
            )
            .expect("render en");
        assert_eq!(th.pages, en.pages);
    }

    #[test]
    fn unwritable_output_fails_with_io() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("no-such-dir").join("book.txt");
        let request = RenderRequest::new("Book")
            .with_content(Some("text".to_owned()))
            .with_output_path(target.clone());
        let err = pipeline(no_content).render_document(&request).unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
        assert!(!target.exists());
    }
}
