//! Pagination of flowables onto fixed-size pages.
//!
//! The [`Renderer`] walks the flowable sequence once, in order, keeping a
//! `PageCursor` that tracks the vertical offset on the current page.  Text
//! is wrapped to the usable width through the [`Canvas`] metrics.  A text
//! flowable that does not fit the remaining space is moved to a fresh page
//! (automatic overflow); [`Flowable::ExplicitBreak`] closes the current page
//! unconditionally.  Pages are opened lazily, so a trailing break never
//! produces a blank page.  The finished layout is serialised exactly once by
//! [`Canvas::save`].

pub mod canvas;
pub mod pdf;
pub mod transcript;

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::RenderConfig;
use crate::error::{RenderError, Result};
use crate::model::{BlockStyle, Flowable, HorizontalAlignment, TextKind};

pub use canvas::{wrap_text, Canvas};
pub use pdf::GenpdfCanvas;
pub use transcript::TranscriptCanvas;

const LAYOUT_EPSILON: f64 = 1e-6;

/// Result of a successful render.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedDocument {
    /// Path of the written artifact.
    pub path: PathBuf,
    /// Text lines placed on each page, in drawing order.
    pub pages: Vec<Vec<String>>,
}

impl RenderedDocument {
    /// Number of pages in the artifact.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Returns the 1-indexed page holding the first line equal to `line`.
    pub fn page_of(&self, line: &str) -> Option<usize> {
        self.pages
            .iter()
            .position(|page| page.iter().any(|placed| placed == line))
            .map(|index| index + 1)
    }
}

/// Vertical position tracker for the page being filled.
///
/// `page == 0` means no page has been opened yet; `open == false` after an
/// explicit break until the next element needs a page.
#[derive(Clone, Copy, Debug)]
struct PageCursor {
    page: usize,
    open: bool,
    y: f64,
    placed: bool,
    top: f64,
    bottom: f64,
}

impl PageCursor {
    fn new(config: &RenderConfig) -> Self {
        Self {
            page: 0,
            open: false,
            y: config.margins.top,
            placed: false,
            top: config.margins.top,
            bottom: config.page_size.height - config.margins.bottom,
        }
    }

    fn reset(&mut self) {
        self.page += 1;
        self.open = true;
        self.y = self.top;
        self.placed = false;
    }

    fn remaining(&self) -> f64 {
        self.bottom - self.y
    }

    fn at_top(&self) -> bool {
        !self.placed
    }

    fn advance(&mut self, height: f64) {
        self.y = (self.y + height).min(self.bottom);
    }
}

/// Lays out flowables on pages described by a [`RenderConfig`].
pub struct Renderer<'a> {
    config: &'a RenderConfig,
}

impl<'a> Renderer<'a> {
    /// Creates a renderer for the given configuration.
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    /// Renders `flowables` onto `canvas` and writes the artifact to `path`.
    pub fn render<C, I>(&self, flowables: I, mut canvas: C, path: &Path) -> Result<RenderedDocument>
    where
        C: Canvas,
        I: IntoIterator<Item = Flowable>,
    {
        self.check_geometry()?;

        let mut session = Session {
            config: self.config,
            canvas: &mut canvas,
            cursor: PageCursor::new(self.config),
            pages: Vec::new(),
        };
        for flowable in flowables {
            session.place(flowable)?;
        }
        if session.cursor.page == 0 {
            session.open_page()?;
        }
        let pages = session.pages;

        let path = canvas.save(path)?;
        info!("wrote {} ({} page(s))", path.display(), pages.len());
        Ok(RenderedDocument { path, pages })
    }

    fn check_geometry(&self) -> Result<()> {
        let width = self.config.usable_width();
        if width <= 0.0 {
            return Err(RenderError::measurement(format!(
                "usable width {:.2}pt is not positive; check the left and right margins",
                width
            )));
        }
        let height = self.config.usable_height();
        let leading = self.config.style_sheet.max_leading();
        if height < leading {
            return Err(RenderError::measurement(format!(
                "usable height {:.2}pt cannot hold a {:.2}pt line",
                height, leading
            )));
        }
        Ok(())
    }
}

struct Session<'r, C> {
    config: &'r RenderConfig,
    canvas: &'r mut C,
    cursor: PageCursor,
    pages: Vec<Vec<String>>,
}

impl<C: Canvas> Session<'_, C> {
    fn open_page(&mut self) -> Result<()> {
        self.canvas.start_page()?;
        self.cursor.reset();
        self.pages.push(Vec::new());
        debug!("started page {}", self.cursor.page);
        Ok(())
    }

    fn ensure_open(&mut self) -> Result<()> {
        if self.cursor.open {
            Ok(())
        } else {
            self.open_page()
        }
    }

    fn place(&mut self, flowable: Flowable) -> Result<()> {
        if let Some((kind, text)) = flowable.text() {
            return self.place_text(kind, text);
        }
        match flowable {
            Flowable::Spacer(height) => {
                if self.cursor.open {
                    self.cursor.advance(height);
                    self.cursor.placed = true;
                }
                Ok(())
            }
            Flowable::ExplicitBreak => {
                self.ensure_open()?;
                debug!("explicit break after page {}", self.cursor.page);
                self.cursor.open = false;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn place_text(&mut self, kind: TextKind, text: &str) -> Result<()> {
        let config = self.config;
        let style = config.style_sheet.style_for(kind);
        let width = config.usable_width();
        let lines = wrap_text(&*self.canvas, text, style, width)?;

        self.ensure_open()?;
        let space_before = if self.cursor.at_top() {
            0.0
        } else {
            style.space_before
        };
        let needed = space_before + lines.len() as f64 * style.leading;
        if needed > self.cursor.remaining() + LAYOUT_EPSILON && !self.cursor.at_top() {
            debug!(
                "automatic break after page {}: {:.2}pt needed, {:.2}pt left",
                self.cursor.page,
                needed,
                self.cursor.remaining()
            );
            self.open_page()?;
        } else {
            self.cursor.advance(space_before);
        }

        if kind != TextKind::Body && !text.trim().is_empty() {
            self.canvas.add_outline_entry(text, self.cursor.page);
        }

        for line in lines {
            if self.cursor.y + style.leading > self.cursor.bottom + LAYOUT_EPSILON
                && !self.cursor.at_top()
            {
                self.open_page()?;
            }
            let x = self.line_x(&line, style)?;
            self.canvas.draw_text(x, self.cursor.y, &line, style)?;
            self.cursor.y += style.leading;
            self.cursor.placed = true;
            if let Some(page) = self.pages.last_mut() {
                page.push(line);
            }
        }

        self.cursor.advance(style.space_after);
        Ok(())
    }

    fn line_x(&self, line: &str, style: &BlockStyle) -> Result<f64> {
        let left = self.config.margins.left;
        let width = self.config.usable_width();
        let offset = match style.alignment {
            HorizontalAlignment::Left => 0.0,
            HorizontalAlignment::Center => (width - self.canvas.text_width(line, style)?) / 2.0,
            HorizontalAlignment::Right => width - self.canvas.text_width(line, style)?,
        };
        Ok(left + offset.max(0.0))
    }
}

/// Writes `bytes` to `path` in one step, removing the file again on failure.
pub(crate) fn write_artifact(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    match fs::write(path, bytes) {
        Ok(()) => Ok(path.to_path_buf()),
        Err(err) => {
            let _ = fs::remove_file(path);
            Err(RenderError::io(path, err))
        }
    }
}
