//! In-memory canvas that serialises a plain-text transcript of each page.
//!
//! Glyph metrics are synthetic (every grapheme cluster advances half the font
//! size, so combining marks take no room), which makes layouts reproducible
//! without any font files.  The backend is used for dry runs and throughout
//! the test suite.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use unicode_segmentation::UnicodeSegmentation;

use crate::config::PageSize;
use crate::error::Result;
use crate::model::BlockStyle;

use super::canvas::Canvas;
use super::write_artifact;

const GLYPH_ADVANCE_EM: f64 = 0.5;

/// A line of text as it was drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawnText {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub font_size: u8,
}

/// Canvas backend recording drawn text per page.
#[derive(Clone, Debug)]
pub struct TranscriptCanvas {
    page_size: PageSize,
    pages: Vec<Vec<DrawnText>>,
    outline: Vec<(String, usize)>,
}

impl TranscriptCanvas {
    /// Creates an empty transcript for pages of `page_size`.
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
            outline: Vec::new(),
        }
    }

    /// Returns the drawn text of every started page.
    pub fn pages(&self) -> &[Vec<DrawnText>] {
        &self.pages
    }

    /// Returns the recorded outline entries as `(title, page)` pairs.
    pub fn outline(&self) -> &[(String, usize)] {
        &self.outline
    }

    /// Renders the transcript as text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "transcript {:.2}x{:.2}pt, {} page(s)",
            self.page_size.width,
            self.page_size.height,
            self.pages.len()
        );
        for (index, page) in self.pages.iter().enumerate() {
            let _ = writeln!(out, "--- page {} ---", index + 1);
            for drawn in page {
                let _ = writeln!(out, "{}", drawn.text);
            }
        }
        if !self.outline.is_empty() {
            let _ = writeln!(out, "--- outline ---");
            for (title, page) in &self.outline {
                let _ = writeln!(out, "{} -> {}", title, page);
            }
        }
        out
    }
}

impl Canvas for TranscriptCanvas {
    fn start_page(&mut self) -> Result<()> {
        self.pages.push(Vec::new());
        Ok(())
    }

    fn draw_text(&mut self, x: f64, y: f64, text: &str, style: &BlockStyle) -> Result<()> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        if let Some(page) = self.pages.last_mut() {
            page.push(DrawnText {
                x,
                y,
                text: text.to_owned(),
                font_size: style.font_size,
            });
        }
        Ok(())
    }

    fn text_width(&self, text: &str, style: &BlockStyle) -> Result<f64> {
        Ok(text.graphemes(true).count() as f64 * f64::from(style.font_size) * GLYPH_ADVANCE_EM)
    }

    fn add_outline_entry(&mut self, title: &str, page: usize) {
        self.outline.push((title.to_owned(), page));
    }

    fn save(self, path: &Path) -> Result<PathBuf> {
        write_artifact(path, self.to_text().as_bytes())
    }
}
