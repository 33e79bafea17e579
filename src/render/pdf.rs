//! PDF canvas backed by `genpdf`'s low-level renderer.
//!
//! Only the page and text primitives of `genpdf` are used; wrapping and page
//! breaking are done by the paginator.  Glyph widths come from the loaded font
//! family so wrapped lines match what ends up in the PDF.

use std::path::{Path, PathBuf};

use genpdf::fonts::{FontCache, FontData, FontFamily};
use genpdf::render::Renderer as PdfRenderer;
use genpdf::style::Style;
use genpdf::{Mm, Position, Size};

use crate::config::{mm_to_pt, pt_to_mm, PageSize};
use crate::error::{RenderError, Result};
use crate::fonts;
use crate::model::BlockStyle;

use super::canvas::Canvas;
use super::write_artifact;

fn mm_from_pt(value: f64) -> Mm {
    Mm::from(printpdf::Mm(pt_to_mm(value)))
}

fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Canvas that produces a PDF document.
pub struct GenpdfCanvas {
    renderer: PdfRenderer,
    font_cache: FontCache,
    page_size: Size,
    pages: usize,
    #[cfg(feature = "bookmarks")]
    outline: Vec<crate::bookmarks::OutlineEntry>,
}

impl GenpdfCanvas {
    /// Creates a canvas using the default font family from [`fonts`].
    pub fn new(page_size: PageSize, title: &str) -> Result<Self> {
        let family = fonts::default_font_family()?;
        Self::with_font_family(page_size, title, family)
    }

    /// Creates a canvas using an explicit font family.
    pub fn with_font_family(
        page_size: PageSize,
        title: &str,
        family: FontFamily<FontData>,
    ) -> Result<Self> {
        let size = Size::new(mm_from_pt(page_size.width), mm_from_pt(page_size.height));
        let renderer = PdfRenderer::new(size, title)?;
        let mut font_cache = FontCache::new(family);
        font_cache.load_pdf_fonts(&renderer)?;

        Ok(Self {
            renderer,
            font_cache,
            page_size: size,
            pages: 0,
            #[cfg(feature = "bookmarks")]
            outline: Vec::new(),
        })
    }

    fn pdf_style(style: &BlockStyle) -> Style {
        let mut pdf_style = Style::new().with_font_size(style.font_size);
        if style.bold {
            pdf_style.set_bold();
        }
        pdf_style
    }
}

impl Canvas for GenpdfCanvas {
    fn start_page(&mut self) -> Result<()> {
        // The renderer is created with its first page already in place.
        if self.pages > 0 {
            self.renderer.add_page(self.page_size);
        }
        self.pages += 1;
        Ok(())
    }

    fn draw_text(&mut self, x: f64, y: f64, text: &str, style: &BlockStyle) -> Result<()> {
        let page = self
            .renderer
            .get_page(self.pages.saturating_sub(1))
            .ok_or_else(|| RenderError::measurement("no page has been started"))?;
        let area = page.first_layer().area();
        let printed = area.print_str(
            &self.font_cache,
            Position::new(mm_from_pt(x), mm_from_pt(y)),
            Self::pdf_style(style),
            text,
        )?;
        if !printed {
            return Err(RenderError::measurement(format!(
                "line {:?} does not fit on the page at y = {:.2}pt",
                text, y
            )));
        }
        Ok(())
    }

    fn text_width(&self, text: &str, style: &BlockStyle) -> Result<f64> {
        let width = Self::pdf_style(style).str_width(&self.font_cache, text);
        Ok(mm_to_pt(mm_to_f64(width)))
    }

    #[cfg(feature = "bookmarks")]
    fn add_outline_entry(&mut self, title: &str, page: usize) {
        self.outline
            .push(crate::bookmarks::OutlineEntry::new(title, page));
    }

    fn save(self, path: &Path) -> Result<PathBuf> {
        let mut bytes = Vec::new();
        self.renderer.write(&mut bytes)?;

        #[cfg(feature = "bookmarks")]
        let bytes = crate::bookmarks::apply_outline(&bytes, &self.outline)?;

        write_artifact(path, &bytes)
    }
}
