//! The drawing capability the paginator renders through.

use std::path::{Path, PathBuf};

use unicode_segmentation::UnicodeSegmentation;

use crate::error::{RenderError, Result};
use crate::model::{BlockStyle, LINE_BREAK};

const WIDTH_TOLERANCE: f64 = 1e-6;

/// Narrow drawing surface a document backend has to provide.
///
/// Coordinates are in points, measured from the top-left corner of the
/// current page with `y` growing downwards.  `y` is the top of the text line.
pub trait Canvas {
    /// Opens a new page.  Drawing calls target the most recently started page.
    fn start_page(&mut self) -> Result<()>;

    /// Draws a single line of text at the given position.
    fn draw_text(&mut self, x: f64, y: f64, text: &str, style: &BlockStyle) -> Result<()>;

    /// Returns the advance width of `text` in points.
    fn text_width(&self, text: &str, style: &BlockStyle) -> Result<f64>;

    /// Records that a title or heading starts on the 1-indexed `page`.
    fn add_outline_entry(&mut self, _title: &str, _page: usize) {}

    /// Serialises every page to `path` and returns the written path.
    fn save(self, path: &Path) -> Result<PathBuf>
    where
        Self: Sized;
}

/// Breaks `text` into lines no wider than `width`.
///
/// [`LINE_BREAK`] always starts a new line.  Lines are filled greedily with
/// whole words; a word wider than `width` on its own is split between
/// grapheme clusters, so combining marks stay on their base character.
/// Thai runs without spaces take this path.
pub fn wrap_text<C>(canvas: &C, text: &str, style: &BlockStyle, width: f64) -> Result<Vec<String>>
where
    C: Canvas + ?Sized,
{
    if width <= 0.0 {
        return Err(RenderError::measurement(format!(
            "usable width {:.2}pt is not positive",
            width
        )));
    }

    let mut lines = Vec::new();
    for hard_line in text.split(LINE_BREAK) {
        let mut current = String::new();
        for word in hard_line.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_owned()
            } else {
                format!("{} {}", current, word)
            };
            if fits(canvas, &candidate, style, width)? {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if fits(canvas, word, style, width)? {
                current = word.to_owned();
            } else {
                let mut pieces = split_word(canvas, word, style, width)?;
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    Ok(lines)
}

fn fits<C>(canvas: &C, text: &str, style: &BlockStyle, width: f64) -> Result<bool>
where
    C: Canvas + ?Sized,
{
    Ok(canvas.text_width(text, style)? <= width + WIDTH_TOLERANCE)
}

fn split_word<C>(canvas: &C, word: &str, style: &BlockStyle, width: f64) -> Result<Vec<String>>
where
    C: Canvas + ?Sized,
{
    let mut pieces = Vec::new();
    let mut piece = String::new();

    for cluster in word.graphemes(true) {
        let candidate = format!("{}{}", piece, cluster);
        if fits(canvas, &candidate, style, width)? {
            piece = candidate;
            continue;
        }
        if piece.is_empty() || !fits(canvas, cluster, style, width)? {
            return Err(RenderError::measurement(format!(
                "character {:?} at {}pt does not fit into {:.2}pt",
                cluster, style.font_size, width
            )));
        }
        pieces.push(std::mem::replace(&mut piece, cluster.to_owned()));
    }

    if !piece.is_empty() {
        pieces.push(piece);
    }
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::transcript::TranscriptCanvas;
    use crate::config::PageSize;

    fn canvas() -> TranscriptCanvas {
        TranscriptCanvas::new(PageSize::A4)
    }

    // 10pt font advances 5pt per character on the transcript canvas.
    fn style() -> BlockStyle {
        BlockStyle::new(10, 12.0)
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let lines = wrap_text(&canvas(), "aaaa bbbb cccc", &style(), 50.0).expect("wrap");
        assert_eq!(lines, vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn hard_breaks_are_kept() {
        let lines = wrap_text(&canvas(), "one\ntwo", &style(), 500.0).expect("wrap");
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn long_words_are_split() {
        let lines = wrap_text(&canvas(), "abcdefghij", &style(), 20.0).expect("wrap");
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn empty_text_has_no_lines() {
        assert!(wrap_text(&canvas(), "", &style(), 100.0)
            .expect("wrap")
            .is_empty());
    }

    #[test]
    fn zero_width_is_a_measurement_failure() {
        let err = wrap_text(&canvas(), "text", &style(), 0.0).unwrap_err();
        assert!(matches!(err, RenderError::Measurement(_)));
    }

    #[test]
    fn glyph_wider_than_width_is_a_measurement_failure() {
        let err = wrap_text(&canvas(), "x", &style(), 2.0).unwrap_err();
        assert!(matches!(err, RenderError::Measurement(_)));
    }

    #[test]
    fn thai_runs_split_between_clusters() {
        // Seven clusters; the vowel and tone marks sit on the consonant before them.
        let lines = wrap_text(&canvas(), "สวัสดีครับ", &style(), 10.0).expect("wrap");
        assert_eq!(lines, vec!["สวั", "สดี", "ครั", "บ"]);
        let starts_with_mark = |line: &String| {
            matches!(
                line.chars().next(),
                Some('\u{e31}' | '\u{e34}'..='\u{e3a}' | '\u{e47}'..='\u{e4e}')
            )
        };
        assert!(!lines.iter().any(starts_with_mark));
        assert_eq!(lines.concat(), "สวัสดีครับ");
    }
}
