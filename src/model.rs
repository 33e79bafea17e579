//! Data structures describing the logical content of an eBook.
//!
//! [`Block`] values are produced by the markup segmenter and describe what the
//! author wrote.  [`Flowable`] values are produced by the layout builder and
//! describe what the renderer places on a page.  Both keep the order of the
//! source text.  The style types in this module intentionally avoid referencing
//! the rendering backend so a [`StyleSheet`] can be built, compared and
//! deserialised without pulling in `genpdf`.

use serde::{Deserialize, Serialize};

/// Parsed unit of markup prior to styling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    /// A `# ` line.
    Title(String),
    /// A `## ` line.
    Heading(String),
    /// Consecutive plain lines, kept as separate lines.
    ParagraphGroup(Vec<String>),
    /// A `---page---` marker.
    PageBreak,
}

/// Marker that separates the lines of a [`Flowable::BodyParagraph`].
pub const LINE_BREAK: char = '\n';

/// Styled unit ready for pagination.
#[derive(Clone, Debug, PartialEq)]
pub enum Flowable {
    /// Text rendered with the title style.
    TitleBlock(String),
    /// Text rendered with the heading style.
    HeadingBlock(String),
    /// Body text; [`LINE_BREAK`] forces a new line.
    BodyParagraph(String),
    /// Vertical whitespace in points.
    Spacer(f64),
    /// Unconditional page break.
    ExplicitBreak,
}

impl Flowable {
    /// Returns the text kind and text for text-bearing flowables.
    pub fn text(&self) -> Option<(TextKind, &str)> {
        match self {
            Self::TitleBlock(text) => Some((TextKind::Title, text)),
            Self::HeadingBlock(text) => Some((TextKind::Heading, text)),
            Self::BodyParagraph(text) => Some((TextKind::Body, text)),
            Self::Spacer(_) | Self::ExplicitBreak => None,
        }
    }
}

/// The three text kinds the style sheet knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextKind {
    /// Cover and `# ` titles.
    Title,
    /// `## ` headings.
    Heading,
    /// Paragraphs and the cover attribution.
    Body,
}

/// Horizontal placement of each wrapped line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlignment {
    /// Left aligned content.
    #[default]
    Left,
    /// Center aligned content.
    Center,
    /// Right aligned content.
    Right,
}

/// Rendering attributes for one text kind.  All lengths are in points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockStyle {
    pub font_size: u8,
    pub leading: f64,
    pub bold: bool,
    pub alignment: HorizontalAlignment,
    pub space_before: f64,
    pub space_after: f64,
}

impl BlockStyle {
    /// Creates a left-aligned regular style without extra spacing.
    pub fn new(font_size: u8, leading: f64) -> Self {
        Self {
            font_size,
            leading,
            bold: false,
            alignment: HorizontalAlignment::Left,
            space_before: 0.0,
            space_after: 0.0,
        }
    }

    /// Sets the alignment and returns the updated style.
    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Sets the bold flag and returns the updated style.
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Sets the spacing above and below and returns the updated style.
    pub fn with_spacing(mut self, before: f64, after: f64) -> Self {
        self.space_before = before;
        self.space_after = after;
        self
    }
}

/// Fixed mapping from text kind to style plus the cover conventions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSheet {
    pub title: BlockStyle,
    pub heading: BlockStyle,
    pub body: BlockStyle,
    /// Line printed under the title on the cover page.
    pub attribution: String,
    pub cover_spacer: f64,
    pub title_spacer: f64,
    pub paragraph_spacer: f64,
}

impl StyleSheet {
    /// Returns the style for the given text kind.
    pub fn style_for(&self, kind: TextKind) -> &BlockStyle {
        match kind {
            TextKind::Title => &self.title,
            TextKind::Heading => &self.heading,
            TextKind::Body => &self.body,
        }
    }

    /// Largest leading of any text kind.
    pub fn max_leading(&self) -> f64 {
        self.title
            .leading
            .max(self.heading.leading)
            .max(self.body.leading)
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            title: BlockStyle::new(28, 34.0)
                .with_alignment(HorizontalAlignment::Center)
                .with_spacing(0.0, 20.0),
            heading: BlockStyle::new(18, 22.0).with_spacing(12.0, 6.0),
            body: BlockStyle::new(12, 18.0).with_spacing(6.0, 0.0),
            attribution: "Kasip Publishing © 2025".to_owned(),
            cover_spacer: 40.0,
            title_spacer: 12.0,
            paragraph_spacer: 8.0,
        }
    }
}

/// Language of the purchase.  It selects the mail wording and has no effect on
/// layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Language {
    #[default]
    #[serde(rename = "TH")]
    Th,
    #[serde(rename = "EN")]
    En,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Self::Th => "TH",
            Self::En => "EN",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TH" => Ok(Self::Th),
            "EN" => Ok(Self::En),
            other => Err(format!("unsupported language {:?}; expected TH or EN", other)),
        }
    }
}

impl TryFrom<String> for Language {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
