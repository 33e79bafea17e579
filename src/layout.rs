//! Conversion of parsed [`Block`]s into styled [`Flowable`]s.

use crate::model::{Block, Flowable, StyleSheet, LINE_BREAK};

/// Number of flowables in the cover section.
pub const COVER_LEN: usize = 4;

/// Builds the flowable sequence for an eBook.
///
/// The cover (title, attribution, spacer, page break) is always emitted first,
/// even when `blocks` is empty.  Every block then maps to one or two
/// flowables in input order.
pub fn layout<I>(blocks: I, title: &str, sheet: &StyleSheet) -> Vec<Flowable>
where
    I: IntoIterator<Item = Block>,
{
    let blocks = blocks.into_iter();
    let mut flowables = Vec::with_capacity(COVER_LEN + 2 * blocks.size_hint().0);

    flowables.push(Flowable::TitleBlock(title.to_owned()));
    flowables.push(Flowable::BodyParagraph(sheet.attribution.clone()));
    flowables.push(Flowable::Spacer(sheet.cover_spacer));
    flowables.push(Flowable::ExplicitBreak);

    for block in blocks {
        match block {
            Block::Title(text) => {
                flowables.push(Flowable::TitleBlock(text));
                flowables.push(Flowable::Spacer(sheet.title_spacer));
            }
            Block::Heading(text) => flowables.push(Flowable::HeadingBlock(text)),
            Block::ParagraphGroup(lines) => {
                let mut text = String::new();
                for (index, line) in lines.iter().enumerate() {
                    if index > 0 {
                        text.push(LINE_BREAK);
                    }
                    text.push_str(line);
                }
                flowables.push(Flowable::BodyParagraph(text));
                flowables.push(Flowable::Spacer(sheet.paragraph_spacer));
            }
            Block::PageBreak => flowables.push(Flowable::ExplicitBreak),
        }
    }

    flowables
}
