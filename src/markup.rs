//! Line-oriented markup segmenter.
//!
//! The grammar is deliberately small.  Each line is trimmed and checked in
//! order, the first matching rule wins:
//!
//! - `---page---` flushes the paragraph buffer and yields [`Block::PageBreak`]
//! - `## text` flushes and yields [`Block::Heading`]
//! - `# text` flushes and yields [`Block::Title`]
//! - an empty line flushes the buffer
//! - any other line is appended to the paragraph buffer
//!
//! Buffered lines are yielded as one [`Block::ParagraphGroup`].  Flushing an
//! empty buffer yields nothing, so runs of blank lines never produce empty
//! groups.  Prefix detection is case-sensitive and there is no nesting.

use std::collections::VecDeque;
use std::str::Lines;

use crate::model::Block;

/// Line that forces a page break.
pub const PAGE_BREAK_MARKER: &str = "---page---";
const HEADING_PREFIX: &str = "## ";
const TITLE_PREFIX: &str = "# ";

/// Lazy iterator over the [`Block`]s of a markup text.
pub struct Segmenter<'a> {
    lines: Lines<'a>,
    buffer: Vec<String>,
    pending: VecDeque<Block>,
    finished: bool,
}

impl<'a> Segmenter<'a> {
    /// Creates a segmenter over `input`.
    pub fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines(),
            buffer: Vec::new(),
            pending: VecDeque::with_capacity(2),
            finished: false,
        }
    }

    fn flush_buffer(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let lines = std::mem::take(&mut self.buffer);
        self.pending.push_back(Block::ParagraphGroup(lines));
    }

    fn consume_line(&mut self, raw: &str) {
        let line = raw.trim();

        if line == PAGE_BREAK_MARKER {
            self.flush_buffer();
            self.pending.push_back(Block::PageBreak);
        } else if let Some(rest) = line.strip_prefix(HEADING_PREFIX) {
            self.flush_buffer();
            self.pending.push_back(Block::Heading(rest.trim().to_owned()));
        } else if let Some(rest) = line.strip_prefix(TITLE_PREFIX) {
            self.flush_buffer();
            self.pending.push_back(Block::Title(rest.trim().to_owned()));
        } else if line.is_empty() {
            self.flush_buffer();
        } else {
            self.buffer.push(line.to_owned());
        }
    }
}

impl Iterator for Segmenter<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        loop {
            if let Some(block) = self.pending.pop_front() {
                return Some(block);
            }
            if self.finished {
                return None;
            }
            match self.lines.next() {
                Some(line) => self.consume_line(line),
                None => {
                    self.finished = true;
                    self.flush_buffer();
                }
            }
        }
    }
}

impl std::iter::FusedIterator for Segmenter<'_> {}

/// Collects every block of `input` in order.
pub fn segment(input: &str) -> Vec<Block> {
    Segmenter::new(input).collect()
}
