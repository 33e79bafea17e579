//! PDF outline (bookmark) injection built on top of `lopdf`.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use thiserror::Error;

/// A title or heading together with the 1-indexed page it starts on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineEntry {
    pub title: String,
    pub page: usize,
}

impl OutlineEntry {
    /// Creates a new outline entry.
    pub fn new(title: impl Into<String>, page: usize) -> Self {
        Self {
            title: title.into(),
            page,
        }
    }
}

/// Errors that can occur while embedding an outline into a rendered PDF.
#[derive(Debug, Error)]
pub enum BookmarkError {
    /// The PDF bytes could not be parsed or written by `lopdf`.
    #[error("failed to process PDF bytes: {0}")]
    Parse(#[from] lopdf::Error),
    /// A required catalog entry was missing from the document trailer.
    #[error("PDF catalog entry is missing")]
    MissingCatalog,
    /// The catalog object was not a dictionary.
    #[error("PDF catalog entry is not a dictionary")]
    InvalidCatalog,
    /// An entry referenced a page that does not exist.
    #[error("outline entry {title:?} refers to missing page {page}")]
    MissingPage { title: String, page: usize },
}

/// Adds a flat `/Outlines` tree pointing each entry at its page.
///
/// Returns the input unchanged when `entries` is empty.
pub fn apply_outline(pdf_bytes: &[u8], entries: &[OutlineEntry]) -> Result<Vec<u8>, BookmarkError> {
    if entries.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let mut document = Document::load_mem(pdf_bytes)?;
    let pages = document.get_pages();
    let mut items = collect_items(&mut document, entries, &pages)?;

    let outlines_id = document.new_object_id();
    link_items(outlines_id, &mut document, &mut items);
    insert_outlines_root(outlines_id, &mut document, &items)?;

    let mut buffer = Vec::new();
    document
        .save_to(&mut buffer)
        .map_err(|err| BookmarkError::Parse(err.into()))?;
    Ok(buffer)
}

struct OutlineItem {
    object_id: ObjectId,
    page_ref: ObjectId,
    title: String,
}

fn collect_items(
    document: &mut Document,
    entries: &[OutlineEntry],
    pages: &BTreeMap<u32, ObjectId>,
) -> Result<Vec<OutlineItem>, BookmarkError> {
    entries
        .iter()
        .map(|entry| {
            let page_ref = u32::try_from(entry.page)
                .ok()
                .and_then(|page| pages.get(&page).copied())
                .ok_or_else(|| BookmarkError::MissingPage {
                    title: entry.title.clone(),
                    page: entry.page,
                })?;
            Ok(OutlineItem {
                object_id: document.new_object_id(),
                page_ref,
                title: entry.title.clone(),
            })
        })
        .collect()
}

fn link_items(outlines_id: ObjectId, document: &mut Document, items: &mut [OutlineItem]) {
    for index in 0..items.len() {
        let mut dictionary = Dictionary::new();
        dictionary.set("Title", text_string(&items[index].title));
        dictionary.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(items[index].page_ref),
                Object::Name("Fit".into()),
            ]),
        );
        dictionary.set("Parent", Object::Reference(outlines_id));

        if index > 0 {
            dictionary.set("Prev", Object::Reference(items[index - 1].object_id));
        }
        if index + 1 < items.len() {
            dictionary.set("Next", Object::Reference(items[index + 1].object_id));
        }

        document
            .objects
            .insert(items[index].object_id, Object::Dictionary(dictionary));
    }
}

/// Encodes `text` as a PDF text string: ASCII stays a literal, anything else
/// becomes UTF-16BE with a byte order mark.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn insert_outlines_root(
    outlines_id: ObjectId,
    document: &mut Document,
    items: &[OutlineItem],
) -> Result<(), BookmarkError> {
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| BookmarkError::MissingCatalog)?;

    let mut dictionary = Dictionary::new();
    dictionary.set("Type", Object::Name("Outlines".into()));
    dictionary.set("Count", Object::Integer(items.len() as i64));
    if let Some(first) = items.first() {
        dictionary.set("First", Object::Reference(first.object_id));
    }
    if let Some(last) = items.last() {
        dictionary.set("Last", Object::Reference(last.object_id));
    }
    document
        .objects
        .insert(outlines_id, Object::Dictionary(dictionary));

    let catalog = document
        .objects
        .get_mut(&catalog_id)
        .ok_or(BookmarkError::MissingCatalog)?
        .as_dict_mut()
        .map_err(|_| BookmarkError::InvalidCatalog)?;
    catalog.set("Outlines", Object::Reference(outlines_id));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn empty_outline_leaves_bytes_untouched() {
        let bytes = b"%PDF-1.3 not parsed".to_vec();
        assert_eq!(apply_outline(&bytes, &[]).expect("no-op"), bytes);
    }

    fn two_page_pdf() -> Vec<u8> {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let kids = (0..2)
            .map(|_| {
                Object::Reference(document.add_object(lopdf::dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                }))
            })
            .collect::<Vec<_>>();
        document.objects.insert(
            pages_id,
            Object::Dictionary(lopdf::dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 2,
            }),
        );
        let catalog_id = document.add_object(lopdf::dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        document.save_to(&mut bytes).expect("save pdf");
        bytes
    }

    fn outline_titles(bytes: &[u8]) -> Vec<Vec<u8>> {
        let document = Document::load_mem(bytes).expect("load pdf");
        let catalog_id = document
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .expect("root");
        let outlines_id = document
            .get_object(catalog_id)
            .and_then(Object::as_dict)
            .and_then(|catalog| catalog.get(b"Outlines"))
            .and_then(Object::as_reference)
            .expect("outlines");
        let mut next = document
            .get_object(outlines_id)
            .and_then(Object::as_dict)
            .and_then(|outlines| outlines.get(b"First"))
            .and_then(Object::as_reference)
            .ok();

        let mut titles = Vec::new();
        while let Some(id) = next {
            let item = document
                .get_object(id)
                .and_then(Object::as_dict)
                .expect("outline item");
            titles.push(
                item.get(b"Title")
                    .and_then(Object::as_str)
                    .expect("title")
                    .to_vec(),
            );
            next = item.get(b"Next").and_then(Object::as_reference).ok();
        }
        titles
    }

    #[test]
    fn titles_are_written_as_pdf_text_strings() {
        let entries = [OutlineEntry::new("Intro", 1), OutlineEntry::new("บทที่", 2)];
        let bytes = apply_outline(&two_page_pdf(), &entries).expect("outline");

        let titles = outline_titles(&bytes);
        assert_eq!(titles.len(), 2);
        assert_eq!(titles[0], b"Intro");

        let thai = &titles[1];
        assert_eq!(&thai[..2], &[0xFE, 0xFF]);
        let units = thai[2..]
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect::<Vec<_>>();
        assert_eq!(String::from_utf16(&units).expect("utf-16"), "บทที่");
    }

    #[test]
    fn entries_past_the_last_page_are_rejected() {
        let err = apply_outline(&two_page_pdf(), &[OutlineEntry::new("Gone", 3)]).unwrap_err();
        assert!(matches!(err, BookmarkError::MissingPage { page: 3, .. }));
    }

    #[test]
    fn garbage_input_is_a_parse_error() {
        let err = apply_outline(b"not a pdf", &[OutlineEntry::new("Intro", 1)]).unwrap_err();
        assert!(matches!(err, BookmarkError::Parse(_)));
    }
}
