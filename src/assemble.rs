//! Final document assembly.
//!
//! Stage 4 of the conversion pipeline. Takes the canonical page list and
//! the exported bookmark tree and writes one PDF:
//!
//! - Source PDFs that contributed passthrough pages are merged in first:
//!   their object tables are renumbered past the target's id space and
//!   copied over wholesale, minus the old document-structure nodes
//!   (`Catalog`/`Pages`/`Outlines`). Page dictionaries are re-parented
//!   onto the new page tree and keep their own MediaBox.
//! - Image pages become a `DCTDecode` XObject (the JPEG bytes straight
//!   from the renderer) drawn by a four-operator content stream at the
//!   fit rectangle, on a fresh page sized to the configured page box.
//! - The bookmark tree becomes the `/Outlines` hierarchy, wrapped in a
//!   single root entry titled with the document title and pointing at
//!   page one. Every entry gets a `[page /Fit]` destination.
//!
//! Failing to persist the output is the pipeline's only fatal error.

use crate::config::ConvertConfig;
use crate::outline::Bookmark;
use crate::render::{FitRect, Page, PageContent};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("failed to write output: {0}")]
    Write(#[from] std::io::Error),
    #[error("PDF construction failed: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("nothing to assemble: no pages were produced")]
    NoPages,
    #[error("source page {page} missing from merged document")]
    MissingSourcePage { page: u32 },
}

/// Build the document and persist it to `out`.
pub fn assemble(
    pages: Vec<Page>,
    bookmarks: Vec<Bookmark>,
    sources: Vec<Document>,
    config: &ConvertConfig,
    out: &Path,
) -> Result<(), AssembleError> {
    let mut document = build_document(pages, bookmarks, sources, config)?;
    document.save(out)?;
    Ok(())
}

/// Build the output document in memory. Split from [`assemble`] so tests
/// can inspect the result without touching disk.
pub fn build_document(
    pages: Vec<Page>,
    bookmarks: Vec<Bookmark>,
    sources: Vec<Document>,
    config: &ConvertConfig,
) -> Result<Document, AssembleError> {
    if pages.is_empty() {
        return Err(AssembleError::NoPages);
    }

    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();

    // Merge every source that contributed at least one passthrough page.
    // Maps (source index, source page number) → renumbered page object id.
    let merged = merge_sources(&mut document, &pages, sources);

    let mut page_ids: Vec<ObjectId> = Vec::with_capacity(pages.len());
    for page in &pages {
        match &page.content {
            PageContent::Image {
                jpeg,
                width,
                height,
                rect,
            } => {
                let id = add_image_page(&mut document, pages_id, jpeg, *width, *height, rect, config);
                page_ids.push(id);
            }
            PageContent::PdfPage { source, page } => {
                let &id = merged
                    .get(&(*source, *page))
                    .ok_or(AssembleError::MissingSourcePage { page: *page })?;
                reparent_page(&mut document, id, pages_id);
                page_ids.push(id);
            }
        }
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    let pages_dict = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        ("Kids", Object::Array(kids)),
    ]);
    document
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    let outlines_id = write_outline(&mut document, &bookmarks, &page_ids, &config.title);

    let mut catalog = Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    if let Some(outlines_id) = outlines_id {
        catalog.set("Outlines", Object::Reference(outlines_id));
        catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));
    }
    let catalog_id = document.add_object(catalog);
    document.trailer.set("Root", Object::Reference(catalog_id));

    let info_id = document.add_object(Dictionary::from_iter([(
        "Title",
        Object::string_literal(config.title.clone()),
    )]));
    document.trailer.set("Info", Object::Reference(info_id));

    document.renumber_objects();
    document.compress();
    Ok(document)
}

/// Copy each referenced source document's objects into `document`,
/// renumbered past its current id space. Old Catalog/Pages/Outlines nodes
/// are dropped; page objects come along and are re-parented later.
fn merge_sources(
    document: &mut Document,
    pages: &[Page],
    sources: Vec<Document>,
) -> HashMap<(usize, u32), ObjectId> {
    let mut used: Vec<bool> = vec![false; sources.len()];
    for page in pages {
        if let PageContent::PdfPage { source, .. } = page.content {
            used[source] = true;
        }
    }

    let mut merged = HashMap::new();
    for (index, mut source) in sources.into_iter().enumerate() {
        if !used[index] {
            continue;
        }
        source.renumber_objects_with(document.max_id + 1);

        for (number, id) in source.get_pages() {
            merged.insert((index, number), id);
        }

        // Page dicts referencing the dropped Pages node are fixed up by
        // reparent_page once they join the new page tree.
        for (id, object) in std::mem::take(&mut source.objects) {
            match object.type_name().unwrap_or("") {
                "Catalog" | "Pages" | "Outlines" => {}
                _ => {
                    document.objects.insert(id, object);
                }
            }
        }
        document.max_id = document.max_id.max(source.max_id);
    }
    merged
}

/// Point a merged page dictionary's Parent at the new page tree.
fn reparent_page(document: &mut Document, page_id: ObjectId, pages_id: ObjectId) {
    if let Some(Object::Dictionary(dict)) = document.objects.get_mut(&page_id) {
        dict.set("Parent", Object::Reference(pages_id));
    }
}

/// Add one image page: XObject stream + placement content + page dict.
fn add_image_page(
    document: &mut Document,
    pages_id: ObjectId,
    jpeg: &[u8],
    width: u32,
    height: u32,
    rect: &FitRect,
    config: &ConvertConfig,
) -> ObjectId {
    let xobject_dict = Dictionary::from_iter([
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(width as i64)),
        ("Height", Object::Integer(height as i64)),
        ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(b"DCTDecode".to_vec())),
    ]);
    let xobject_id = document.add_object(Stream::new(xobject_dict, jpeg.to_vec()));

    // q / cm / Do / Q: scale the unit-square image onto the fit rectangle.
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    rect.width.into(),
                    0.into(),
                    0.into(),
                    rect.height.into(),
                    rect.x.into(),
                    rect.y.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = document.add_object(Stream::new(
        Dictionary::new(),
        content.encode().unwrap_or_default(),
    ));

    let resources = Dictionary::from_iter([(
        "XObject",
        Object::Dictionary(Dictionary::from_iter([(
            "Im0",
            Object::Reference(xobject_id),
        )])),
    )]);

    document.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        (
            "MediaBox",
            Object::Array(vec![
                0.into(),
                0.into(),
                config.page_size.width.into(),
                config.page_size.height.into(),
            ]),
        ),
        ("Contents", Object::Reference(content_id)),
        ("Resources", Object::Dictionary(resources)),
    ]))
}

/// Write the `/Outlines` tree: one root entry titled with the document
/// title targeting page one, the exported bookmarks beneath it.
fn write_outline(
    document: &mut Document,
    bookmarks: &[Bookmark],
    page_ids: &[ObjectId],
    title: &str,
) -> Option<ObjectId> {
    let first_page = *page_ids.first()?;

    let outlines_id = document.new_object_id();
    let root_entry_id = document.new_object_id();

    let mut root_entry = Dictionary::from_iter([
        ("Title", Object::string_literal(title)),
        ("Parent", Object::Reference(outlines_id)),
        (
            "Dest",
            Object::Array(vec![
                Object::Reference(first_page),
                Object::Name(b"Fit".to_vec()),
            ]),
        ),
    ]);

    let mut descendants = 0;
    if let Some((first, last, count)) =
        write_entries(document, bookmarks, root_entry_id, page_ids)
    {
        root_entry.set("First", Object::Reference(first));
        root_entry.set("Last", Object::Reference(last));
        root_entry.set("Count", Object::Integer(count));
        descendants = count;
    }
    document
        .objects
        .insert(root_entry_id, Object::Dictionary(root_entry));

    let outlines = Dictionary::from_iter([
        ("Type", Object::Name(b"Outlines".to_vec())),
        ("First", Object::Reference(root_entry_id)),
        ("Last", Object::Reference(root_entry_id)),
        ("Count", Object::Integer(1 + descendants)),
    ]);
    document
        .objects
        .insert(outlines_id, Object::Dictionary(outlines));
    Some(outlines_id)
}

/// Write one sibling run of outline entries. Returns (first, last, total
/// entries including descendants), or None for an empty run.
fn write_entries(
    document: &mut Document,
    entries: &[Bookmark],
    parent: ObjectId,
    page_ids: &[ObjectId],
) -> Option<(ObjectId, ObjectId, i64)> {
    if entries.is_empty() {
        return None;
    }

    let ids: Vec<ObjectId> = entries.iter().map(|_| document.new_object_id()).collect();
    let mut total = entries.len() as i64;

    for (i, entry) in entries.iter().enumerate() {
        let mut dict = Dictionary::from_iter([
            ("Title", Object::string_literal(entry.title.clone())),
            ("Parent", Object::Reference(parent)),
        ]);
        if let Some(&page_id) = page_ids.get(entry.page) {
            dict.set(
                "Dest",
                Object::Array(vec![
                    Object::Reference(page_id),
                    Object::Name(b"Fit".to_vec()),
                ]),
            );
        }
        if i > 0 {
            dict.set("Prev", Object::Reference(ids[i - 1]));
        }
        if i + 1 < ids.len() {
            dict.set("Next", Object::Reference(ids[i + 1]));
        }
        if let Some((first, last, count)) =
            write_entries(document, &entry.children, ids[i], page_ids)
        {
            dict.set("First", Object::Reference(first));
            dict.set("Last", Object::Reference(last));
            dict.set("Count", Object::Integer(count));
            total += count;
        }
        document.objects.insert(ids[i], Object::Dictionary(dict));
    }

    Some((ids[0], ids[entries.len() - 1], total))
}
