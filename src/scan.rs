//! Input discovery and decoding.
//!
//! Stage 1 of the conversion pipeline. Walks the input tree, decodes every
//! qualifying file concurrently, and produces the canonical item list that
//! all later stages consume.
//!
//! ## What Qualifies
//!
//! - Raster images with a decoder compiled in: `jpg`, `jpeg`, `png`, `tif`,
//!   `tiff`, `webp`. One file, one item.
//! - PDFs: one item per page. Page 1 keeps the file's own relative key;
//!   page *k* becomes `<key>/Page k`, a synthetic child of the first page
//!   in the outline.
//!
//! Hidden entries (dot-prefixed) and bundle-like directories (`.app` and
//! friends) are pruned from the walk. Anything else that fails — unknown
//! suffix, unreadable file, decode error — is recorded as a skip and the
//! run continues. Skips are data, not errors; the only error this module
//! returns is failing to read the root itself.
//!
//! ## Ordering
//!
//! Files are decoded in parallel with rayon; completion order is
//! unspecified and never observed. The single synchronization point is the
//! final sort: ascending by relative key (plain byte ordering), with pages
//! of the same source PDF kept consecutive in page order. That sorted list
//! is the canonical order for rendering, the outline, and the output
//! document.

use crate::paths;
use image::DynamicImage;
use lopdf::Document;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("input is not a directory: {0}")]
    NotADirectory(PathBuf),
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "webp"];

/// Directory suffixes treated as opaque packages and pruned from the walk.
const BUNDLE_EXTENSIONS: &[&str] = &["app", "bundle", "framework", "photoslibrary"];

/// One unit of content destined for exactly one output page.
#[derive(Debug)]
pub struct Item {
    /// Root-relative slash key: sort key, outline path, display name.
    pub path: String,
    pub payload: Payload,
}

#[derive(Debug)]
pub enum Payload {
    /// Decoded raster image, owns its pixel buffer.
    Image(DynamicImage),
    /// One page of a loaded source PDF. `source` indexes
    /// [`ScanResult::sources`]; the document stays alive there until
    /// assembly copies the page out.
    PdfPage { source: usize, page: u32 },
}

/// A file dropped from the run, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct Skip {
    pub path: String,
    pub reason: String,
}

/// Everything stage 1 produces: the canonical item list, the loaded source
/// documents backing passthrough pages, and the skip report.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Items sorted ascending by `path` (pages of one PDF consecutive).
    pub items: Vec<Item>,
    pub sources: Vec<Document>,
    pub skipped: Vec<Skip>,
}

/// Per-file decode result, before items are numbered into the global list.
enum Decoded {
    Image { key: String, image: DynamicImage },
    Pdf { key: String, doc: Document, pages: u32 },
    Skip(Skip),
}

pub fn scan(root: &Path) -> Result<ScanResult, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = Vec::new();
    let mut skipped: Vec<Skip> = Vec::new();

    let walker = WalkDir::new(root).into_iter().filter_entry(|e| {
        // The predicate sees the root too; the root is never pruned, even
        // when its own name is dot-prefixed.
        if e.depth() == 0 {
            return true;
        }
        let name = e.file_name().to_string_lossy();
        !is_hidden(&name) && !(e.file_type().is_dir() && is_bundle(&name))
    });
    for entry in walker {
        match entry {
            Ok(e) if e.file_type().is_file() => files.push(e.into_path()),
            Ok(_) => {}
            Err(e) => skipped.push(Skip {
                path: e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                reason: format!("unreadable: {e}"),
            }),
        }
    }

    // Fan out: one decode per file, no shared state. Rayon's collect keeps
    // input order, but nothing below depends on it — the canonical order
    // comes from the sort at the end.
    let decoded: Vec<Decoded> = files
        .par_iter()
        .map(|file| decode_file(root, file))
        .collect();

    // Fan in: number source documents, expand PDFs into per-page items.
    let mut result = ScanResult {
        skipped,
        ..Default::default()
    };
    let mut keyed: Vec<(String, u32, Item)> = Vec::new();
    for d in decoded {
        match d {
            Decoded::Image { key, image } => {
                keyed.push((
                    key.clone(),
                    0,
                    Item {
                        path: key,
                        payload: Payload::Image(image),
                    },
                ));
            }
            Decoded::Pdf { key, doc, pages } => {
                let source = result.sources.len();
                result.sources.push(doc);
                for page in 1..=pages {
                    keyed.push((
                        key.clone(),
                        page,
                        Item {
                            path: paths::page_key(&key, page),
                            payload: Payload::PdfPage { source, page },
                        },
                    ));
                }
            }
            Decoded::Skip(skip) => result.skipped.push(skip),
        }
    }

    // Canonical order: key ascending, then page number ascending. Sorting
    // on the numeric page (not the "Page N" string) keeps page 10 after
    // page 9.
    keyed.sort_by(|a, b| (a.0.as_str(), a.1).cmp(&(b.0.as_str(), b.1)));
    result.items = keyed.into_iter().map(|(_, _, item)| item).collect();

    Ok(result)
}

fn decode_file(root: &Path, file: &Path) -> Decoded {
    let display = file
        .strip_prefix(root)
        .unwrap_or(file)
        .display()
        .to_string();
    let skip = |reason: String| {
        Decoded::Skip(Skip {
            path: display.clone(),
            reason,
        })
    };

    let Some(key) = paths::relative_key(root, file) else {
        return skip("no usable file name".to_string());
    };
    let ext = file
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        match image::open(file) {
            Ok(image) => Decoded::Image { key, image },
            Err(e) => skip(format!("image decode failed: {e}")),
        }
    } else if ext == "pdf" {
        match Document::load(file) {
            Ok(doc) => {
                let pages = doc.get_pages().len() as u32;
                if pages == 0 {
                    skip("PDF has no pages".to_string())
                } else {
                    Decoded::Pdf { key, doc, pages }
                }
            }
            Err(e) => skip(format!("PDF load failed: {e}")),
        }
    } else {
        skip(format!("unsupported suffix: .{ext}"))
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn is_bundle(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| BUNDLE_EXTENSIONS.contains(&ext.as_str()))
}

/// Serializable inventory of a scan, for the `scan` command's manifest.
#[derive(Debug, Serialize)]
pub struct ScanManifest {
    pub items: Vec<ItemMeta>,
    pub skipped: Vec<Skip>,
}

#[derive(Debug, Serialize)]
pub struct ItemMeta {
    pub path: String,
    pub kind: &'static str,
}

impl ScanResult {
    pub fn manifest(&self) -> ScanManifest {
        ScanManifest {
            items: self
                .items
                .iter()
                .map(|item| ItemMeta {
                    path: item.path.clone(),
                    kind: match item.payload {
                        Payload::Image(_) => "image",
                        Payload::PdfPage { .. } => "pdf-page",
                    },
                })
                .collect(),
            skipped: self.skipped.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_png;
    use std::fs;
    use tempfile::TempDir;

    fn write_pdf(path: &Path, pages: usize) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, crate::test_helpers::blank_pdf(pages)).unwrap();
    }

    #[test]
    fn items_sorted_by_path() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("root/ch1/p1.png"), 2, 2);
        write_png(&tmp.path().join("root/cover.png"), 2, 2);
        write_png(&tmp.path().join("root/ch1/p2.png"), 2, 2);

        let result = scan(&tmp.path().join("root")).unwrap();
        let paths: Vec<&str> = result.items.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["ch1/p1", "ch1/p2", "cover"]);
    }

    #[test]
    fn unsupported_suffix_is_skipped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("a.png"), 2, 2);
        fs::write(tmp.path().join("notes.txt"), "not a page").unwrap();

        let result = scan(tmp.path()).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.skipped.len(), 1);
        assert!(result.skipped[0].reason.contains("unsupported suffix"));
    }

    #[test]
    fn undecodable_image_is_skipped() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("good.png"), 2, 2);
        fs::write(tmp.path().join("bad.png"), "this is not a png").unwrap();

        let result = scan(tmp.path()).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].path, "good");
        assert_eq!(result.skipped.len(), 1);
        assert!(result.skipped[0].reason.contains("decode failed"));
    }

    #[test]
    fn hidden_entries_excluded() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("visible.png"), 2, 2);
        write_png(&tmp.path().join(".hidden.png"), 2, 2);
        write_png(&tmp.path().join(".thumbnails/t.png"), 2, 2);

        let result = scan(tmp.path()).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].path, "visible");
    }

    #[test]
    fn bundle_directories_excluded() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("keep.png"), 2, 2);
        write_png(&tmp.path().join("Photos.app/icon.png"), 2, 2);

        let result = scan(tmp.path()).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].path, "keep");
    }

    #[test]
    fn pdf_expands_to_one_item_per_page() {
        let tmp = TempDir::new().unwrap();
        write_pdf(&tmp.path().join("docs/manual.pdf"), 3);

        let result = scan(tmp.path()).unwrap();
        let paths: Vec<&str> = result.items.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["docs/manual", "docs/manual/Page 2", "docs/manual/Page 3"]
        );
        assert_eq!(result.sources.len(), 1);
        for (i, item) in result.items.iter().enumerate() {
            match item.payload {
                Payload::PdfPage { source, page } => {
                    assert_eq!(source, 0);
                    assert_eq!(page, i as u32 + 1);
                }
                _ => panic!("expected pdf page"),
            }
        }
    }

    #[test]
    fn pdf_pages_stay_consecutive_past_page_ten() {
        let tmp = TempDir::new().unwrap();
        write_pdf(&tmp.path().join("manual.pdf"), 11);

        let result = scan(tmp.path()).unwrap();
        let paths: Vec<&str> = result.items.iter().map(|i| i.path.as_str()).collect();
        // Byte-sorting the "Page N" strings would put Page 10 before
        // Page 2; the numeric secondary key must not.
        assert_eq!(paths[0], "manual");
        assert_eq!(paths[1], "manual/Page 2");
        assert_eq!(paths[9], "manual/Page 10");
        assert_eq!(paths[10], "manual/Page 11");
    }

    #[test]
    fn pdf_interleaves_with_images_by_path() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("aaa.png"), 2, 2);
        write_pdf(&tmp.path().join("bbb.pdf"), 2);
        write_png(&tmp.path().join("ccc.png"), 2, 2);

        let result = scan(tmp.path()).unwrap();
        let paths: Vec<&str> = result.items.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["aaa", "bbb", "bbb/Page 2", "ccc"]);
    }

    #[test]
    fn missing_root_is_error() {
        let result = scan(Path::new("/no/such/dir"));
        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }

    #[test]
    fn manifest_reflects_items_and_skips() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("a.png"), 2, 2);
        fs::write(tmp.path().join("junk.dat"), "x").unwrap();

        let manifest = scan(tmp.path()).unwrap().manifest();
        assert_eq!(manifest.items.len(), 1);
        assert_eq!(manifest.items[0].kind, "image");
        assert_eq!(manifest.skipped.len(), 1);

        let json = serde_json::to_string(&manifest).unwrap();
        assert!(json.contains("\"path\":\"a\""));
    }
}
