//! # Folio
//!
//! Assemble a single, bookmarked PDF from a directory tree of images and
//! pre-existing PDFs. Your filesystem is the data source: the folder
//! hierarchy becomes the document's navigation outline, and files become
//! pages in path order.
//!
//! # Architecture: Four-Stage Pipeline
//!
//! ```text
//! 1. Scan      input/        →  sorted item list     (parallel walk + decode)
//! 2. Render    items         →  ordered page list    (parallel, reassembled)
//! 3. Outline   items + pages →  bookmark tree        (sequential two-pass)
//! 4. Assemble  pages + tree  →  output.pdf           (single fatal write)
//! ```
//!
//! The two parallel stages share one discipline: fan out over independent
//! units with rayon, tag every result with an index captured before
//! dispatch, and restore canonical order with a single sort at the fan-in.
//! Completion order is never observable downstream — re-running on the same
//! input produces the same page sequence regardless of scheduling.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1 — walks the input tree, decodes files concurrently, produces the canonical item list |
//! | [`render`] | Stage 2 — fits images to the page box and encodes JPEG page content in parallel |
//! | [`outline`] | Stage 3 — builds the bookmark tree from item paths and binds pages to nodes |
//! | [`assemble`] | Stage 4 — merges everything into one PDF with lopdf and attaches the outline |
//! | [`pipeline`] | `convert()` — runs all four stages end to end |
//! | [`config`] | Conversion options: title, page-size presets, JPEG quality |
//! | [`paths`] | Root-relative slash-path keys shared by sorting and the outline |
//! | [`output`] | CLI output formatting — inventories, progress events, summaries |
//!
//! # Design Decisions
//!
//! ## Ordering Is a Sort, Not a Protocol
//!
//! Discovery and rendering both run on rayon worker pools with no ordering
//! guarantees. Rather than coordinating workers, each stage ends with one
//! synchronization point: the scan sorts items by their relative path (plus
//! page number for multi-page sources), and the renderer sorts finished
//! pages by the item index each worker captured before starting. Everything
//! downstream sees one canonical order.
//!
//! ## Arena-Backed Outline Tree
//!
//! [`outline::OutlineTree`] stores nodes in a flat `Vec` and links them by
//! index. Parent references are plain indices — a lookup edge, not an
//! ownership edge — so the child→parent back-walk needed for first-child
//! propagation costs nothing and never fights the borrow checker with
//! `Rc<RefCell<..>>` cycles.
//!
//! ## Pure-Rust PDF Output (lopdf)
//!
//! Pages are written with [lopdf](https://docs.rs/lopdf): images become
//! `DCTDecode` XObjects placed by a four-operator content stream, and pages
//! from source PDFs are carried over object-for-object without re-encoding.
//! No poppler, no ghostscript — the binary is self-contained.

pub mod assemble;
pub mod config;
pub mod outline;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod render;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
