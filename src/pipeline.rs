//! End-to-end conversion: scan → render → outline → assemble.
//!
//! [`convert`] is the library entry point behind the `folio convert`
//! command. Per-file problems (unreadable, undecodable, unrenderable) are
//! collected into the summary and never abort the run; the only fatal
//! errors are an unusable input root and failing to write the output.

use crate::config::ConvertConfig;
use crate::outline::OutlineTree;
use crate::render::{self, RenderEvent};
use crate::scan::{self, Skip};
use crate::{assemble, output};
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Scan(#[from] scan::ScanError),
    #[error(transparent)]
    Assemble(#[from] assemble::AssembleError),
}

/// What a completed run produced.
#[derive(Debug)]
pub struct ConvertSummary {
    /// Pages written, in canonical order (their item paths).
    pub pages: Vec<String>,
    /// Inputs dropped during scan or render.
    pub skipped: Vec<Skip>,
    /// The bookmark tree attached to the document.
    pub bookmarks: Vec<crate::outline::Bookmark>,
}

/// Run the full pipeline over `input`, writing the document to `out`.
///
/// `events` receives one [`RenderEvent`] per item as workers finish, in
/// completion order — wire it to a printer thread for live progress.
pub fn convert(
    input: &Path,
    out: &Path,
    config: &ConvertConfig,
    events: Option<Sender<RenderEvent>>,
) -> Result<ConvertSummary, ConvertError> {
    let scan_result = scan::scan(input)?;
    let mut skipped = scan_result.skipped;

    // Structural pass runs off the canonical list before rendering; the
    // binding pass below needs the paths again after items move into the
    // renderer.
    let paths: Vec<String> = scan_result.items.iter().map(|i| i.path.clone()).collect();
    let mut tree = OutlineTree::from_paths(paths.iter().map(|p| p.as_str()));

    let rendered = render::render_pages(scan_result.items, config, events);
    skipped.extend(rendered.skipped);

    // Binding pass: sorted order, output position = position in the
    // surviving page list.
    for (position, page) in rendered.pages.iter().enumerate() {
        tree.bind(&page.path, position);
    }
    let bookmarks = tree.export();

    let pages: Vec<String> = rendered.pages.iter().map(|p| p.path.clone()).collect();
    assemble::assemble(
        rendered.pages,
        bookmarks.clone(),
        scan_result.sources,
        config,
        out,
    )?;

    Ok(ConvertSummary {
        pages,
        skipped,
        bookmarks,
    })
}

/// Spawn the printer pairing used by the CLI: a channel plus a thread
/// that prints each render event as it arrives.
pub fn spawn_printer() -> (Sender<RenderEvent>, std::thread::JoinHandle<()>) {
    let (tx, rx) = std::sync::mpsc::channel();
    let handle = std::thread::spawn(move || {
        for event in rx {
            println!("{}", output::format_render_event(&event));
        }
    });
    (tx, handle)
}
