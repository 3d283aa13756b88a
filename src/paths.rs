//! Root-relative slash-path keys.
//!
//! Every discovered file is identified by one string: its path relative to
//! the input root, slash-delimited regardless of platform, with the file
//! extension stripped. That key does triple duty as the canonical sort key,
//! the outline path (one tree node per segment), and the display name in
//! CLI output.

use std::path::Path;

/// Compute the relative key for a file under `root`.
///
/// Returns `None` when `file` is not under `root` or has no printable name.
///
/// - `root/ch1/p1.png` → `"ch1/p1"`
/// - `root/cover.png` → `"cover"`
/// - `root/a/b.c/scan.pdf` → `"a/b.c/scan"` (only the last extension goes)
pub fn relative_key(root: &Path, file: &Path) -> Option<String> {
    let rel = file.strip_prefix(root).ok()?;
    let mut segments: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let last = segments.pop()?;
    let stem = Path::new(&last).file_stem()?.to_string_lossy().into_owned();
    segments.push(stem);
    Some(segments.join("/"))
}

/// Split a key into its path segments.
pub fn segments(key: &str) -> impl Iterator<Item = &str> {
    key.split('/').filter(|s| !s.is_empty())
}

/// Key for page `number` (1-based) of a multi-page source at `base`.
///
/// Page 1 keeps the source's own key; later pages become synthetic children
/// of the first page's outline node.
pub fn page_key(base: &str, number: u32) -> String {
    if number <= 1 {
        base.to_string()
    } else {
        format!("{base}/Page {number}")
    }
}
