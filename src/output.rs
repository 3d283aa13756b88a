//! CLI output formatting.
//!
//! Display is information-centric: the primary identity of every entity is
//! its relative key, shown as an indented tree mirroring the outline the
//! document will get. Skips are listed after the inventory with their
//! reasons.
//!
//! Each view has a `format_*` function returning `Vec<String>` (pure, no
//! I/O, unit-testable) and a `print_*` wrapper that writes to stdout.

use crate::outline::Bookmark;
use crate::pipeline::ConvertSummary;
use crate::render::RenderEvent;
use crate::scan::{Payload, ScanResult, Skip};

/// Indentation: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{pos:0>3}")
}

// ============================================================================
// Scan inventory
// ============================================================================

/// ```text
/// Items
/// 001 ch1/p1
/// 002 ch1/p2
/// 003 docs/manual (PDF page 1)
///
/// Skipped
/// notes.txt: unsupported suffix: .txt
/// ```
pub fn format_scan_output(result: &ScanResult) -> Vec<String> {
    let mut lines = vec!["Items".to_string()];
    for (i, item) in result.items.iter().enumerate() {
        let detail = match item.payload {
            Payload::Image(_) => String::new(),
            Payload::PdfPage { page, .. } => format!(" (PDF page {page})"),
        };
        lines.push(format!("{} {}{}", format_index(i + 1), item.path, detail));
    }
    if result.items.is_empty() {
        lines.push("(none)".to_string());
    }
    lines.extend(format_skips(&result.skipped));
    lines
}

fn format_skips(skipped: &[Skip]) -> Vec<String> {
    if skipped.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![String::new(), "Skipped".to_string()];
    for skip in skipped {
        lines.push(format!("{}: {}", skip.path, skip.reason));
    }
    lines
}

pub fn print_scan_output(result: &ScanResult) {
    for line in format_scan_output(result) {
        println!("{line}");
    }
}

// ============================================================================
// Render progress
// ============================================================================

pub fn format_render_event(event: &RenderEvent) -> String {
    match event {
        RenderEvent::Rendered { path } => format!("  {path}"),
        RenderEvent::Skipped { path, reason } => format!("  {path}: skipped ({reason})"),
    }
}

// ============================================================================
// Conversion summary
// ============================================================================

/// ```text
/// Outline
/// ch1 → page 1
///     p1 → page 1
///     p2 → page 2
/// cover → page 3
///
/// Wrote 3 pages, skipped 0 inputs
/// ```
pub fn format_convert_summary(summary: &ConvertSummary) -> Vec<String> {
    let mut lines = Vec::new();
    if !summary.bookmarks.is_empty() {
        lines.push("Outline".to_string());
        format_bookmarks(&summary.bookmarks, 0, &mut lines);
        lines.push(String::new());
    }
    lines.push(format!(
        "Wrote {} pages, skipped {} inputs",
        summary.pages.len(),
        summary.skipped.len()
    ));
    lines
}

fn format_bookmarks(bookmarks: &[Bookmark], depth: usize, lines: &mut Vec<String>) {
    for bookmark in bookmarks {
        lines.push(format!(
            "{}{} → page {}",
            indent(depth),
            bookmark.title,
            bookmark.page + 1
        ));
        format_bookmarks(&bookmark.children, depth + 1, lines);
    }
}

pub fn print_convert_summary(summary: &ConvertSummary) {
    for line in format_convert_summary(summary) {
        println!("{line}");
    }
}
