//! Conversion options: document title, page size, JPEG quality.
//!
//! Page sizes are specified either as a named preset (`a4`, `letter`, ...)
//! or as explicit `WIDTHxHEIGHT` in PDF points (1 pt = 1/72 inch). Presets
//! are portrait; pass explicit dimensions for landscape.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PageSizeError {
    #[error("unknown page size preset: {name} (expected one of {presets})", name = .0, presets = preset_names())]
    UnknownPreset(String),
    #[error("invalid page dimensions: {0} (expected WIDTHxHEIGHT in points)")]
    InvalidDimensions(String),
}

/// Named presets, portrait orientation, in points.
const PRESETS: &[(&str, f64, f64)] = &[
    ("a3", 841.89, 1190.55),
    ("a4", 595.276, 841.89),
    ("a5", 419.53, 595.276),
    ("letter", 612.0, 792.0),
    ("legal", 612.0, 1008.0),
    ("tabloid", 792.0, 1224.0),
];

fn preset_names() -> String {
    PRESETS
        .iter()
        .map(|(name, _, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A page box in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width: 595.276,
        height: 841.89,
    };
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::A4
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for PageSize {
    type Err = PageSizeError;

    /// Parse a preset name (case-insensitive) or `WIDTHxHEIGHT` in points.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        if let Some(&(_, w, h)) = PRESETS.iter().find(|(name, _, _)| *name == lower) {
            return Ok(PageSize {
                width: w,
                height: h,
            });
        }
        if let Some((w, h)) = lower.split_once('x') {
            let width: f64 = w
                .trim()
                .parse()
                .map_err(|_| PageSizeError::InvalidDimensions(s.to_string()))?;
            let height: f64 = h
                .trim()
                .parse()
                .map_err(|_| PageSizeError::InvalidDimensions(s.to_string()))?;
            if width <= 0.0 || height <= 0.0 {
                return Err(PageSizeError::InvalidDimensions(s.to_string()));
            }
            return Ok(PageSize { width, height });
        }
        Err(PageSizeError::UnknownPreset(s.to_string()))
    }
}

/// Options for one conversion run.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Document title: Info dictionary entry and the root bookmark label.
    pub title: String,
    /// Page box applied to every image page. Passthrough PDF pages keep
    /// their source MediaBox.
    pub page_size: PageSize,
    /// JPEG quality for re-encoded image pages. Fixed per run.
    pub jpeg_quality: u8,
}

impl ConvertConfig {
    /// Default title: the input directory's base name.
    pub fn default_title(input: &Path) -> String {
        input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string())
    }
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            title: "Untitled".to_string(),
            page_size: PageSize::default(),
            jpeg_quality: 85,
        }
    }
}
