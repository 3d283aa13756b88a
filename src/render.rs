//! Page rendering.
//!
//! Stage 2 of the conversion pipeline. Turns each item from the scan into
//! page content ready for assembly:
//!
//! - **Image items** are JPEG-encoded at the configured quality and given a
//!   placement rectangle: scaled to fit the page box preserving aspect
//!   ratio, centered, upscaled proportionally when smaller than the page.
//! - **PDF-page items** pass through untouched — no re-encoding, the
//!   assembler copies the source objects directly.
//!
//! Items render in parallel with rayon. Each worker tags its output with
//! the item's index in the canonical list, and the fan-in sorts by that tag
//! to restore canonical order — worker completion order is unspecified and
//! must never leak into the output. An item whose render fails produces no
//! page; it is reported as a skip and the run continues.

use crate::config::ConvertConfig;
use crate::scan::{Item, Payload, Skip};
use image::codecs::jpeg::JpegEncoder;
use rayon::prelude::*;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("JPEG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// A rendered page plus the ordinal of the item it came from.
#[derive(Debug)]
pub struct Page {
    /// Index of the source item in the canonical (sorted) item list.
    pub index: usize,
    /// Relative key of the source item, kept for outline binding.
    pub path: String,
    pub content: PageContent,
}

#[derive(Debug)]
pub enum PageContent {
    /// JPEG bytes plus native pixel dimensions and the placement rectangle
    /// on the page, in points.
    Image {
        jpeg: Vec<u8>,
        width: u32,
        height: u32,
        rect: FitRect,
    },
    /// Passthrough reference into the scan's source documents.
    PdfPage { source: usize, page: u32 },
}

/// Placement rectangle in page coordinates (points, origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Progress events for the CLI printer thread.
#[derive(Debug)]
pub enum RenderEvent {
    Rendered { path: String },
    Skipped { path: String, reason: String },
}

/// Output of the render stage: pages restored to canonical order, plus
/// items that failed to render.
#[derive(Debug)]
pub struct RenderResult {
    pub pages: Vec<Page>,
    pub skipped: Vec<Skip>,
}

/// Compute where an image of `source` pixels lands on a `page`-point box.
///
/// Aspect-preserving scale to fit, centered both ways. Images smaller than
/// the page scale up; one dimension always matches the page exactly.
pub fn fit_rect(source: (u32, u32), page: (f64, f64)) -> FitRect {
    let (src_w, src_h) = (source.0 as f64, source.1 as f64);
    let (page_w, page_h) = page;

    let scale = (page_w / src_w).min(page_h / src_h);
    let width = src_w * scale;
    let height = src_h * scale;
    FitRect {
        x: (page_w - width) / 2.0,
        y: (page_h - height) / 2.0,
        width,
        height,
    }
}

/// Render every item into a page, in parallel, and reassemble in canonical
/// order. Consumes the items; image pixel buffers are dropped as soon as
/// their JPEG is encoded.
pub fn render_pages(
    items: Vec<Item>,
    config: &ConvertConfig,
    events: Option<Sender<RenderEvent>>,
) -> RenderResult {
    let outcomes: Vec<Result<Page, Skip>> = items
        .into_par_iter()
        .enumerate()
        .map(|(index, item)| {
            let outcome = render_item(index, item, config);
            if let Some(tx) = &events {
                // A dropped receiver just means nobody is listening.
                let _ = tx.send(match &outcome {
                    Ok(page) => RenderEvent::Rendered {
                        path: page.path.clone(),
                    },
                    Err(skip) => RenderEvent::Skipped {
                        path: skip.path.clone(),
                        reason: skip.reason.clone(),
                    },
                });
            }
            outcome
        })
        .collect();

    let mut pages = Vec::new();
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(page) => pages.push(page),
            Err(skip) => skipped.push(skip),
        }
    }

    // The single synchronization point: completion order was arbitrary,
    // the tagged index restores canonical order.
    pages.sort_by_key(|p| p.index);

    RenderResult { pages, skipped }
}

fn render_item(index: usize, item: Item, config: &ConvertConfig) -> Result<Page, Skip> {
    let path = item.path;
    match item.payload {
        Payload::Image(image) => match encode_jpeg(&image, config.jpeg_quality) {
            Ok(jpeg) => {
                let (width, height) = (image.width(), image.height());
                let rect = fit_rect(
                    (width, height),
                    (config.page_size.width, config.page_size.height),
                );
                Ok(Page {
                    index,
                    path,
                    content: PageContent::Image {
                        jpeg,
                        width,
                        height,
                        rect,
                    },
                })
            }
            Err(e) => Err(Skip {
                path,
                reason: e.to_string(),
            }),
        },
        Payload::PdfPage { source, page } => Ok(Page {
            index,
            path,
            content: PageContent::PdfPage { source, page },
        }),
    }
}

/// Encode to baseline JPEG at the run's fixed quality. Alpha is flattened
/// by the RGB conversion; JPEG has no transparency.
fn encode_jpeg(image: &image::DynamicImage, quality: u8) -> Result<Vec<u8>, RenderError> {
    let rgb = image.to_rgb8();
    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, quality);
    encoder.encode_image(&rgb)?;
    Ok(jpeg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageSize;
    use image::DynamicImage;

    // =========================================================================
    // fit_rect tests — pure math, no encoding
    // =========================================================================

    #[test]
    fn fit_landscape_image_on_portrait_page() {
        // 200x100 image on a 100x200 page: width-bound, scale 0.5
        let rect = fit_rect((200, 100), (100.0, 200.0));
        assert_eq!(rect.width, 100.0);
        assert_eq!(rect.height, 50.0);
        assert_eq!(rect.x, 0.0);
        assert_eq!(rect.y, 75.0);
    }

    #[test]
    fn fit_portrait_image_on_portrait_page() {
        // 100x400 on 100x200: height-bound, scale 0.5
        let rect = fit_rect((100, 400), (100.0, 200.0));
        assert_eq!(rect.width, 50.0);
        assert_eq!(rect.height, 200.0);
        assert_eq!(rect.x, 25.0);
        assert_eq!(rect.y, 0.0);
    }

    #[test]
    fn small_image_upscales_to_fill() {
        // 10x10 on 100x200: upscale x10, width-bound
        let rect = fit_rect((10, 10), (100.0, 200.0));
        assert_eq!(rect.width, 100.0);
        assert_eq!(rect.height, 100.0);
        assert_eq!(rect.x, 0.0);
        assert_eq!(rect.y, 50.0);
    }

    #[test]
    fn exact_fit_is_unscaled_and_uncentered() {
        let rect = fit_rect((100, 200), (100.0, 200.0));
        assert_eq!(
            rect,
            FitRect {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 200.0
            }
        );
    }

    // =========================================================================
    // render_pages tests
    // =========================================================================

    fn image_item(path: &str, w: u32, h: u32) -> Item {
        Item {
            path: path.to_string(),
            payload: Payload::Image(DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
                w,
                h,
                image::Rgb([10, 20, 30]),
            ))),
        }
    }

    fn pdf_item(path: &str, source: usize, page: u32) -> Item {
        Item {
            path: path.to_string(),
            payload: Payload::PdfPage { source, page },
        }
    }

    fn test_config() -> ConvertConfig {
        ConvertConfig {
            title: "Test".to_string(),
            page_size: PageSize {
                width: 100.0,
                height: 200.0,
            },
            jpeg_quality: 85,
        }
    }

    #[test]
    fn pages_come_back_in_item_order() {
        let items = vec![
            image_item("a", 4, 4),
            pdf_item("b", 0, 1),
            image_item("c", 4, 4),
        ];
        let result = render_pages(items, &test_config(), None);

        assert_eq!(result.pages.len(), 3);
        assert!(result.skipped.is_empty());
        let order: Vec<(usize, &str)> = result
            .pages
            .iter()
            .map(|p| (p.index, p.path.as_str()))
            .collect();
        assert_eq!(order, vec![(0, "a"), (1, "b"), (2, "c")]);
    }

    #[test]
    fn order_is_stable_over_many_items() {
        // Enough items that rayon actually splits the work.
        let items: Vec<Item> = (0..64)
            .map(|i| image_item(&format!("img{i:03}"), 2, 2))
            .collect();
        let result = render_pages(items, &test_config(), None);

        let indices: Vec<usize> = result.pages.iter().map(|p| p.index).collect();
        assert_eq!(indices, (0..64).collect::<Vec<_>>());
    }

    #[test]
    fn image_page_carries_jpeg_and_rect() {
        let result = render_pages(vec![image_item("a", 50, 100)], &test_config(), None);
        match &result.pages[0].content {
            PageContent::Image {
                jpeg,
                width,
                height,
                rect,
            } => {
                // JPEG SOI marker
                assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
                assert_eq!((*width, *height), (50, 100));
                assert_eq!(rect.width, 100.0);
                assert_eq!(rect.height, 200.0);
            }
            _ => panic!("expected image content"),
        }
    }

    #[test]
    fn pdf_pages_pass_through_untouched() {
        let result = render_pages(vec![pdf_item("doc/Page 2", 3, 2)], &test_config(), None);
        match result.pages[0].content {
            PageContent::PdfPage { source, page } => {
                assert_eq!(source, 3);
                assert_eq!(page, 2);
            }
            _ => panic!("expected passthrough content"),
        }
    }

    #[test]
    fn events_report_every_item() {
        let (tx, rx) = std::sync::mpsc::channel();
        let items = vec![image_item("a", 2, 2), image_item("b", 2, 2)];
        render_pages(items, &test_config(), Some(tx));

        let mut paths: Vec<String> = rx
            .iter()
            .map(|e| match e {
                RenderEvent::Rendered { path } => path,
                RenderEvent::Skipped { path, .. } => path,
            })
            .collect();
        paths.sort();
        assert_eq!(paths, vec!["a", "b"]);
    }
}
