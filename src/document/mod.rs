//! Loaded documents: ordered sequences of decoded page rasters.
//!
//! Image files load as single pages via the `image` crate; PDFs are
//! rasterized page-by-page with pdftoppm (Poppler). A file that fails to
//! decode or convert aborts loading that file only.

mod loader;

pub use loader::{load_paths, LoadFailure};

use std::path::{Path, PathBuf};

use image::DynamicImage;
use thiserror::Error;

use crate::geometry::Rect;

/// Errors that can occur while loading documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Page rendering failed: {0}")]
    RenderFailed(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One decoded page: the raster plus where it came from.
#[derive(Debug, Clone)]
pub struct Page {
    source: PathBuf,
    /// 1-based page number within the originating file; None for plain
    /// image files.
    page_number: Option<u32>,
    image: DynamicImage,
}

impl Page {
    pub fn from_image(image: DynamicImage, source: PathBuf, page_number: Option<u32>) -> Self {
        Self {
            source,
            page_number,
            image,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn page_number(&self) -> Option<u32> {
        self.page_number
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Name for file lists and export rows, e.g. `invoice.pdf (page 3)`.
    pub fn display_name(&self) -> String {
        let name = self
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string());
        match self.page_number {
            Some(n) => format!("{} (page {})", name, n),
            None => name,
        }
    }

    /// Crop to a source-space rectangle, clamped so the result is never
    /// empty.
    pub fn crop(&self, rect: &Rect) -> DynamicImage {
        crop_clamped(&self.image, rect)
    }

    /// Downscaled copy for file-list previews, bounded to `max` on the
    /// longer side.
    pub fn thumbnail(&self, max: u32) -> DynamicImage {
        self.image.thumbnail(max, max)
    }
}

/// Crop an image to a rectangle, clamping the bounds so at least one pixel
/// remains in each dimension.
pub fn crop_clamped(image: &DynamicImage, rect: &Rect) -> DynamicImage {
    let w = image.width();
    let h = image.height();
    let x1 = (rect.x1.max(0.0) as u32).min(w.saturating_sub(1));
    let y1 = (rect.y1.max(0.0) as u32).min(h.saturating_sub(1));
    let x2 = (rect.x2.max(0.0) as u32).clamp(x1 + 1, w.max(x1 + 1));
    let y2 = (rect.y2.max(0.0) as u32).clamp(y1 + 1, h.max(y1 + 1));
    image.crop_imm(x1, y1, x2 - x1, y2 - y1)
}

/// An ordered sequence of loaded pages. The region editor consumes one
/// page at a time and is unaware of the rest.
#[derive(Debug, Default)]
pub struct Document {
    pages: Vec<Page>,
}

impl Document {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
