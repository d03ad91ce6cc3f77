//! Page preview: render page 1 to a bitmap and extract its text
//!
//! Geometry and text come from lopdf; the pixels come from a [`PageRenderer`].
//! The production renderer is PDFium via `pdfium-render`, which needs the
//! native PDFium library at runtime.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use image::{DynamicImage, ImageFormat};
use pdfium_render::prelude::*;
use tracing::{debug, info};
use crate::error::{Error, Result};
use crate::layout::PageSize;
use super::document::{first_page, load_document, page_size};
use super::text::extract_page_text;

/// Environment variable naming a directory (or file) holding the PDFium library
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Output of rasterizing a document's first page
#[derive(Debug, Clone)]
pub struct PageRaster {
    /// Page 1 rendered at the rasterizer's scale
    pub bitmap: DynamicImage,
    /// Bitmap width: native width times scale
    pub width_px: u32,
    /// Bitmap height: native height times scale
    pub height_px: u32,
    /// Native page size in points
    pub page_size: PageSize,
    /// Text runs of page 1 joined with single spaces
    pub extracted_text: String,
}

impl PageRaster {
    /// Encode the bitmap as PNG
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut png = Vec::new();
        self.bitmap
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| Error::Render(format!("PNG encoding failed: {}", e)))?;
        Ok(png)
    }
}

/// Draws the first page of a PDF into a bitmap of exactly the requested size
pub trait PageRenderer: Send + Sync {
    fn render_first_page(&self, pdf_bytes: &[u8], width_px: u32, height_px: u32) -> Result<DynamicImage>;
}

/// [`PageRenderer`] backed by the PDFium library
#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    library_path: Option<PathBuf>,
}

impl PdfiumRenderer {
    /// Bind to the PDFium library installed on the system
    pub fn system() -> Self {
        Self { library_path: None }
    }

    /// Bind to the PDFium library in `path` (a directory or the library file itself)
    pub fn with_library_path(path: impl Into<PathBuf>) -> Self {
        Self { library_path: Some(path.into()) }
    }

    /// Use `PDFIUM_LIB_PATH` if set, else the system library
    pub fn from_env() -> Self {
        match std::env::var_os(PDFIUM_LIB_PATH_ENV) {
            Some(path) if !path.is_empty() => Self::with_library_path(PathBuf::from(path)),
            _ => Self::system(),
        }
    }

    fn bind(&self) -> Result<Pdfium> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(library_file(path)),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| Error::Render(format!("PDFium library unavailable: {}", e)))?;

        Ok(Pdfium::new(bindings))
    }

    /// Whether the PDFium library can be loaded
    pub fn is_available(&self) -> bool {
        self.bind().is_ok()
    }
}

fn library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(Pdfium::pdfium_platform_library_name())
    } else {
        path.to_path_buf()
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render_first_page(&self, pdf_bytes: &[u8], width_px: u32, height_px: u32) -> Result<DynamicImage> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_byte_slice(pdf_bytes, None)
            .map_err(|e| Error::DocumentParse(format!("PDFium could not open document: {}", e)))?;

        let page = document
            .pages()
            .get(0)
            .map_err(|e| Error::DocumentParse(format!("PDFium could not open page 1: {}", e)))?;

        let config = PdfRenderConfig::new()
            .set_target_width(width_px as i32)
            .set_target_height(height_px as i32);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| Error::Render(format!("rendering page 1 failed: {}", e)))?;

        Ok(bitmap.as_image())
    }
}

/// Renders page 1 of a document at a fixed scale and extracts its text
#[derive(Clone)]
pub struct PageRasterizer {
    renderer: Arc<dyn PageRenderer>,
    scale: f64,
}

impl PageRasterizer {
    /// Create a rasterizer; `scale` is pixels per PDF point (1.5 by default config)
    pub fn new(renderer: Arc<dyn PageRenderer>, scale: f64) -> Self {
        Self { renderer, scale }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Rasterize page 1 of `pdf_bytes`.
    ///
    /// Malformed or encrypted input, a zero-page document and an unreadable
    /// page all fail with [`Error::DocumentParse`]; no partial raster is
    /// returned. The bitmap size is the native page size times the scale,
    /// never fitted to a display container. `/Rotate` is ignored: a rotated
    /// page is rendered at its unrotated size, without swapping width and height.
    pub fn rasterize(&self, pdf_bytes: &[u8]) -> Result<PageRaster> {
        let doc = load_document(pdf_bytes)?;
        let page_id = first_page(&doc)
            .ok_or_else(|| Error::DocumentParse("document has no pages".to_string()))?;

        let size = page_size(&doc, page_id)?;
        let (width_px, height_px) = size.scaled_pixels(self.scale);
        if width_px == 0 || height_px == 0 {
            return Err(Error::DocumentParse(format!(
                "page 1 is too small to render ({} x {} pt)",
                size.width_pt, size.height_pt
            )));
        }
        debug!(
            "Page 1 is {} x {} pt, rendering at {} x {} px",
            size.width_pt, size.height_pt, width_px, height_px
        );

        let extracted_text = extract_page_text(&doc, page_id)?;
        let bitmap = self.renderer.render_first_page(pdf_bytes, width_px, height_px)?;

        info!(
            "Rasterized page 1 ({} x {} px, {} chars of text)",
            width_px,
            height_px,
            extracted_text.chars().count()
        );

        Ok(PageRaster {
            bitmap,
            width_px,
            height_px,
            page_size: size,
            extracted_text,
        })
    }
}
