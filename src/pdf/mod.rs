//! PDF manipulation module

pub mod compose;
pub mod document;
pub mod encoding;
pub mod raster;
pub mod text;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export commonly used items
pub use compose::{stamp_pdf, stamp_pdf_file, stamped_file_name};
pub use document::{first_page, inspect, load_document, page_size, DocumentInfo};
pub use raster::{PageRaster, PageRasterizer, PageRenderer, PdfiumRenderer};
pub use text::{extract_page_runs, extract_page_text};
