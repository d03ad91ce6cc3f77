//! Stampflow Library
//!
//! Place a text stamp (such as a reference number) onto the first page of a
//! PDF at a position chosen on a rendered preview. This library provides
//! functionality to:
//! - Render page 1 to a bitmap and extract its text
//! - Map a position given in page percentages to PDF points
//! - Draw the stamp into a copy of the document without touching other content
//! - Suggest the stamp text from the page text
//! - Track one open document so stale background results are discarded
//!
//! # Example
//!
//! ```no_run
//! use stampflow::pdf::stamp_pdf_file;
//! use stampflow::StampSpec;
//! use std::path::Path;
//!
//! let spec = StampSpec::new("PB 966753", 85.0, 5.0, 16.0, "#FF0000");
//! stamp_pdf_file(Path::new("invoice.pdf"), Path::new("stamped_invoice.pdf"), &spec)
//!     .expect("Failed to stamp PDF");
//! ```

pub mod color;
pub mod config;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod session;
pub mod stamp;
pub mod suggest;

// Re-export commonly used items
pub use color::RgbColor;
pub use config::{FontSizeRange, StampConfig};
pub use error::{Error, Result};
pub use layout::{PageSize, PdfPagePoint};
pub use session::{Generation, StampSession};
pub use stamp::StampSpec;
pub use suggest::{SuggestionClient, TextSuggestionAdapter};
