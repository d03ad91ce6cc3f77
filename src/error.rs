//! Error types for the stampflow library

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the stampflow library
#[derive(Error, Debug)]
pub enum Error {
    /// Input bytes are not a readable PDF (malformed, encrypted, no pages to render)
    #[error("Could not read PDF document: {0}")]
    DocumentParse(String),

    /// The document has no page to stamp
    #[error("PDF has no pages to stamp")]
    NoPage,

    /// Color string is not of the form #RRGGBB
    #[error("Invalid color {0:?}: expected #RRGGBB")]
    InvalidColor(String),

    /// PDF processing error while writing the stamped document
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The preview renderer failed
    #[error("Render error: {0}")]
    Render(String),

    /// The suggestion client failed (never leaves the suggestion adapter)
    #[error("Suggestion error: {0}")]
    Suggestion(String),

    /// A newer document replaced the one this operation started with
    #[error("Document generation {started} was replaced by generation {current}")]
    StaleDocument {
        /// Generation captured when the operation started
        started: u64,
        /// Generation current when the operation finished
        current: u64,
    },

    /// General error
    #[error("{0}")]
    General(String),
}
