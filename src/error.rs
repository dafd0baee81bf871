//! Error types for loading books and producing exports

use thiserror::Error;

/// Result type for export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading input or assembling an export
#[derive(Error, Debug)]
pub enum Error {
    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON input (book files, token streams, outline responses)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed TOML input (book files)
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration file could not be used
    #[error("Config error: {0}")]
    Config(String),

    /// Book record is missing required metadata
    #[error("Invalid book: {0}")]
    InvalidBook(String),

    /// Typst compilation error
    #[error("Typst compilation failed: {0}")]
    Typst(String),

    /// PDF serialization error
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    /// Error writing the DOCX ZIP package
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// LLM outline response could not be used
    #[error("Outline error: {0}")]
    Outline(String),
}
