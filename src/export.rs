use std::fmt;

use crate::book::Book;
use crate::config::Config;
use crate::error::Result;
use crate::render::{Manuscript, docx, pdf};

/// Output format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A finished export, ready to be written to disk or sent as a download.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: String,
}

impl Artifact {
    /// Value for a `Content-Disposition` header
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.file_name)
    }

    pub fn content_length(&self) -> usize {
        self.bytes.len()
    }
}

/// Download name for a book: every character outside `[A-Za-z0-9]` becomes `_`.
pub fn attachment_file_name(title: &str, format: ExportFormat) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}.{}", stem, format.extension())
}

/// Convert every chapter of `book` and assemble it in `format`.
pub fn export_book(book: &Book, format: ExportFormat, config: &Config) -> Result<Artifact> {
    book.validate()?;

    let manuscript = Manuscript::from_book(book, &config.body_style());
    let bytes = match format {
        ExportFormat::Pdf => pdf::render_pdf(&manuscript, config)?,
        ExportFormat::Docx => docx::render_docx(&manuscript, config)?,
    };

    let skipped: usize = manuscript.chapters.iter().map(|c| c.skipped.len()).sum();
    tracing::info!(
        title = %book.title,
        %format,
        chapters = manuscript.chapters.len(),
        skipped,
        bytes = bytes.len(),
        "exported book"
    );

    Ok(Artifact {
        bytes,
        content_type: format.content_type(),
        file_name: attachment_file_name(&book.title, format),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Chapter;
    use crate::error::Error;

    #[test]
    fn file_name_is_sanitized() {
        assert_eq!(
            attachment_file_name("Rust: A Field Guide!", ExportFormat::Pdf),
            "Rust__A_Field_Guide_.pdf"
        );
        assert_eq!(attachment_file_name("Café", ExportFormat::Docx), "Caf_.docx");
    }

    #[test]
    fn docx_artifact() {
        let book = Book {
            title: "My Book".to_string(),
            author: "Me".to_string(),
            chapters: vec![Chapter {
                title: "One".to_string(),
                content: "Hello".to_string(),
                ..Chapter::default()
            }],
            ..Book::default()
        };
        let artifact = export_book(&book, ExportFormat::Docx, &Config::compiled_default()).unwrap();

        assert_eq!(
            artifact.content_type,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(artifact.file_name, "My_Book.docx");
        assert_eq!(
            artifact.content_disposition(),
            "attachment; filename=\"My_Book.docx\""
        );
        assert_eq!(artifact.content_length(), artifact.bytes.len());
        assert!(artifact.bytes.starts_with(b"PK"));
    }

    #[test]
    fn invalid_book_is_rejected() {
        let book = Book {
            title: "Untitled".to_string(),
            ..Book::default()
        };
        let result = export_book(&book, ExportFormat::Docx, &Config::compiled_default());
        assert!(matches!(result, Err(Error::InvalidBook(_))));
    }

    #[test]
    fn format_metadata() {
        assert_eq!(ExportFormat::Pdf.content_type(), "application/pdf");
        assert_eq!(ExportFormat::Docx.to_string(), "docx");
    }
}
