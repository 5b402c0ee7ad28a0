//! Export module for writing books to paginated formats.
//!
//! Provides the `Exporter` trait and format-specific implementations.
//!
//! # Architecture
//!
//! Every export runs the same [`assemble`] pass (cover page, title page,
//! one unit per chapter) against a [`DocumentBackend`]:
//! - [`DocxExporter`] builds a tree of styled paragraphs and packs it as
//!   WordprocessingML
//! - [`PdfExporter`] draws onto a paginating canvas
//!
//! Exporters use a builder pattern:
//! - `new()` creates an exporter with default configuration
//! - `with_config()` allows customization
//! - `export()` writes to any `Write + Seek` destination
//!
//! # Example
//!
//! ```no_run
//! use folio::Book;
//! use folio::export::{DocxExporter, Exporter};
//! use std::fs::File;
//!
//! let book: Book = serde_json::from_slice(&std::fs::read("book.json")?)?;
//! let mut file = File::create("book.docx")?;
//! DocxExporter::new().export(&book, &mut file)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;
use std::io::{Cursor, Seek, Write};
use std::path::PathBuf;
use std::str::FromStr;

use crate::book::Book;
use crate::error::{Error, Result};
use crate::render::Typography;

mod assemble;
mod cover;
mod docx;
mod pdf;

pub use assemble::{AssemblyReport, DocumentBackend, assemble};
pub use cover::{CoverImage, ImageKind, is_placeholder, resolve_cover};
pub use docx::{DocxExporter, FlowBuilder, RenderedBlock, build_blocks};
pub use pdf::{Canvas, FontFamily, PageRenderer, PdfCanvas, PdfExporter, TextAlign, TextOptions};

/// Trait for exporting books to specific formats.
///
/// Exporters hold their configuration, and the `export` method writes to
/// any `Write + Seek` destination.
pub trait Exporter {
    /// Export the book to the provided writer.
    ///
    /// The writer can be:
    /// - `std::fs::File` for disk output
    /// - `std::io::Cursor<Vec<u8>>` for in-memory output
    /// - Any other type implementing `Write + Seek`
    fn export<W: Write + Seek>(&self, book: &Book, writer: &mut W) -> Result<()>;
}

/// Settings shared by every exporter.
#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    pub typography: Typography,
    /// Directory cover image paths are resolved against.
    pub upload_root: PathBuf,
}

/// Target document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "doc" | "docx" => Ok(ExportFormat::Docx),
            other => Err(Error::Validation(format!("Unsupported export format: {other}"))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A finished export ready to hand to the caller.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Replace every character outside `[A-Za-z0-9]` with `_`.
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Download filename for a book title, e.g. `My_Book.docx`.
pub fn export_filename(title: &str, format: ExportFormat) -> String {
    format!("{}.{}", sanitize_filename(title), format.extension())
}

/// Render `book` in `format` into an in-memory artifact.
pub fn export_book(book: &Book, format: ExportFormat, config: &ExportConfig) -> Result<ExportArtifact> {
    let mut out = Cursor::new(Vec::new());
    match format {
        ExportFormat::Pdf => PdfExporter::new()
            .with_config(config.clone())
            .export(book, &mut out)?,
        ExportFormat::Docx => DocxExporter::new()
            .with_config(config.clone())
            .export(book, &mut out)?,
    }

    let bytes = out.into_inner();
    log::debug!("exported {:?} as {format} ({} bytes)", book.title, bytes.len());

    Ok(ExportArtifact {
        filename: export_filename(&book.title, format),
        content_type: format.content_type(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My Book: Part 2!"), "My_Book__Part_2_");
        assert_eq!(sanitize_filename("Caf\u{e9}"), "Caf_");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(
            export_filename("My Book: Part 2!", ExportFormat::Docx),
            "My_Book__Part_2_.docx"
        );
        assert_eq!(export_filename("a/b", ExportFormat::Pdf), "a_b.pdf");
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("pdf".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert_eq!("doc".parse::<ExportFormat>().unwrap(), ExportFormat::Docx);
        assert_eq!("DOCX".parse::<ExportFormat>().unwrap(), ExportFormat::Docx);
        assert!("epub".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_content_types() {
        assert_eq!(ExportFormat::Pdf.content_type(), "application/pdf");
        assert!(ExportFormat::Docx.content_type().contains("wordprocessingml"));
    }
}
