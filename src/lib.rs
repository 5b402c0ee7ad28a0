//! # folio
//!
//! Renders markdown-authored books to paginated PDF and DOCX from one shared
//! typography model.
//!
//! ## Features
//!
//! - Markdown chapters tokenized once and rendered by two backends
//! - DOCX: a flow of styled paragraphs packed as WordprocessingML
//! - PDF: cursor-driven drawing with automatic pagination
//! - Optional cover page, title page and one page-broken unit per chapter
//! - AI-assisted outlines and chapter drafts behind a pluggable generator
//!
//! ## Quick Start
//!
//! ```no_run
//! use folio::export::{ExportConfig, ExportFormat, export_book};
//! use folio::{Book, Chapter};
//!
//! let book = Book::new("b1", "u1", "My Book")
//!     .with_author("Author Name")
//!     .with_chapter(Chapter::new("Getting Started", "Some **bold** text."));
//!
//! let artifact = export_book(&book, ExportFormat::Docx, &ExportConfig::default())?;
//! std::fs::write(&artifact.filename, &artifact.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Ownership checks
//!
//! Requests go through [`ExportService`], which refuses books that do not
//! exist or belong to someone else before anything is rendered:
//!
//! ```
//! use folio::export::{ExportConfig, ExportFormat};
//! use folio::{Book, Error, ExportService, MemoryStore};
//!
//! let store = MemoryStore::with_books([Book::new("b1", "alice", "Mine")]);
//! let service = ExportService::new(store, ExportConfig::default());
//!
//! let err = service.export("b1", "bob", ExportFormat::Pdf).unwrap_err();
//! assert!(matches!(err, Error::Unauthorized(_)));
//! ```

pub mod ai;
pub mod book;
pub mod config;
pub mod error;
pub mod export;
pub mod markdown;
pub mod render;
pub mod service;
pub mod store;

#[cfg(feature = "web")]
pub mod web;

pub use book::{Book, BookStatus, Chapter};
pub use config::Config;
pub use error::{Error, Result};
pub use export::{ExportArtifact, ExportFormat, Exporter};
pub use service::ExportService;
pub use store::{BookStore, MemoryStore};
