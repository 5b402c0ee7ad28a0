//! Request-level export entry point.

use crate::error::Result;
use crate::export::{ExportArtifact, ExportConfig, ExportFormat, export_book};
use crate::store::{BookStore, find_owned_book};

/// Looks books up and renders them for their owners.
///
/// Holds no per-export state; concurrent calls are independent.
#[derive(Debug)]
pub struct ExportService<S: BookStore> {
    store: S,
    config: ExportConfig,
}

impl<S: BookStore> ExportService<S> {
    pub fn new(store: S, config: ExportConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export `book_id` for `requester`. Fails with `NotFound` or
    /// `Unauthorized` before any rendering happens.
    pub fn export(&self, book_id: &str, requester: &str, format: ExportFormat) -> Result<ExportArtifact> {
        let book = find_owned_book(&self.store, book_id, requester)?;
        log::info!(
            "exporting {:?} ({} chapters) as {format} for {requester}",
            book.title,
            book.chapters.len()
        );
        export_book(&book, format, &self.config)
    }
}
