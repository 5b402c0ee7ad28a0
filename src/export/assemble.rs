//! Document assembly shared by every export format.
//!
//! The order is fixed: optional cover page, title page, then one unit per
//! chapter. A page break precedes every chapter except the first (the title
//! page ends its own page). A cover or chapter that fails is logged and
//! left out; only a failing title page aborts the export.

use crate::book::{Book, Chapter};
use crate::error::Result;
use crate::markdown::{Token, tokenize};
use crate::render::WalkReport;

use super::cover::CoverImage;

/// Output side of [`assemble`], implemented once per format.
pub trait DocumentBackend {
    /// Full-page cover image followed by a page break.
    fn cover_page(&mut self, cover: &CoverImage) -> Result<()>;

    /// Title, subtitle, byline and decorative rule, ending the page.
    fn title_page(&mut self, book: &Book) -> Result<()>;

    fn page_break(&mut self) -> Result<()>;

    fn chapter_title(&mut self, title: &str) -> Result<()>;

    /// Render one chapter's markdown body.
    fn chapter_body(&mut self, tokens: &[Token]) -> Result<WalkReport>;
}

/// What [`assemble`] produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    pub cover_page: bool,
    pub chapters: usize,
    /// Indices of chapters that failed part way and were left incomplete.
    pub failed_chapters: Vec<usize>,
    /// Blocks dropped inside otherwise rendered chapters.
    pub block_errors: usize,
}

/// Drive `backend` through the whole book.
pub fn assemble<B: DocumentBackend + ?Sized>(
    book: &Book,
    cover: Option<&CoverImage>,
    backend: &mut B,
) -> Result<AssemblyReport> {
    let mut report = AssemblyReport::default();

    if let Some(cover) = cover {
        match backend.cover_page(cover) {
            Ok(()) => report.cover_page = true,
            Err(e) => log::warn!("skipping cover page {}: {e}", cover.path.display()),
        }
    }

    backend.title_page(book)?;

    for (index, chapter) in book.chapters.iter().enumerate() {
        match assemble_chapter(backend, index, chapter) {
            Ok(walk) => report.block_errors += walk.errors,
            Err(e) => {
                log::warn!("skipping chapter {index} ({:?}): {e}", chapter.title);
                report.failed_chapters.push(index);
            }
        }
        report.chapters += 1;
        log::debug!("assembled chapter {index}: {:?}", chapter.title);
    }

    Ok(report)
}

fn assemble_chapter<B: DocumentBackend + ?Sized>(
    backend: &mut B,
    index: usize,
    chapter: &Chapter,
) -> Result<WalkReport> {
    if index > 0 {
        backend.page_break()?;
    }
    backend.chapter_title(&chapter.title)?;
    backend.chapter_body(&tokenize(&chapter.content))
}
