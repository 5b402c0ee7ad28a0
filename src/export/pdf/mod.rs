//! PDF export.
//!
//! The cursor backend: every block becomes a sequence of font, color, draw
//! and advance calls against a [`Canvas`]. Page breaks inside chapters are
//! left entirely to the canvas.

mod canvas;
mod layout;
mod page;

use std::io::{Seek, Write};

use crate::book::Book;
use crate::error::Result;
use crate::markdown::{StyledRun, Token};
use crate::render::{Typography, WalkReport, walk_blocks};

use super::assemble::{DocumentBackend, assemble};
use super::cover::{CoverImage, resolve_cover};
use super::{ExportConfig, Exporter};

pub use canvas::{Canvas, FontFamily, PdfCanvas, TextAlign, TextOptions};
pub use page::PageRenderer;

/// Blank lines above the book title.
const TITLE_PAGE_TOP_LINES: f32 = 8.0;

/// Exporter for PDF documents.
#[derive(Debug, Clone, Default)]
pub struct PdfExporter {
    config: ExportConfig,
}

impl PdfExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ExportConfig) -> Self {
        self.config = config;
        self
    }
}

impl Exporter for PdfExporter {
    fn export<W: Write + Seek>(&self, book: &Book, writer: &mut W) -> Result<()> {
        let typography = &self.config.typography;
        let cover = resolve_cover(book, &self.config.upload_root);

        let mut canvas = PdfCanvas::new(&book.title, typography.page.clone(), typography.line_factor())?;
        let report = assemble(book, cover.as_ref(), &mut PdfBackend::new(&mut canvas, typography))?;
        log::debug!(
            "pdf: {} chapters on {} pages, {} dropped blocks",
            report.chapters,
            canvas.page_count(),
            report.block_errors
        );

        let bytes = canvas.finish()?;
        writer.write_all(&bytes)?;
        Ok(())
    }
}

/// [`DocumentBackend`] drawing onto a [`Canvas`].
struct PdfBackend<'a, C: Canvas + ?Sized> {
    canvas: &'a mut C,
    typography: &'a Typography,
}

impl<'a, C: Canvas + ?Sized> PdfBackend<'a, C> {
    fn new(canvas: &'a mut C, typography: &'a Typography) -> Self {
        Self { canvas, typography }
    }

    fn renderer(&mut self) -> PageRenderer<'_, C> {
        PageRenderer::new(self.canvas, self.typography)
    }

    fn centered_line(&mut self, run: StyledRun) -> Result<()> {
        self.canvas
            .write_runs(&[run], &TextOptions::aligned(TextAlign::Center))
    }
}

impl<C: Canvas + ?Sized> DocumentBackend for PdfBackend<'_, C> {
    fn cover_page(&mut self, cover: &CoverImage) -> Result<()> {
        let page = &self.typography.page;
        self.canvas.image(cover, page.cover_width, page.cover_height)?;
        self.canvas.add_page()
    }

    fn title_page(&mut self, book: &Book) -> Result<()> {
        let t = self.typography;
        let heading = FontFamily::from_name(&t.fonts.heading);

        self.renderer().body();
        self.canvas.move_down(TITLE_PAGE_TOP_LINES);

        self.canvas.set_font(heading, t.sizes.title);
        self.canvas.set_color(&t.colors.heading);
        self.centered_line(StyledRun::bold(book.title.as_str()))?;

        if let Some(subtitle) = book.display_subtitle() {
            self.canvas.move_down(0.5);
            self.canvas.set_font(heading, t.sizes.subtitle);
            self.canvas.set_color(&t.colors.muted);
            self.centered_line(StyledRun::plain(subtitle))?;
        }

        self.canvas.move_down(1.0);
        self.canvas
            .set_font(FontFamily::from_name(&t.fonts.body), t.sizes.author);
        self.canvas.set_color(&t.colors.text);
        self.centered_line(StyledRun::italic(format!("by {}", book.author)))?;

        self.canvas.move_down(0.5);
        self.canvas
            .rule(&t.colors.quote_border, 1.0, t.content_width() / 3.0)?;

        self.renderer().body();
        self.canvas.add_page()
    }

    fn page_break(&mut self) -> Result<()> {
        self.canvas.add_page()
    }

    fn chapter_title(&mut self, title: &str) -> Result<()> {
        let t = self.typography;
        self.canvas
            .set_font(FontFamily::from_name(&t.fonts.heading), t.sizes.chapter_title);
        self.canvas.set_color(&t.colors.heading);
        let result = self
            .canvas
            .write_runs(&[StyledRun::bold(title)], &TextOptions::aligned(TextAlign::Left));

        self.renderer().body();
        result?;
        let lines = t.spacing_lines(t.spacing.chapter_after);
        self.canvas.move_down(lines);
        Ok(())
    }

    fn chapter_body(&mut self, tokens: &[Token]) -> Result<WalkReport> {
        let mut renderer = self.renderer();
        renderer.body();
        Ok(walk_blocks(tokens, &mut renderer))
    }
}
