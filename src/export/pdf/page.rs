use crate::error::Result;
use crate::markdown::StyledRun;
use crate::render::{BlockSink, HeadingTier, ListMarker, Typography, twips_to_pt};

use super::canvas::{Canvas, FontFamily, TextAlign, TextOptions};

/// [`BlockSink`] drawing each block onto a [`Canvas`].
///
/// Every block leaves the canvas in body font, size and color, so blocks can
/// be drawn in any order.
pub struct PageRenderer<'a, C: Canvas + ?Sized> {
    canvas: &'a mut C,
    typography: &'a Typography,
}

impl<'a, C: Canvas + ?Sized> PageRenderer<'a, C> {
    pub fn new(canvas: &'a mut C, typography: &'a Typography) -> Self {
        Self { canvas, typography }
    }

    /// Switch to the body font and text color.
    pub fn body(&mut self) {
        let t = self.typography;
        self.canvas.set_font(FontFamily::from_name(&t.fonts.body), t.sizes.body);
        self.canvas.set_color(&t.colors.text);
    }

    fn space(&mut self, twips: u32) {
        let lines = self.typography.spacing_lines(twips);
        self.canvas.move_down(lines);
    }
}

impl<C: Canvas + ?Sized> BlockSink for PageRenderer<'_, C> {
    fn heading(&mut self, tier: HeadingTier, runs: &[StyledRun]) -> Result<()> {
        let t = self.typography;
        self.space(t.spacing.heading_before);
        self.canvas
            .set_font(FontFamily::from_name(&t.fonts.heading), t.heading_size(tier));
        self.canvas.set_color(&t.colors.heading);

        let bold: Vec<StyledRun> = runs
            .iter()
            .map(|run| StyledRun {
                bold: true,
                ..run.clone()
            })
            .collect();
        let result = self.canvas.write_runs(&bold, &TextOptions::aligned(TextAlign::Left));

        self.body();
        result?;
        self.space(t.spacing.heading_after);
        Ok(())
    }

    fn paragraph(&mut self, runs: &[StyledRun], in_list: bool) -> Result<()> {
        let t = self.typography;
        let options = TextOptions {
            align: TextAlign::Justify,
            indent: if in_list { twips_to_pt(t.list_indent) } else { 0.0 },
            prefix: None,
        };
        self.canvas.write_runs(runs, &options)?;
        self.space(if in_list { t.spacing.list_item } else { t.spacing.paragraph_after });
        Ok(())
    }

    fn list_item(&mut self, marker: ListMarker, depth: usize, runs: &[StyledRun]) -> Result<()> {
        let t = self.typography;
        let options = TextOptions {
            align: TextAlign::Left,
            indent: twips_to_pt(t.list_indent_at(depth)),
            prefix: Some(marker.label(&t.bullet)),
        };
        self.canvas.write_runs(runs, &options)?;
        self.space(t.spacing.list_item);
        Ok(())
    }

    fn list_end(&mut self) -> Result<()> {
        self.space(self.typography.spacing.list_end);
        Ok(())
    }

    fn blockquote(&mut self, text: &str) -> Result<()> {
        let t = self.typography;
        self.canvas.set_color(&t.colors.quote);
        let options = TextOptions {
            align: TextAlign::Justify,
            indent: twips_to_pt(t.list_indent),
            prefix: None,
        };
        let result = self.canvas.write_runs(&[StyledRun::italic(text)], &options);
        self.body();
        result?;
        self.space(t.spacing.block);
        Ok(())
    }

    fn code_block(&mut self, text: &str) -> Result<()> {
        let t = self.typography;
        self.canvas.set_font(FontFamily::Mono, t.sizes.code);
        self.canvas.set_color(&t.colors.code);
        let result = self.canvas.write_preformatted(text, twips_to_pt(t.nested_indent));
        self.body();
        result?;
        self.space(t.spacing.block);
        Ok(())
    }

    fn rule(&mut self) -> Result<()> {
        let t = self.typography;
        self.canvas.rule(&t.colors.rule, 0.5, 0.0)?;
        self.space(t.spacing.block);
        Ok(())
    }
}
