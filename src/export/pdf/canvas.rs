//! Drawing surface with a vertical cursor.
//!
//! The [`Canvas`] trait is what the page renderer talks to. [`PdfCanvas`]
//! implements it on top of printpdf with the standard 14 fonts. It owns all
//! pagination: a line that would cross the bottom margin starts a new page,
//! and an explicit [`Canvas::add_page`] takes effect on the next draw. A
//! page break on a page with nothing on it is a no-op, so a document never
//! contains or ends on a blank page.

use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line as PdfLine, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Pt, Rgb,
};

use crate::error::{Error, Result};
use crate::markdown::StyledRun;
use crate::render::{PageSetup, hex_to_rgb};

use super::layout::{FragmentStyle, Metrics, justified_gap, split_words, wrap};
use crate::export::cover::CoverImage;

/// Typeface class; mapped onto a built-in PDF font family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFamily {
    Serif,
    Sans,
    Mono,
}

impl FontFamily {
    /// Best match for a configured font name such as `"Charter"` or `"Inter"`.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if ["courier", "mono", "code", "consol"].iter().any(|m| lower.contains(m)) {
            FontFamily::Mono
        } else if ["sans", "inter", "helvetica", "arial", "roboto"]
            .iter()
            .any(|m| lower.contains(m))
        {
            FontFamily::Sans
        } else {
            FontFamily::Serif
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Justify,
}

/// How to lay out one block of runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextOptions {
    pub align: TextAlign,
    /// Left indent in points.
    pub indent: f32,
    /// Non-wrapping text in front of the first line, e.g. a list marker.
    /// Continuation lines align with the text after it.
    pub prefix: Option<String>,
}

impl TextOptions {
    pub fn aligned(align: TextAlign) -> Self {
        Self {
            align,
            ..Self::default()
        }
    }
}

pub trait Canvas {
    fn set_font(&mut self, family: FontFamily, size: f32);

    /// Fill color as `RRGGBB`.
    fn set_color(&mut self, hex: &str);

    /// Write wrapped styled text at the cursor and advance past it.
    fn write_runs(&mut self, runs: &[StyledRun], options: &TextOptions) -> Result<()>;

    /// Write text line by line without reflowing whitespace.
    fn write_preformatted(&mut self, text: &str, indent: f32) -> Result<()>;

    /// Advance the cursor by `lines` lines of the current font.
    fn move_down(&mut self, lines: f32);

    /// Horizontal rule across the text column, `inset` points in from both sides.
    fn rule(&mut self, hex: &str, thickness: f32, inset: f32) -> Result<()>;

    /// Draw an image centered on the current page in a `width` x `height` box.
    fn image(&mut self, image: &CoverImage, width: f32, height: f32) -> Result<()>;

    /// End the current page.
    fn add_page(&mut self) -> Result<()>;
}

/// Twelve built-in fonts: three families in four styles.
struct FontSet {
    fonts: Vec<IndirectFontRef>,
}

impl FontSet {
    const BUILTINS: [BuiltinFont; 12] = [
        BuiltinFont::TimesRoman,
        BuiltinFont::TimesBold,
        BuiltinFont::TimesItalic,
        BuiltinFont::TimesBoldItalic,
        BuiltinFont::Helvetica,
        BuiltinFont::HelveticaBold,
        BuiltinFont::HelveticaOblique,
        BuiltinFont::HelveticaBoldOblique,
        BuiltinFont::Courier,
        BuiltinFont::CourierBold,
        BuiltinFont::CourierOblique,
        BuiltinFont::CourierBoldOblique,
    ];

    fn load(doc: &PdfDocumentReference) -> Result<Self> {
        let fonts = Self::BUILTINS
            .iter()
            .map(|font| doc.add_builtin_font(*font))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { fonts })
    }

    fn get(&self, family: FontFamily, style: FragmentStyle) -> &IndirectFontRef {
        let family = if style.code { FontFamily::Mono } else { family };
        let base = match family {
            FontFamily::Serif => 0,
            FontFamily::Sans => 4,
            FontFamily::Mono => 8,
        };
        let variant = match (style.bold, style.italic) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        };
        &self.fonts[base + variant]
    }
}

/// [`Canvas`] producing a PDF document.
pub struct PdfCanvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: FontSet,
    page: PageSetup,
    line_factor: f32,
    family: FontFamily,
    size: f32,
    color: (f32, f32, f32),
    /// Distance of the cursor from the top edge, in points.
    cursor: f32,
    /// Set by `add_page`; the page is created on the next draw.
    page_pending: bool,
    pages: usize,
    /// Anything drawn on the current page yet.
    page_dirty: bool,
}

impl PdfCanvas {
    /// Start a document with one empty page. `line_factor` is the line
    /// pitch as a multiple of the font size.
    pub fn new(title: &str, page: PageSetup, line_factor: f32) -> Result<Self> {
        let (doc, page_index, layer_index) =
            PdfDocument::new(title, pt_to_mm(page.width), pt_to_mm(page.height), "Page 1");
        let fonts = FontSet::load(&doc)?;
        let layer = doc.get_page(page_index).get_layer(layer_index);

        Ok(Self {
            doc,
            layer,
            fonts,
            cursor: page.margin,
            page,
            line_factor: line_factor.max(1.0),
            family: FontFamily::Serif,
            size: 12.0,
            color: (0.0, 0.0, 0.0),
            page_pending: false,
            pages: 1,
            page_dirty: false,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    /// Serialize the document.
    pub fn finish(self) -> Result<Vec<u8>> {
        Ok(self.doc.save_to_bytes()?)
    }

    fn line_height(&self) -> f32 {
        self.size * self.line_factor
    }

    fn bottom(&self) -> f32 {
        self.page.height - self.page.margin
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(
            pt_to_mm(self.page.width),
            pt_to_mm(self.page.height),
            format!("Page {}", self.pages + 1),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.pages += 1;
        self.cursor = self.page.margin;
        self.page_pending = false;
        self.page_dirty = false;
    }

    /// Make room for `height` points at the cursor, breaking the page if needed.
    fn reserve(&mut self, height: f32) {
        let overflow = self.cursor + height > self.bottom();
        if self.page_dirty && (self.page_pending || overflow) {
            self.new_page();
        }
        self.page_pending = false;
        self.page_dirty = true;
    }

    /// Baseline of a line whose top is at the cursor, in PDF coordinates.
    fn baseline(&self) -> f32 {
        // Ascent of the standard fonts is roughly 0.8 em; center the rest
        // of the line pitch around the glyphs.
        let leading = (self.line_height() - self.size) / 2.0;
        self.page.height - (self.cursor + leading + self.size * 0.8)
    }

    fn draw_text(&self, text: &str, style: FragmentStyle, x: f32, y: f32) {
        let (r, g, b) = self.color;
        self.layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
        let font = self.fonts.get(self.family, style);
        self.layer.use_text(text, self.size, pt_to_mm(x), pt_to_mm(y), font);
    }
}

impl Canvas for PdfCanvas {
    fn set_font(&mut self, family: FontFamily, size: f32) {
        self.family = family;
        self.size = size.max(1.0);
    }

    fn set_color(&mut self, hex: &str) {
        self.color = hex_to_rgb(hex);
    }

    fn write_runs(&mut self, runs: &[StyledRun], options: &TextOptions) -> Result<()> {
        let metrics = Metrics::new(self.family, self.size);
        let column = (self.page.width - 2.0 * self.page.margin - options.indent).max(self.size);
        let left = self.page.margin + options.indent;

        let prefix_width = options
            .prefix
            .as_deref()
            .map(|p| metrics.text_width(p, FragmentStyle::default()))
            .unwrap_or(0.0);
        let text_left = left + prefix_width;
        let text_width = (column - prefix_width).max(self.size);

        let lines = wrap(&split_words(runs), &metrics, text_width, text_width);
        let space = metrics.space_width();

        // A blank list item still shows its marker.
        if lines.is_empty() {
            if let Some(prefix) = options.prefix.as_deref() {
                let height = self.line_height();
                self.reserve(height);
                let y = self.baseline();
                self.draw_text(prefix, FragmentStyle::default(), left, y);
                self.cursor += height;
            }
            return Ok(());
        }

        for (index, line) in lines.iter().enumerate() {
            let height = self.line_height();
            self.reserve(height);
            let y = self.baseline();

            if index == 0 {
                if let Some(prefix) = options.prefix.as_deref() {
                    self.draw_text(prefix, FragmentStyle::default(), left, y);
                }
            }

            let (mut x, gap) = match options.align {
                TextAlign::Left => (text_left, space),
                TextAlign::Center => (text_left + ((text_width - line.natural_width) / 2.0).max(0.0), space),
                TextAlign::Justify => (text_left, justified_gap(line, &metrics, text_width)),
            };
            for word in &line.words {
                for fragment in &word.fragments {
                    self.draw_text(&fragment.text, fragment.style, x, y);
                    x += metrics.text_width(&fragment.text, fragment.style);
                }
                x += gap;
            }
            self.cursor += height;
        }
        Ok(())
    }

    fn write_preformatted(&mut self, text: &str, indent: f32) -> Result<()> {
        let metrics = Metrics::new(self.family, self.size);
        let style = FragmentStyle::default();
        let column = (self.page.width - 2.0 * self.page.margin - indent).max(self.size);
        let per_line = ((column / metrics.char_width('m', style)).floor() as usize).max(1);
        let left = self.page.margin + indent;

        for source_line in text.lines() {
            let expanded = source_line.replace('\t', "    ");
            let chars: Vec<char> = expanded.chars().collect();
            // Over-long lines are hard wrapped; empty lines still take space.
            let mut chunks: Vec<String> = chars.chunks(per_line).map(|c| c.iter().collect()).collect();
            if chunks.is_empty() {
                chunks.push(String::new());
            }
            for chunk in chunks {
                let height = self.line_height();
                self.reserve(height);
                if !chunk.is_empty() {
                    let y = self.baseline();
                    self.draw_text(&chunk, style, left, y);
                }
                self.cursor += height;
            }
        }
        Ok(())
    }

    fn move_down(&mut self, lines: f32) {
        if self.page_pending {
            if self.page_dirty {
                self.new_page();
            }
            // The break is spent on this page; the next one starts another.
            self.page_pending = false;
            self.page_dirty = true;
        }
        self.cursor += lines.max(0.0) * self.line_height();
    }

    fn rule(&mut self, hex: &str, thickness: f32, inset: f32) -> Result<()> {
        self.reserve(thickness + self.size);
        let (r, g, b) = hex_to_rgb(hex);
        let y = self.page.height - (self.cursor + self.size / 2.0);
        let x0 = self.page.margin + inset;
        let x1 = (self.page.width - self.page.margin - inset).max(x0);

        self.layer.set_outline_color(Color::Rgb(Rgb::new(r, g, b, None)));
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(PdfLine {
            points: vec![
                (Point::new(pt_to_mm(x0), pt_to_mm(y)), false),
                (Point::new(pt_to_mm(x1), pt_to_mm(y)), false),
            ],
            is_closed: false,
        });
        self.cursor += thickness + self.size;
        Ok(())
    }

    fn image(&mut self, cover: &CoverImage, width: f32, height: f32) -> Result<()> {
        let decoded = printpdf::image_crate::load_from_memory(&cover.data)
            .map_err(|e| Error::Render(format!("cannot decode {}: {e}", cover.path.display())))?;
        let rgb = printpdf::image_crate::DynamicImage::ImageRgb8(decoded.to_rgb8());
        let image = Image::from_dynamic_image(&rgb);

        let px_width = image.image.width.0.max(1) as f32;
        let px_height = image.image.height.0.max(1) as f32;

        self.reserve(height);
        let x = ((self.page.width - width) / 2.0).max(0.0);
        let y = ((self.page.height - height) / 2.0).max(0.0);

        // At 72 dpi one pixel is one point.
        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(pt_to_mm(x)),
                translate_y: Some(pt_to_mm(y)),
                scale_x: Some(width / px_width),
                scale_y: Some(height / px_height),
                dpi: Some(72.0),
                ..Default::default()
            },
        );
        self.cursor = self.bottom();
        Ok(())
    }

    fn add_page(&mut self) -> Result<()> {
        self.page_pending = true;
        Ok(())
    }
}

fn pt_to_mm(pt: f32) -> Mm {
    Mm::from(Pt(pt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::cover::ImageKind;
    use std::path::PathBuf;

    /// 1x1 RGBA PNG.
    const PIXEL_PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    fn canvas() -> PdfCanvas {
        PdfCanvas::new("Test", PageSetup::default(), 1.5).unwrap()
    }

    fn long_paragraph() -> Vec<StyledRun> {
        vec![StyledRun::plain("Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(40))]
    }

    #[test]
    fn test_font_family_from_name() {
        assert_eq!(FontFamily::from_name("Charter"), FontFamily::Serif);
        assert_eq!(FontFamily::from_name("Inter"), FontFamily::Sans);
        assert_eq!(FontFamily::from_name("Courier New"), FontFamily::Mono);
        assert_eq!(FontFamily::from_name("JetBrains Mono"), FontFamily::Mono);
    }

    #[test]
    fn test_finish_produces_pdf() {
        let mut canvas = canvas();
        canvas.set_font(FontFamily::Serif, 12.0);
        canvas
            .write_runs(&[StyledRun::plain("Hello"), StyledRun::bold(" world")], &TextOptions::default())
            .unwrap();
        let bytes = canvas.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_overflow_adds_pages() {
        let mut canvas = canvas();
        canvas.set_font(FontFamily::Serif, 12.0);
        for _ in 0..4 {
            canvas
                .write_runs(&long_paragraph(), &TextOptions::aligned(TextAlign::Justify))
                .unwrap();
        }
        assert!(canvas.page_count() > 1);
    }

    #[test]
    fn test_add_page_is_lazy() {
        let mut canvas = canvas();
        canvas.add_page().unwrap();
        canvas.add_page().unwrap();
        canvas.write_runs(&[StyledRun::plain("x")], &TextOptions::default()).unwrap();
        assert_eq!(canvas.page_count(), 1);

        canvas.add_page().unwrap();
        canvas.add_page().unwrap();
        assert_eq!(canvas.page_count(), 1);
        canvas.move_down(3.0);
        canvas.write_preformatted("let x = 1;\n\nlet y = 2;", 0.0).unwrap();
        assert_eq!(canvas.page_count(), 2);
    }

    #[test]
    fn test_blank_list_item_draws_marker() {
        let mut canvas = canvas();
        canvas.set_font(FontFamily::Serif, 12.0);
        let options = TextOptions {
            prefix: Some("1. ".to_string()),
            ..TextOptions::default()
        };
        let before = canvas.cursor;
        canvas.write_runs(&[StyledRun::plain("\u{a0}")], &options).unwrap();
        assert_eq!(canvas.cursor, before + canvas.line_height());
        assert!(canvas.page_dirty);

        // Without a marker, blank runs take no space.
        let before = canvas.cursor;
        canvas
            .write_runs(&[StyledRun::plain("  ")], &TextOptions::default())
            .unwrap();
        assert_eq!(canvas.cursor, before);
    }

    #[test]
    fn test_break_after_blank_page_still_counts() {
        let mut canvas = canvas();
        canvas.write_runs(&[StyledRun::plain("title")], &TextOptions::default()).unwrap();

        // A page holding only spacing still ends at the next break.
        canvas.add_page().unwrap();
        canvas.write_runs(&[], &TextOptions::default()).unwrap();
        canvas.move_down(1.0);
        assert_eq!(canvas.page_count(), 2);

        canvas.add_page().unwrap();
        canvas.write_runs(&[StyledRun::plain("next")], &TextOptions::default()).unwrap();
        assert_eq!(canvas.page_count(), 3);
    }

    #[test]
    fn test_image_decodes_or_fails() {
        let mut canvas = canvas();
        let good = CoverImage {
            path: PathBuf::from("pixel.png"),
            data: PIXEL_PNG.to_vec(),
            kind: ImageKind::Png,
        };
        canvas.image(&good, 432.0, 648.0).unwrap();

        let bad = CoverImage {
            data: b"\x89PNG\r\n\x1a\ngarbage".to_vec(),
            ..good
        };
        assert!(matches!(canvas.image(&bad, 432.0, 648.0), Err(Error::Render(_))));
    }
}
