//! DOCX export.
//!
//! Front matter, chapter titles and chapter bodies are collected as a flat
//! list of WordprocessingML paragraphs, then packed into an Office Open XML
//! package:
//!
//! ```text
//! [Content_Types].xml
//! _rels/.rels
//! docProps/core.xml
//! word/document.xml
//! word/styles.xml
//! word/_rels/document.xml.rels
//! word/media/cover.<ext>      (only when a cover page was emitted)
//! ```

mod flow;
mod xml;

use std::io::{Seek, Write};

use quick_xml::escape::escape;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::book::Book;
use crate::error::Result;
use crate::markdown::Token;
use crate::render::{Typography, WalkReport};

use super::assemble::{DocumentBackend, assemble};
use super::cover::{CoverImage, ImageKind, resolve_cover};
use super::{ExportConfig, Exporter};

pub use flow::{FlowBuilder, RenderedBlock, build_blocks};

use flow::block_paragraph;
use xml::{Align, Border, ImageRun, Paragraph, ParagraphSpacing, Run, TextRun, half_points, pt_to_emu, pt_to_twips};

const COVER_REL_ID: &str = "rIdCover";

/// Space above the book title on the title page, in twips.
const TITLE_PAGE_TOP: u32 = 2880;

/// Exporter for Word documents.
#[derive(Debug, Clone, Default)]
pub struct DocxExporter {
    config: ExportConfig,
}

impl DocxExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ExportConfig) -> Self {
        self.config = config;
        self
    }
}

impl Exporter for DocxExporter {
    fn export<W: Write + Seek>(&self, book: &Book, writer: &mut W) -> Result<()> {
        let typography = &self.config.typography;
        let cover = resolve_cover(book, &self.config.upload_root);

        let mut backend = DocxBackend::new(typography);
        let report = assemble(book, cover.as_ref(), &mut backend)?;
        log::debug!(
            "docx: {} chapters, {} paragraphs, {} dropped blocks",
            report.chapters,
            backend.paragraphs.len(),
            report.block_errors
        );

        let cover = cover.filter(|_| report.cover_page);
        let package = Package {
            document: document_xml(&backend.paragraphs, typography),
            styles: styles_xml(typography),
            core: core_xml(book),
            cover: cover.as_ref(),
        };
        package.write(writer)
    }
}

/// [`DocumentBackend`] collecting WordprocessingML paragraphs.
struct DocxBackend<'a> {
    typography: &'a Typography,
    paragraphs: Vec<Paragraph>,
    next_drawing_id: u32,
}

impl<'a> DocxBackend<'a> {
    fn new(typography: &'a Typography) -> Self {
        Self {
            typography,
            paragraphs: Vec::new(),
            next_drawing_id: 1,
        }
    }

    fn centered(&mut self, before: u32, after: u32, run: TextRun) {
        self.paragraphs.push(
            Paragraph {
                align: Some(Align::Center),
                spacing: Some(ParagraphSpacing {
                    before,
                    after,
                    line: None,
                }),
                ..Paragraph::default()
            }
            .with_run(run),
        );
    }
}

impl DocumentBackend for DocxBackend<'_> {
    fn cover_page(&mut self, cover: &CoverImage) -> Result<()> {
        let page = &self.typography.page;
        let image = ImageRun {
            rel_id: COVER_REL_ID.to_string(),
            name: format!("cover.{}", cover.kind.extension()),
            doc_pr_id: self.next_drawing_id,
            width_emu: pt_to_emu(page.cover_width),
            height_emu: pt_to_emu(page.cover_height),
        };
        self.next_drawing_id += 1;

        self.paragraphs.push(Paragraph {
            align: Some(Align::Center),
            runs: vec![Run::Image(image)],
            ..Paragraph::default()
        });
        self.paragraphs.push(Paragraph::page_break());
        Ok(())
    }

    fn title_page(&mut self, book: &Book) -> Result<()> {
        let t = self.typography;

        self.paragraphs.push(Paragraph {
            style: Some("BookTitle"),
            align: Some(Align::Center),
            spacing: Some(ParagraphSpacing {
                before: TITLE_PAGE_TOP,
                after: t.spacing.chapter_after,
                line: None,
            }),
            ..Paragraph::default()
        }
        .with_run(
            TextRun::new(book.title.as_str())
                .font(t.fonts.heading.as_str())
                .size(t.sizes.title)
                .bold(true)
                .color(t.colors.heading.as_str()),
        ));

        if let Some(subtitle) = book.display_subtitle() {
            self.centered(
                0,
                t.spacing.heading_before,
                TextRun::new(subtitle)
                    .font(t.fonts.heading.as_str())
                    .size(t.sizes.subtitle)
                    .color(t.colors.muted.as_str()),
            );
        }

        self.centered(
            t.spacing.chapter_before,
            t.spacing.block,
            TextRun::new(format!("by {}", book.author))
                .font(t.fonts.body.as_str())
                .size(t.sizes.author)
                .italic(true)
                .color(t.colors.text.as_str()),
        );

        self.paragraphs.push(Paragraph {
            align: Some(Align::Center),
            indent_left: Some(pt_to_twips(t.content_width() / 3.0)),
            spacing: Some(ParagraphSpacing {
                before: t.spacing.block,
                after: t.spacing.block,
                line: None,
            }),
            border_bottom: Some(Border::new(t.colors.quote_border.as_str(), 12)),
            ..Paragraph::default()
        });
        self.paragraphs.push(Paragraph::page_break());
        Ok(())
    }

    fn page_break(&mut self) -> Result<()> {
        self.paragraphs.push(Paragraph::page_break());
        Ok(())
    }

    fn chapter_title(&mut self, title: &str) -> Result<()> {
        let t = self.typography;
        self.paragraphs.push(
            Paragraph {
                style: Some("ChapterTitle"),
                spacing: Some(ParagraphSpacing {
                    before: t.spacing.chapter_before,
                    after: t.spacing.chapter_after,
                    line: None,
                }),
                keep_next: true,
                ..Paragraph::default()
            }
            .with_run(
                TextRun::new(title)
                    .font(t.fonts.heading.as_str())
                    .size(t.sizes.chapter_title)
                    .bold(true)
                    .color(t.colors.heading.as_str()),
            ),
        );
        Ok(())
    }

    fn chapter_body(&mut self, tokens: &[Token]) -> Result<WalkReport> {
        let t = self.typography;
        let (blocks, report) = build_blocks(tokens, t);
        self.paragraphs
            .extend(blocks.iter().map(|block| block_paragraph(block, t)));
        Ok(report)
    }
}

/// Serialized parts of one package.
struct Package<'a> {
    document: String,
    styles: String,
    core: String,
    cover: Option<&'a CoverImage>,
}

impl Package<'_> {
    fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);

        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(6));

        let cover_kind = self.cover.map(|c| c.kind);

        zip.start_file("[Content_Types].xml", deflated)?;
        zip.write_all(content_types_xml(cover_kind).as_bytes())?;

        zip.start_file("_rels/.rels", deflated)?;
        zip.write_all(ROOT_RELS.as_bytes())?;

        zip.start_file("docProps/core.xml", deflated)?;
        zip.write_all(self.core.as_bytes())?;

        zip.start_file("word/document.xml", deflated)?;
        zip.write_all(self.document.as_bytes())?;

        zip.start_file("word/styles.xml", deflated)?;
        zip.write_all(self.styles.as_bytes())?;

        zip.start_file("word/_rels/document.xml.rels", deflated)?;
        zip.write_all(document_rels_xml(cover_kind).as_bytes())?;

        if let Some(cover) = self.cover {
            // Already-compressed image data.
            zip.start_file(format!("word/media/cover.{}", cover.kind.extension()), stored)?;
            zip.write_all(&cover.data)?;
        }

        zip.finish()?;
        Ok(())
    }
}

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

const ROOT_RELS: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>",
    "<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>",
    "</Relationships>"
);

fn content_types_xml(cover: Option<ImageKind>) -> String {
    let mut out = String::from(XML_DECL);
    out.push_str("<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">");
    out.push_str("<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>");
    out.push_str("<Default Extension=\"xml\" ContentType=\"application/xml\"/>");
    if let Some(kind) = cover {
        out.push_str(&format!(
            "<Default Extension=\"{}\" ContentType=\"{}\"/>",
            kind.extension(),
            kind.media_type()
        ));
    }
    out.push_str("<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>");
    out.push_str("<Override PartName=\"/word/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml\"/>");
    out.push_str("<Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>");
    out.push_str("</Types>");
    out
}

fn document_rels_xml(cover: Option<ImageKind>) -> String {
    let mut out = String::from(XML_DECL);
    out.push_str("<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">");
    out.push_str("<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>");
    if let Some(kind) = cover {
        out.push_str(&format!(
            "<Relationship Id=\"{COVER_REL_ID}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/image\" Target=\"media/cover.{}\"/>",
            kind.extension()
        ));
    }
    out.push_str("</Relationships>");
    out
}

fn core_xml(book: &Book) -> String {
    let mut out = String::from(XML_DECL);
    out.push_str(concat!(
        "<cp:coreProperties",
        " xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\"",
        " xmlns:dc=\"http://purl.org/dc/elements/1.1/\"",
        " xmlns:dcterms=\"http://purl.org/dc/terms/\"",
        " xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">"
    ));
    out.push_str(&format!("<dc:title>{}</dc:title>", escape(book.title.as_str())));
    if let Some(subtitle) = book.display_subtitle() {
        out.push_str(&format!("<dc:subject>{}</dc:subject>", escape(subtitle)));
    }
    if !book.author.trim().is_empty() {
        out.push_str(&format!("<dc:creator>{}</dc:creator>", escape(book.author.as_str())));
    }
    out.push_str("</cp:coreProperties>");
    out
}

fn document_xml(paragraphs: &[Paragraph], t: &Typography) -> String {
    let mut out = String::from(XML_DECL);
    out.push_str(concat!(
        "<w:document",
        " xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"",
        " xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"",
        " xmlns:wp=\"http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing\"",
        " xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\"",
        " xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
        "<w:body>"
    ));
    for paragraph in paragraphs {
        paragraph.write_xml(&mut out);
    }

    let margin = pt_to_twips(t.page.margin);
    out.push_str(&format!(
        "<w:sectPr><w:pgSz w:w=\"{}\" w:h=\"{}\"/><w:pgMar w:top=\"{margin}\" w:right=\"{margin}\" w:bottom=\"{margin}\" w:left=\"{margin}\" w:header=\"720\" w:footer=\"720\" w:gutter=\"0\"/></w:sectPr>",
        pt_to_twips(t.page.width),
        pt_to_twips(t.page.height),
    ));
    out.push_str("</w:body></w:document>");
    out
}

/// Paragraph style with a run font, size and optional outline level.
fn paragraph_style(out: &mut String, id: &str, name: &str, font: &str, size: f32, bold: bool, outline: Option<u8>) {
    out.push_str(&format!(
        "<w:style w:type=\"paragraph\" w:styleId=\"{id}\"><w:name w:val=\"{name}\"/><w:basedOn w:val=\"Normal\"/><w:next w:val=\"Normal\"/><w:qFormat/>"
    ));
    if let Some(level) = outline {
        out.push_str(&format!("<w:pPr><w:keepNext/><w:outlineLvl w:val=\"{level}\"/></w:pPr>"));
    }
    let font = escape(font);
    let sz = half_points(size);
    out.push_str(&format!(
        "<w:rPr><w:rFonts w:ascii=\"{font}\" w:hAnsi=\"{font}\" w:cs=\"{font}\"/>{}<w:sz w:val=\"{sz}\"/><w:szCs w:val=\"{sz}\"/></w:rPr></w:style>",
        if bold { "<w:b/><w:bCs/>" } else { "" }
    ));
}

fn styles_xml(t: &Typography) -> String {
    let mut out = String::from(XML_DECL);
    out.push_str("<w:styles xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">");

    let body_font = escape(t.fonts.body.as_str());
    let body_size = half_points(t.sizes.body);
    out.push_str(&format!(
        "<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii=\"{body_font}\" w:hAnsi=\"{body_font}\" w:cs=\"{body_font}\"/><w:color w:val=\"{}\"/><w:sz w:val=\"{body_size}\"/><w:szCs w:val=\"{body_size}\"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after=\"{}\" w:line=\"{}\" w:lineRule=\"auto\"/></w:pPr></w:pPrDefault></w:docDefaults>",
        escape(t.colors.text.as_str()),
        t.spacing.paragraph_after,
        t.spacing.line,
    ));
    out.push_str("<w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\"><w:name w:val=\"Normal\"/><w:qFormat/></w:style>");

    let heading = t.fonts.heading.as_str();
    paragraph_style(&mut out, "BookTitle", "Book Title", heading, t.sizes.title, true, None);
    paragraph_style(&mut out, "ChapterTitle", "Chapter Title", heading, t.sizes.chapter_title, true, Some(0));
    paragraph_style(&mut out, "Heading1", "heading 1", heading, t.sizes.h1, true, Some(1));
    paragraph_style(&mut out, "Heading2", "heading 2", heading, t.sizes.h2, true, Some(2));
    paragraph_style(&mut out, "Heading3", "heading 3", heading, t.sizes.h3, true, Some(3));
    paragraph_style(&mut out, "Code", "Code", t.fonts.code.as_str(), t.sizes.code, false, None);

    out.push_str("</w:styles>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Chapter;
    use quick_xml::Reader;
    use quick_xml::events::Event;
    use std::io::{Cursor, Read};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn export(book: &Book, config: ExportConfig) -> zip::ZipArchive<Cursor<Vec<u8>>> {
        let mut out = Cursor::new(Vec::new());
        DocxExporter::new().with_config(config).export(book, &mut out).unwrap();
        zip::ZipArchive::new(Cursor::new(out.into_inner())).unwrap()
    }

    fn read_part(archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut text = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut text).unwrap();
        text
    }

    /// Parse to the end, failing on malformed XML, and count page breaks.
    fn page_breaks(document: &str) -> usize {
        let mut reader = Reader::from_str(document);
        let mut breaks = 0;
        loop {
            match reader.read_event().unwrap() {
                Event::Empty(e) if e.name().as_ref() == b"w:br" => {
                    let is_page = e
                        .try_get_attribute("w:type")
                        .unwrap()
                        .is_some_and(|a| a.value.as_ref() == b"page");
                    if is_page {
                        breaks += 1;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        breaks
    }

    fn sample_book(chapters: usize) -> Book {
        let mut book = Book::new("b1", "u1", "My Book: Part 2!")
            .with_author("Ada & Co")
            .with_subtitle("A <story>");
        for i in 0..chapters {
            book = book.with_chapter(Chapter::new(
                format!("Chapter {}", i + 1),
                "# Heading\n\nSome **bold** and *soft* text.\n\n1. one\n2. two\n",
            ));
        }
        book
    }

    #[test]
    fn test_package_parts() {
        let mut archive = export(&sample_book(1), ExportConfig::default());
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "word/document.xml",
            "word/styles.xml",
            "word/_rels/document.xml.rels",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing {name}");
        }
        assert!(archive.by_name("word/media/cover.png").is_err());

        let core = read_part(&mut archive, "docProps/core.xml");
        assert!(core.contains("<dc:creator>Ada &amp; Co</dc:creator>"));
    }

    #[test]
    fn test_page_breaks_between_chapters() {
        for chapters in [0, 1, 3] {
            let mut archive = export(&sample_book(chapters), ExportConfig::default());
            let document = read_part(&mut archive, "word/document.xml");
            // One ending the title page, one before each chapter after the first.
            assert_eq!(page_breaks(&document), 1 + chapters.saturating_sub(1));
        }
    }

    #[test]
    fn test_title_page_content_is_escaped() {
        let mut archive = export(&sample_book(1), ExportConfig::default());
        let document = read_part(&mut archive, "word/document.xml");
        assert!(document.contains("My Book: Part 2!"));
        assert!(document.contains("A &lt;story&gt;"));
        assert!(document.contains("by Ada &amp; Co"));
        assert!(document.contains("ChapterTitle"));
        assert!(document.contains("Chapter 1"));
        assert!(document.contains("2. "));
    }

    #[test]
    fn test_blank_subtitle_is_omitted() {
        let book = Book::new("b", "u", "T").with_author("A").with_subtitle("   ");
        let mut archive = export(&book, ExportConfig::default());
        let document = read_part(&mut archive, "word/document.xml");
        assert_eq!(document.matches("<w:t xml:space=\"preserve\">").count(), 2);
    }

    #[test]
    fn test_cover_page_embeds_image() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("uploads")).unwrap();
        std::fs::write(dir.path().join("uploads/cover.png"), PNG).unwrap();

        let book = sample_book(2).with_cover_image("/uploads/cover.png");
        let config = ExportConfig {
            upload_root: dir.path().to_path_buf(),
            ..ExportConfig::default()
        };
        let mut archive = export(&book, config);

        let document = read_part(&mut archive, "word/document.xml");
        assert!(document.contains("r:embed=\"rIdCover\""));
        assert_eq!(page_breaks(&document), 3);

        let rels = read_part(&mut archive, "word/_rels/document.xml.rels");
        assert!(rels.contains("media/cover.png"));
        let types = read_part(&mut archive, "[Content_Types].xml");
        assert!(types.contains("image/png"));

        let mut data = Vec::new();
        archive
            .by_name("word/media/cover.png")
            .unwrap()
            .read_to_end(&mut data)
            .unwrap();
        assert_eq!(data, PNG);
    }

    #[test]
    fn test_missing_cover_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let book = sample_book(1).with_cover_image("/uploads/gone.png");
        let config = ExportConfig {
            upload_root: dir.path().to_path_buf(),
            ..ExportConfig::default()
        };
        let mut archive = export(&book, config);
        let document = read_part(&mut archive, "word/document.xml");
        assert!(!document.contains("w:drawing"));
        assert_eq!(page_breaks(&document), 1);
    }

    #[test]
    fn test_styles_define_outline_levels() {
        let styles = styles_xml(&Typography::default());
        assert!(styles.contains("w:styleId=\"ChapterTitle\""));
        assert!(styles.contains("<w:outlineLvl w:val=\"0\"/>"));
        assert!(styles.contains("w:styleId=\"Heading3\""));
        let mut reader = Reader::from_str(&styles);
        while reader.read_event().unwrap() != Event::Eof {}
    }
}
