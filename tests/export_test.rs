//! End-to-end export tests.
//!
//! Books are built through the public API (or loaded from JSON), exported to
//! both formats and the resulting packages inspected.

use std::io::{Cursor, Read};
use std::path::Path;

use folio::export::{DocxExporter, ExportConfig, ExportFormat, Exporter, PdfExporter, export_book};
use folio::{Book, Chapter, Error, ExportService, MemoryStore};
use tempfile::TempDir;
use zip::ZipArchive;

const PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

const PAGE_BREAK: &str = "<w:br w:type=\"page\"/>";

// ============================================================================
// Helpers
// ============================================================================

fn sample_book() -> Book {
    Book::new("b1", "alice", "Field Notes")
        .with_subtitle("On Bees")
        .with_author("Alice Apiarist")
        .with_chapter(Chapter::new(
            "Hives",
            "# Hives\n\nA hive is **busy** and *warm*.\n\n- frames\n- comb\n  1. wax\n  2. honey\n",
        ))
        .with_chapter(Chapter::new(
            "Swarms",
            "> Bees leave in spring.\n\n```\nswarm();\n```\n\n---\n\nUse `smoke` carefully.",
        ))
        .with_chapter(Chapter::new("Honey", "Harvest in late summer."))
}

fn docx_part(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut out = String::new();
    part.read_to_string(&mut out).unwrap();
    out
}

fn upload_root_with_cover() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("uploads")).unwrap();
    std::fs::write(dir.path().join("uploads/cover.png"), PIXEL_PNG).unwrap();
    dir
}

fn config_with_root(root: &Path) -> ExportConfig {
    ExportConfig {
        upload_root: root.to_path_buf(),
        ..Default::default()
    }
}

// ============================================================================
// DOCX
// ============================================================================

#[test]
fn test_docx_structure() {
    let artifact = export_book(&sample_book(), ExportFormat::Docx, &ExportConfig::default()).unwrap();
    assert_eq!(artifact.filename, "Field_Notes.docx");

    let document = docx_part(&artifact.bytes, "word/document.xml");

    // Title page break plus one break before each chapter after the first.
    assert_eq!(document.matches(PAGE_BREAK).count(), 3);

    let title = document.find("Field Notes").unwrap();
    let subtitle = document.find("On Bees").unwrap();
    let byline = document.find("by Alice Apiarist").unwrap();
    let first = document.find(">Hives<").unwrap();
    let last = document.find(">Honey<").unwrap();
    assert!(title < subtitle && subtitle < byline && byline < first && first < last);
}

#[test]
fn test_docx_renders_markdown_blocks() {
    let artifact = export_book(&sample_book(), ExportFormat::Docx, &ExportConfig::default()).unwrap();
    let document = docx_part(&artifact.bytes, "word/document.xml");

    assert!(document.contains("w:val=\"Heading1\""));
    assert!(document.contains("<w:b/>"));
    assert!(document.contains("<w:i/>"));
    assert!(document.contains("swarm();"));
    assert!(document.contains("Courier New"));
    assert!(document.contains("\u{2022}"));
    assert!(document.contains("1."));
    assert!(!document.contains("**"));
}

#[test]
fn test_docx_cover_adds_page() {
    let dir = upload_root_with_cover();
    let book = sample_book().with_cover_image("/uploads/cover.png");

    let artifact = export_book(&book, ExportFormat::Docx, &config_with_root(dir.path())).unwrap();
    let document = docx_part(&artifact.bytes, "word/document.xml");
    assert_eq!(document.matches(PAGE_BREAK).count(), 4);
    assert!(document.contains("w:drawing"));

    let mut archive = ZipArchive::new(Cursor::new(&artifact.bytes)).unwrap();
    assert!(archive.by_name("word/media/cover.png").is_ok());
}

#[test]
fn test_docx_placeholder_cover_is_ignored() {
    let dir = upload_root_with_cover();
    let book = sample_book().with_cover_image("/uploads/default-avatar.png");

    let artifact = export_book(&book, ExportFormat::Docx, &config_with_root(dir.path())).unwrap();
    let document = docx_part(&artifact.bytes, "word/document.xml");
    assert_eq!(document.matches(PAGE_BREAK).count(), 3);
    assert!(!document.contains("w:drawing"));
}

#[test]
fn test_docx_exporter_writes_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.docx");
    let mut file = std::fs::File::create(&path).unwrap();
    DocxExporter::new().export(&sample_book(), &mut file).unwrap();
    drop(file);

    let bytes = std::fs::read(&path).unwrap();
    let core = docx_part(&bytes, "docProps/core.xml");
    assert!(core.contains("Field Notes"));
    assert!(core.contains("Alice Apiarist"));
}

#[test]
fn test_docx_book_without_chapters() {
    let book = Book::new("b2", "alice", "Empty").with_author("Nobody");
    let artifact = export_book(&book, ExportFormat::Docx, &ExportConfig::default()).unwrap();
    let document = docx_part(&artifact.bytes, "word/document.xml");
    assert_eq!(document.matches(PAGE_BREAK).count(), 1);
}

// ============================================================================
// PDF
// ============================================================================

#[test]
fn test_pdf_export() {
    let artifact = export_book(&sample_book(), ExportFormat::Pdf, &ExportConfig::default()).unwrap();
    assert_eq!(artifact.filename, "Field_Notes.pdf");
    assert_eq!(artifact.content_type, "application/pdf");
    assert!(artifact.bytes.starts_with(b"%PDF-"));
}

#[test]
fn test_pdf_with_cover() {
    let dir = upload_root_with_cover();
    let plain = {
        let mut out = Cursor::new(Vec::new());
        PdfExporter::new()
            .with_config(config_with_root(dir.path()))
            .export(&sample_book(), &mut out)
            .unwrap();
        out.into_inner()
    };
    let covered = {
        let mut out = Cursor::new(Vec::new());
        PdfExporter::new()
            .with_config(config_with_root(dir.path()))
            .export(&sample_book().with_cover_image("uploads/cover.png"), &mut out)
            .unwrap();
        out.into_inner()
    };
    assert!(covered.starts_with(b"%PDF-"));
    assert!(covered.len() > plain.len());
}

#[test]
fn test_pdf_long_chapter() {
    let paragraph = "The quick brown fox jumps over the lazy dog. ".repeat(40);
    let content = (0..30).map(|_| paragraph.as_str()).collect::<Vec<_>>().join("\n\n");
    let book = Book::new("b3", "alice", "Long").with_author("A").with_chapter(Chapter::new("All", content));

    let artifact = export_book(&book, ExportFormat::Pdf, &ExportConfig::default()).unwrap();
    assert!(artifact.bytes.starts_with(b"%PDF-"));
}

// ============================================================================
// Service
// ============================================================================

#[test]
fn test_service_from_json_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("books.json");
    std::fs::write(
        &path,
        r#"[{
            "_id": "b1",
            "userId": "alice",
            "title": "Stored",
            "author": "Alice",
            "chapters": [{"title": "One", "content": "Hello."}]
        }]"#,
    )
    .unwrap();

    let service = ExportService::new(MemoryStore::from_json_file(&path).unwrap(), ExportConfig::default());

    let artifact = service.export("b1", "alice", ExportFormat::Docx).unwrap();
    assert_eq!(artifact.filename, "Stored.docx");

    assert!(matches!(
        service.export("b1", "bob", ExportFormat::Pdf),
        Err(Error::Unauthorized(_))
    ));
    assert!(matches!(
        service.export("b9", "alice", ExportFormat::Pdf),
        Err(Error::NotFound(_))
    ));
}
