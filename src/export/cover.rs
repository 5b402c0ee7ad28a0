//! Cover image lookup.
//!
//! Books reference their cover as an upload path such as
//! `/uploads/1712-cover.png`. Remote URLs and default-avatar placeholders
//! have no local file and produce no cover page. A cover that cannot be
//! read or recognised is logged and skipped; it never fails an export.

use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::book::Book;

/// Markers of the stock images the front end shows when no cover was uploaded.
const PLACEHOLDER_MARKERS: &[&str] = &["default-avatar", "default_avatar", "placeholder"];

/// Raster formats both backends can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
}

impl ImageKind {
    /// Detect the format from magic bytes.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageKind::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageKind::Jpeg)
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(ImageKind::Gif)
        } else {
            None
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpeg",
            ImageKind::Gif => "gif",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Gif => "image/gif",
        }
    }
}

/// A cover image read from disk.
#[derive(Debug, Clone)]
pub struct CoverImage {
    pub path: PathBuf,
    pub data: Vec<u8>,
    pub kind: ImageKind,
}

/// True for cover references that never point at an uploaded file.
pub fn is_placeholder(reference: &str) -> bool {
    let lower = reference.trim().to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("data:")
        || PLACEHOLDER_MARKERS.iter().any(|m| lower.contains(m))
}

/// Load the book's cover from under `upload_root`, if it has a usable one.
pub fn resolve_cover(book: &Book, upload_root: &Path) -> Option<CoverImage> {
    let reference = book.cover_image.as_deref().map(str::trim).unwrap_or("");
    if reference.is_empty() || is_placeholder(reference) {
        return None;
    }

    let Some(path) = local_path(reference, upload_root) else {
        log::warn!("cover image path {reference:?} escapes the upload root, skipping");
        return None;
    };

    let data = match std::fs::read(&path) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("cover image {} unreadable, skipping: {e}", path.display());
            return None;
        }
    };

    let Some(kind) = ImageKind::sniff(&data) else {
        log::warn!("cover image {} is not PNG, JPEG or GIF, skipping", path.display());
        return None;
    };

    Some(CoverImage { path, data, kind })
}

/// Map a stored reference onto the filesystem under `root`.
///
/// The reference is percent-decoded and may use either separator. Parent
/// directory components are rejected.
fn local_path(reference: &str, root: &Path) -> Option<PathBuf> {
    let decoded = percent_decode_str(reference)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| reference.to_string());
    let normalized = decoded.replace('\\', "/");

    let mut path = root.to_path_buf();
    for component in Path::new(normalized.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(path)
}
