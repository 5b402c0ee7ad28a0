//! Shared typographic model for both export backends.
//!
//! Sizes are in points, spacing in twentieths of a point (the unit
//! WordprocessingML uses natively). The PDF backend converts spacing into
//! cursor advances measured in body lines, so both outputs keep the same
//! vertical rhythm.

use serde::Deserialize;

/// Fonts, sizes, spacing and colors used by every renderer.
///
/// Passed into each backend at construction; there is no global style
/// state. Deserializes from the `[typography]` table of the config file,
/// with any omitted field taking its default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Typography {
    pub fonts: Fonts,
    pub sizes: Sizes,
    pub spacing: Spacing,
    pub colors: Colors,
    pub page: PageSetup,
    /// Left indent for list items and blockquotes, in twips.
    pub list_indent: u32,
    /// Extra indent per nested list level, in twips.
    pub nested_indent: u32,
    pub bullet: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Fonts {
    pub body: String,
    pub heading: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Sizes {
    pub title: f32,
    pub subtitle: f32,
    pub author: f32,
    pub chapter_title: f32,
    pub h1: f32,
    pub h2: f32,
    pub h3: f32,
    pub body: f32,
    pub code: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Spacing {
    pub paragraph_before: u32,
    pub paragraph_after: u32,
    pub chapter_before: u32,
    pub chapter_after: u32,
    pub heading_before: u32,
    pub heading_after: u32,
    /// Before/after each list item and list paragraph.
    pub list_item: u32,
    /// Spacer appended after a list closes.
    pub list_end: u32,
    /// Before/after blockquotes, code blocks and rules.
    pub block: u32,
    /// Body line pitch (240 = single spacing).
    pub line: u32,
}

/// Hex RGB colors without the leading `#`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Colors {
    pub text: String,
    pub heading: String,
    pub muted: String,
    pub quote: String,
    pub quote_border: String,
    pub code: String,
    pub code_background: String,
    pub rule: String,
}

/// Page geometry in points.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageSetup {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    /// Box the cover image is fitted into on the cover page.
    pub cover_width: f32,
    pub cover_height: f32,
}

/// Size/weight tier for markdown headings; levels past 3 share tier 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadingTier {
    H1,
    H2,
    H3,
}

impl HeadingTier {
    pub fn from_level(level: u8) -> Self {
        match level {
            0 | 1 => HeadingTier::H1,
            2 => HeadingTier::H2,
            _ => HeadingTier::H3,
        }
    }

    /// 1-based outline level.
    pub fn level(self) -> u8 {
        match self {
            HeadingTier::H1 => 1,
            HeadingTier::H2 => 2,
            HeadingTier::H3 => 3,
        }
    }
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            fonts: Fonts::default(),
            sizes: Sizes::default(),
            spacing: Spacing::default(),
            colors: Colors::default(),
            page: PageSetup::default(),
            list_indent: 720,
            nested_indent: 360,
            bullet: "\u{2022}".to_string(),
        }
    }
}

impl Default for Fonts {
    fn default() -> Self {
        Self {
            body: "Charter".to_string(),
            heading: "Inter".to_string(),
            code: "Courier New".to_string(),
        }
    }
}

impl Default for Sizes {
    fn default() -> Self {
        Self {
            title: 32.0,
            subtitle: 20.0,
            author: 18.0,
            chapter_title: 24.0,
            h1: 20.0,
            h2: 18.0,
            h3: 16.0,
            body: 12.0,
            code: 10.0,
        }
    }
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            paragraph_before: 200,
            paragraph_after: 200,
            chapter_before: 400,
            chapter_after: 300,
            heading_before: 300,
            heading_after: 150,
            list_item: 50,
            list_end: 100,
            block: 200,
            line: 360,
        }
    }
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            text: "1A1A1A".to_string(),
            heading: "111111".to_string(),
            muted: "555555".to_string(),
            quote: "666666".to_string(),
            quote_border: "4F46E5".to_string(),
            code: "333333".to_string(),
            code_background: "F5F5F5".to_string(),
            rule: "CCCCCC".to_string(),
        }
    }
}

impl Default for PageSetup {
    fn default() -> Self {
        // US Letter, one inch margins.
        Self {
            width: 612.0,
            height: 792.0,
            margin: 72.0,
            cover_width: 432.0,
            cover_height: 648.0,
        }
    }
}

impl Typography {
    pub fn heading_size(&self, tier: HeadingTier) -> f32 {
        match tier {
            HeadingTier::H1 => self.sizes.h1,
            HeadingTier::H2 => self.sizes.h2,
            HeadingTier::H3 => self.sizes.h3,
        }
    }

    /// Body line pitch as a multiple of the font size.
    pub fn line_factor(&self) -> f32 {
        self.spacing.line as f32 / 240.0
    }

    /// Convert a spacing value (twips) into body lines for cursor advances.
    pub fn spacing_lines(&self, twips: u32) -> f32 {
        let body_line = self.sizes.body * self.line_factor();
        if body_line <= 0.0 {
            return 0.0;
        }
        twips_to_pt(twips) / body_line
    }

    /// List indent for a given nesting depth (0 = top level), in twips.
    pub fn list_indent_at(&self, depth: usize) -> u32 {
        self.list_indent + self.nested_indent * depth as u32
    }

    /// Width of the text column in points.
    pub fn content_width(&self) -> f32 {
        (self.page.width - 2.0 * self.page.margin).max(0.0)
    }
}

pub fn twips_to_pt(twips: u32) -> f32 {
    twips as f32 / 20.0
}

/// Parse `RRGGBB` (optionally `#`-prefixed) into unit RGB components.
///
/// Malformed colors fall back to black.
pub fn hex_to_rgb(hex: &str) -> (f32, f32, f32) {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return (0.0, 0.0, 0.0);
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map(|v| v as f32 / 255.0)
            .unwrap_or(0.0)
    };
    (channel(0), channel(2), channel(4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_levels_clamp_to_three_tiers() {
        assert_eq!(HeadingTier::from_level(1), HeadingTier::H1);
        assert_eq!(HeadingTier::from_level(2), HeadingTier::H2);
        assert_eq!(HeadingTier::from_level(3), HeadingTier::H3);
        assert_eq!(HeadingTier::from_level(4), HeadingTier::H3);
        assert_eq!(HeadingTier::from_level(6), HeadingTier::H3);

        let t = Typography::default();
        assert_eq!(
            t.heading_size(HeadingTier::from_level(5)),
            t.heading_size(HeadingTier::from_level(3))
        );
    }

    #[test]
    fn test_spacing_lines() {
        let t = Typography::default();
        // 12pt body at 1.5 line pitch = 18pt per line; 360 twips = 18pt.
        assert!((t.spacing_lines(360) - 1.0).abs() < f32::EPSILON);
        assert!((t.spacing_lines(0)).abs() < f32::EPSILON);
    }

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb("FF0000"), (1.0, 0.0, 0.0));
        assert_eq!(hex_to_rgb("#000000"), (0.0, 0.0, 0.0));
        assert_eq!(hex_to_rgb("nope"), (0.0, 0.0, 0.0));
        let (r, g, b) = hex_to_rgb("CCCCCC");
        assert!((r - 0.8).abs() < 0.01 && r == g && g == b);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let t: Typography = toml::from_str("[sizes]\nbody = 11.0\n").unwrap();
        assert_eq!(t.sizes.body, 11.0);
        assert_eq!(t.sizes.h1, 20.0);
        assert_eq!(t.fonts.body, "Charter");
    }
}
