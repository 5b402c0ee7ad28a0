//! Minimal WordprocessingML model and serializer.
//!
//! Only the paragraph and run properties the exporter emits are modelled.
//! Property elements are written in schema order, which Word enforces.

use quick_xml::escape::escape;

/// One `<w:p>`.
#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    pub style: Option<&'static str>,
    pub align: Option<Align>,
    pub spacing: Option<ParagraphSpacing>,
    /// Left indent in twips.
    pub indent_left: Option<u32>,
    pub border_left: Option<Border>,
    pub border_bottom: Option<Border>,
    /// Background fill, hex RGB.
    pub shading: Option<String>,
    pub keep_next: bool,
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Justify,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParagraphSpacing {
    pub before: u32,
    pub after: u32,
    /// Line pitch in 240ths of a line.
    pub line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Border {
    pub color: String,
    /// Width in eighths of a point.
    pub size: u32,
    pub space: u32,
}

/// Content of a paragraph.
#[derive(Debug, Clone)]
pub enum Run {
    Text(TextRun),
    PageBreak,
    /// Inline picture referencing a relationship id.
    Image(ImageRun),
}

#[derive(Debug, Clone, Default)]
pub struct TextRun {
    pub text: String,
    pub font: Option<String>,
    /// Size in points.
    pub size: Option<f32>,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ImageRun {
    pub rel_id: String,
    pub name: String,
    /// Drawing object id, unique per document.
    pub doc_pr_id: u32,
    pub width_emu: u64,
    pub height_emu: u64,
}

impl Paragraph {
    pub fn with_run(mut self, run: TextRun) -> Self {
        self.runs.push(Run::Text(run));
        self
    }

    /// Paragraph holding only a page break.
    pub fn page_break() -> Self {
        Self {
            runs: vec![Run::PageBreak],
            ..Self::default()
        }
    }

    pub fn write_xml(&self, out: &mut String) {
        out.push_str("<w:p>");
        self.write_properties(out);
        for run in &self.runs {
            run.write_xml(out);
        }
        out.push_str("</w:p>");
    }

    fn write_properties(&self, out: &mut String) {
        let mut props = String::new();

        if let Some(style) = self.style {
            props.push_str(&format!("<w:pStyle w:val=\"{style}\"/>"));
        }
        if self.keep_next {
            props.push_str("<w:keepNext/>");
        }
        if self.border_left.is_some() || self.border_bottom.is_some() {
            props.push_str("<w:pBdr>");
            if let Some(border) = &self.border_left {
                border.write_xml("left", &mut props);
            }
            if let Some(border) = &self.border_bottom {
                border.write_xml("bottom", &mut props);
            }
            props.push_str("</w:pBdr>");
        }
        if let Some(fill) = &self.shading {
            props.push_str(&format!(
                "<w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"{}\"/>",
                escape(fill.as_str())
            ));
        }
        if let Some(spacing) = self.spacing {
            props.push_str(&format!(
                "<w:spacing w:before=\"{}\" w:after=\"{}\"",
                spacing.before, spacing.after
            ));
            if let Some(line) = spacing.line {
                props.push_str(&format!(" w:line=\"{line}\" w:lineRule=\"auto\""));
            }
            props.push_str("/>");
        }
        if let Some(left) = self.indent_left {
            props.push_str(&format!("<w:ind w:left=\"{left}\"/>"));
        }
        if let Some(align) = self.align {
            let val = match align {
                Align::Left => "left",
                Align::Center => "center",
                Align::Justify => "both",
            };
            props.push_str(&format!("<w:jc w:val=\"{val}\"/>"));
        }

        if !props.is_empty() {
            out.push_str("<w:pPr>");
            out.push_str(&props);
            out.push_str("</w:pPr>");
        }
    }
}

impl Border {
    pub fn new(color: impl Into<String>, size: u32) -> Self {
        Self {
            color: color.into(),
            size,
            space: 1,
        }
    }

    fn write_xml(&self, side: &str, out: &mut String) {
        out.push_str(&format!(
            "<w:{side} w:val=\"single\" w:sz=\"{}\" w:space=\"{}\" w:color=\"{}\"/>",
            self.size,
            self.space,
            escape(self.color.as_str())
        ));
    }
}

impl TextRun {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

impl Run {
    fn write_xml(&self, out: &mut String) {
        match self {
            Run::Text(run) => run.write_xml(out),
            Run::PageBreak => out.push_str("<w:r><w:br w:type=\"page\"/></w:r>"),
            Run::Image(image) => image.write_xml(out),
        }
    }
}

impl TextRun {
    fn write_xml(&self, out: &mut String) {
        out.push_str("<w:r>");

        let mut props = String::new();
        if let Some(font) = &self.font {
            let font = escape(font.as_str());
            props.push_str(&format!(
                "<w:rFonts w:ascii=\"{font}\" w:hAnsi=\"{font}\" w:cs=\"{font}\"/>"
            ));
        }
        if self.bold {
            props.push_str("<w:b/><w:bCs/>");
        }
        if self.italic {
            props.push_str("<w:i/><w:iCs/>");
        }
        if let Some(color) = &self.color {
            props.push_str(&format!("<w:color w:val=\"{}\"/>", escape(color.as_str())));
        }
        if let Some(size) = self.size {
            let half_points = half_points(size);
            props.push_str(&format!(
                "<w:sz w:val=\"{half_points}\"/><w:szCs w:val=\"{half_points}\"/>"
            ));
        }
        if !props.is_empty() {
            out.push_str("<w:rPr>");
            out.push_str(&props);
            out.push_str("</w:rPr>");
        }

        write_text_content(&self.text, out);
        out.push_str("</w:r>");
    }
}

impl ImageRun {
    fn write_xml(&self, out: &mut String) {
        let (cx, cy) = (self.width_emu, self.height_emu);
        let name = escape(self.name.as_str());
        out.push_str(&format!(
            concat!(
                "<w:r><w:drawing>",
                "<wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">",
                "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
                "<wp:docPr id=\"{id}\" name=\"{name}\"/>",
                "<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect=\"1\"/></wp:cNvGraphicFramePr>",
                "<a:graphic><a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
                "<pic:pic>",
                "<pic:nvPicPr><pic:cNvPr id=\"0\" name=\"{name}\"/><pic:cNvPicPr/></pic:nvPicPr>",
                "<pic:blipFill><a:blip r:embed=\"{rel}\"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>",
                "<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
                "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>",
                "</pic:pic>",
                "</a:graphicData></a:graphic>",
                "</wp:inline>",
                "</w:drawing></w:r>"
            ),
            cx = cx,
            cy = cy,
            id = self.doc_pr_id,
            name = name,
            rel = escape(self.rel_id.as_str()),
        ));
    }
}

/// Write `<w:t>` segments, turning newlines into `<w:br/>` and tabs into
/// `<w:tab/>`. Characters XML 1.0 cannot carry are dropped.
fn write_text_content(text: &str, out: &mut String) {
    let mut segment = String::new();
    let flush = |segment: &mut String, out: &mut String| {
        if !segment.is_empty() {
            out.push_str("<w:t xml:space=\"preserve\">");
            out.push_str(&escape(segment.as_str()));
            out.push_str("</w:t>");
            segment.clear();
        }
    };

    for c in text.chars() {
        match c {
            '\n' => {
                flush(&mut segment, out);
                out.push_str("<w:br/>");
            }
            '\t' => {
                flush(&mut segment, out);
                out.push_str("<w:tab/>");
            }
            '\r' => {}
            c if c.is_control() => {}
            c => segment.push(c),
        }
    }
    flush(&mut segment, out);
}

/// WordprocessingML sizes are half-points.
pub fn half_points(size: f32) -> u32 {
    (size * 2.0).round().max(1.0) as u32
}

/// Points to English Metric Units.
pub fn pt_to_emu(pt: f32) -> u64 {
    (pt.max(0.0) * 12_700.0).round() as u64
}

/// Points to twentieths of a point.
pub fn pt_to_twips(pt: f32) -> u32 {
    (pt.max(0.0) * 20.0).round() as u32
}
