//! Flow backend: markdown blocks as a tree of styled paragraphs.

use crate::error::Result;
use crate::markdown::{StyledRun, Token};
use crate::render::{BlockSink, HeadingTier, ListMarker, Typography, WalkReport, walk_blocks};

use super::xml::{Align, Border, Paragraph, ParagraphSpacing, TextRun};

/// One block of chapter content, before styling.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedBlock {
    Heading { tier: HeadingTier, runs: Vec<StyledRun> },
    Paragraph { runs: Vec<StyledRun>, in_list: bool },
    /// `label` is the bullet glyph or `"<n>. "` prefix.
    ListItem { label: String, depth: usize, runs: Vec<StyledRun> },
    Blockquote(String),
    CodeBlock(String),
    Rule,
    /// Blank paragraph after a list.
    Spacer,
}

/// [`BlockSink`] collecting [`RenderedBlock`]s.
#[derive(Debug, Default)]
pub struct FlowBuilder {
    bullet: String,
    blocks: Vec<RenderedBlock>,
}

impl FlowBuilder {
    pub fn new(bullet: impl Into<String>) -> Self {
        Self {
            bullet: bullet.into(),
            blocks: Vec::new(),
        }
    }

    pub fn into_blocks(self) -> Vec<RenderedBlock> {
        self.blocks
    }
}

impl BlockSink for FlowBuilder {
    fn heading(&mut self, tier: HeadingTier, runs: &[StyledRun]) -> Result<()> {
        self.blocks.push(RenderedBlock::Heading {
            tier,
            runs: runs.to_vec(),
        });
        Ok(())
    }

    fn paragraph(&mut self, runs: &[StyledRun], in_list: bool) -> Result<()> {
        self.blocks.push(RenderedBlock::Paragraph {
            runs: runs.to_vec(),
            in_list,
        });
        Ok(())
    }

    fn list_item(&mut self, marker: ListMarker, depth: usize, runs: &[StyledRun]) -> Result<()> {
        self.blocks.push(RenderedBlock::ListItem {
            label: marker.label(&self.bullet),
            depth,
            runs: runs.to_vec(),
        });
        Ok(())
    }

    fn list_end(&mut self) -> Result<()> {
        self.blocks.push(RenderedBlock::Spacer);
        Ok(())
    }

    fn blockquote(&mut self, text: &str) -> Result<()> {
        self.blocks.push(RenderedBlock::Blockquote(text.to_string()));
        Ok(())
    }

    fn code_block(&mut self, text: &str) -> Result<()> {
        self.blocks.push(RenderedBlock::CodeBlock(text.to_string()));
        Ok(())
    }

    fn rule(&mut self) -> Result<()> {
        self.blocks.push(RenderedBlock::Rule);
        Ok(())
    }
}

/// Build the block list for one chapter body.
pub fn build_blocks(tokens: &[Token], typography: &Typography) -> (Vec<RenderedBlock>, WalkReport) {
    let mut builder = FlowBuilder::new(typography.bullet.as_str());
    let report = walk_blocks(tokens, &mut builder);
    (builder.into_blocks(), report)
}

/// Apply typography to a block, producing its WordprocessingML paragraph.
pub(super) fn block_paragraph(block: &RenderedBlock, t: &Typography) -> Paragraph {
    match block {
        RenderedBlock::Heading { tier, runs } => Paragraph {
            style: Some(heading_style(*tier)),
            spacing: Some(ParagraphSpacing {
                before: t.spacing.heading_before,
                after: t.spacing.heading_after,
                line: None,
            }),
            keep_next: true,
            runs: runs
                .iter()
                .map(|run| {
                    let font = if run.code { &t.fonts.code } else { &t.fonts.heading };
                    styled_run(run, t)
                        .font(font.as_str())
                        .size(t.heading_size(*tier))
                        .bold(true)
                        .color(t.colors.heading.as_str())
                })
                .map(super::xml::Run::Text)
                .collect(),
            ..Paragraph::default()
        },

        RenderedBlock::Paragraph { runs, in_list } => {
            let (before, after) = if *in_list {
                (t.spacing.list_item, t.spacing.list_item)
            } else {
                (t.spacing.paragraph_before, t.spacing.paragraph_after)
            };
            let mut paragraph = Paragraph {
                align: Some(Align::Justify),
                spacing: Some(ParagraphSpacing {
                    before,
                    after,
                    line: Some(t.spacing.line),
                }),
                indent_left: in_list.then_some(t.list_indent),
                ..Paragraph::default()
            };
            for run in runs {
                paragraph = paragraph.with_run(styled_run(run, t));
            }
            paragraph
        }

        RenderedBlock::ListItem { label, depth, runs } => {
            let mut paragraph = Paragraph {
                align: Some(Align::Left),
                spacing: Some(ParagraphSpacing {
                    before: t.spacing.list_item,
                    after: t.spacing.list_item,
                    line: None,
                }),
                indent_left: Some(t.list_indent_at(*depth)),
                ..Paragraph::default()
            }
            .with_run(
                TextRun::new(label.as_str())
                    .font(t.fonts.body.as_str())
                    .size(t.sizes.body),
            );
            for run in runs {
                paragraph = paragraph.with_run(styled_run(run, t));
            }
            paragraph
        }

        RenderedBlock::Blockquote(text) => Paragraph {
            align: Some(Align::Justify),
            spacing: Some(ParagraphSpacing {
                before: t.spacing.block,
                after: t.spacing.block,
                line: None,
            }),
            indent_left: Some(t.list_indent),
            border_left: Some(Border::new(t.colors.quote_border.as_str(), 24)),
            ..Paragraph::default()
        }
        .with_run(
            TextRun::new(text.as_str())
                .font(t.fonts.body.as_str())
                .size(t.sizes.body)
                .italic(true)
                .color(t.colors.quote.as_str()),
        ),

        RenderedBlock::CodeBlock(text) => Paragraph {
            style: Some("Code"),
            spacing: Some(ParagraphSpacing {
                before: t.spacing.block,
                after: t.spacing.block,
                line: None,
            }),
            shading: Some(t.colors.code_background.clone()),
            ..Paragraph::default()
        }
        .with_run(
            TextRun::new(text.as_str())
                .font(t.fonts.code.as_str())
                .size(t.sizes.code)
                .color(t.colors.code.as_str()),
        ),

        RenderedBlock::Rule => Paragraph {
            spacing: Some(ParagraphSpacing {
                before: t.spacing.block,
                after: t.spacing.block,
                line: None,
            }),
            border_bottom: Some(Border::new(t.colors.rule.as_str(), 6)),
            ..Paragraph::default()
        },

        RenderedBlock::Spacer => Paragraph {
            spacing: Some(ParagraphSpacing {
                before: 0,
                after: t.spacing.list_end,
                line: None,
            }),
            ..Paragraph::default()
        },
    }
}

fn heading_style(tier: HeadingTier) -> &'static str {
    match tier {
        HeadingTier::H1 => "Heading1",
        HeadingTier::H2 => "Heading2",
        HeadingTier::H3 => "Heading3",
    }
}

/// Body-styled run honouring the run's own bold/italic/code flags.
fn styled_run(run: &StyledRun, t: &Typography) -> TextRun {
    if run.code {
        return TextRun::new(run.text.as_str())
            .font(t.fonts.code.as_str())
            .size(t.sizes.code)
            .color(t.colors.code.as_str());
    }
    TextRun::new(run.text.as_str())
        .font(t.fonts.body.as_str())
        .size(t.sizes.body)
        .bold(run.bold)
        .italic(run.italic)
        .color(t.colors.text.as_str())
}
