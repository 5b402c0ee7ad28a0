//! Block-level traversal shared by every export backend.
//!
//! [`walk_blocks`] owns the structural policy: list context and ordinal
//! counters, heading tiers, blockquote scope, and per-token error
//! isolation. Backends only implement [`BlockSink`], receiving one call per
//! rendered block. The DOCX backend builds a tree of paragraphs from those
//! calls, the PDF backend draws them onto a paginating canvas.

mod typography;

pub use typography::{
    Colors, Fonts, HeadingTier, PageSetup, Sizes, Spacing, Typography, hex_to_rgb, twips_to_pt,
};

use crate::error::Result;
use crate::markdown::{InlineToken, StyledRun, Token, format_inline, is_blank, plain_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Ordered,
}

/// Label in front of a list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarker {
    Bullet,
    Ordinal(u32),
}

impl ListMarker {
    /// Prefix text including the trailing space, e.g. `"3. "`.
    pub fn label(&self, bullet: &str) -> String {
        match self {
            ListMarker::Bullet => format!("{bullet} "),
            ListMarker::Ordinal(n) => format!("{n}. "),
        }
    }
}

/// Receiver of rendered blocks.
///
/// An `Err` from any method drops that one block; the walk continues.
pub trait BlockSink {
    fn heading(&mut self, tier: HeadingTier, runs: &[StyledRun]) -> Result<()>;

    /// Body paragraph; `in_list` is set for extra paragraphs of a list item.
    fn paragraph(&mut self, runs: &[StyledRun], in_list: bool) -> Result<()>;

    /// First paragraph of a list item. `depth` is 0 for top-level lists.
    fn list_item(&mut self, marker: ListMarker, depth: usize, runs: &[StyledRun]) -> Result<()>;

    /// A list closed; emit the trailing spacer.
    fn list_end(&mut self) -> Result<()>;

    fn blockquote(&mut self, text: &str) -> Result<()>;

    fn code_block(&mut self, text: &str) -> Result<()>;

    fn rule(&mut self) -> Result<()>;
}

/// Counts from one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkReport {
    /// Blocks the sink accepted.
    pub blocks: usize,
    /// Tokens whose block was dropped after a sink error.
    pub errors: usize,
}

#[derive(Debug, Clone, Copy)]
struct ListContext {
    kind: ListKind,
    counter: u32,
}

impl ListContext {
    fn new(kind: ListKind) -> Self {
        Self { kind, counter: 1 }
    }

    /// Marker for the next item; only ordered lists advance the counter.
    fn next_marker(&mut self) -> ListMarker {
        match self.kind {
            ListKind::Bullet => ListMarker::Bullet,
            ListKind::Ordered => {
                let n = self.counter;
                self.counter += 1;
                ListMarker::Ordinal(n)
            }
        }
    }
}

#[derive(Default)]
struct Walker {
    lists: Vec<ListContext>,
    quote_depth: usize,
    report: WalkReport,
}

/// Walk one chapter's token stream, feeding each block to `sink`.
///
/// Never fails: a token whose block cannot be rendered is logged and
/// skipped, and structure that does not match the expected shape (such as
/// a heading open without inline content) is stepped over one token at a
/// time.
pub fn walk_blocks<S: BlockSink + ?Sized>(tokens: &[Token], sink: &mut S) -> WalkReport {
    let mut walker = Walker::default();
    let mut i = 0;

    while i < tokens.len() {
        match walker.step(tokens, i, sink) {
            Ok(next) => i = next.max(i + 1),
            Err(e) => {
                log::warn!("error processing token {}: {e}", tokens[i].kind());
                walker.report.errors += 1;
                i += 1;
            }
        }
    }

    walker.report
}

impl Walker {
    /// Handle the token at `i`, returning the index of the next token.
    fn step<S: BlockSink + ?Sized>(&mut self, tokens: &[Token], i: usize, sink: &mut S) -> Result<usize> {
        match &tokens[i] {
            Token::HeadingOpen(level) => {
                let Some(children) = inline_at(tokens, i + 1) else {
                    return Ok(i + 1);
                };
                let runs = format_inline(children);
                if !is_blank(&runs) {
                    sink.heading(HeadingTier::from_level(*level), &runs)?;
                    self.report.blocks += 1;
                }
                Ok(skip_if(tokens, i + 2, &Token::HeadingClose))
            }

            Token::ParagraphOpen => {
                let Some(children) = inline_at(tokens, i + 1) else {
                    return Ok(i + 1);
                };
                let next = skip_if(tokens, i + 2, &Token::ParagraphClose);
                let runs = format_inline(children);
                if is_blank(&runs) {
                    return Ok(next);
                }
                if self.quote_depth > 0 {
                    sink.blockquote(plain_text(children).trim())?;
                } else {
                    sink.paragraph(&runs, !self.lists.is_empty())?;
                }
                self.report.blocks += 1;
                Ok(next)
            }

            Token::ListItemOpen => {
                if tokens.get(i + 1) != Some(&Token::ParagraphOpen) {
                    return Ok(i + 1);
                }
                let Some(children) = inline_at(tokens, i + 2) else {
                    return Ok(i + 1);
                };
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(list) => list.next_marker(),
                    None => ListMarker::Bullet,
                };
                let next = skip_if(tokens, i + 3, &Token::ParagraphClose);
                let runs = format_inline(children);
                sink.list_item(marker, depth, &runs)?;
                self.report.blocks += 1;
                Ok(next)
            }

            Token::BulletListOpen => {
                self.lists.push(ListContext::new(ListKind::Bullet));
                Ok(i + 1)
            }
            Token::OrderedListOpen => {
                self.lists.push(ListContext::new(ListKind::Ordered));
                Ok(i + 1)
            }
            Token::BulletListClose | Token::OrderedListClose => {
                self.lists.pop();
                sink.list_end()?;
                Ok(i + 1)
            }

            Token::BlockquoteOpen => {
                self.quote_depth += 1;
                Ok(i + 1)
            }
            Token::BlockquoteClose => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                Ok(i + 1)
            }

            Token::CodeBlock(content) => {
                sink.code_block(content.trim_end_matches('\n'))?;
                self.report.blocks += 1;
                Ok(i + 1)
            }

            Token::Rule => {
                sink.rule()?;
                self.report.blocks += 1;
                Ok(i + 1)
            }

            // Closers consumed above, stray inline content and raw HTML.
            Token::HeadingClose
            | Token::ParagraphClose
            | Token::ListItemClose
            | Token::Inline(_)
            | Token::Html(_) => Ok(i + 1),
        }
    }
}

fn inline_at(tokens: &[Token], i: usize) -> Option<&[InlineToken]> {
    match tokens.get(i) {
        Some(Token::Inline(children)) => Some(children),
        _ => None,
    }
}

/// Step past `expected` at `i` if present.
fn skip_if(tokens: &[Token], i: usize, expected: &Token) -> usize {
    if tokens.get(i) == Some(expected) { i + 1 } else { i }
}
