//! Flat block/inline token stream built from pulldown-cmark events.
//!
//! Renderers walk a flat sequence of open/close tokens where every heading
//! and paragraph carries its inline content as a single [`Token::Inline`]
//! directly after the open token:
//!
//! ```text
//! HeadingOpen(2), Inline[..], HeadingClose,
//! BulletListOpen, ListItemOpen, ParagraphOpen, Inline[..], ParagraphClose, ListItemClose, BulletListClose
//! ```
//!
//! pulldown-cmark omits paragraph tags inside tight list items; the adapter
//! wraps that loose inline content in an implicit paragraph so both renderers
//! see one shape.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

/// Block-level token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    HeadingOpen(u8),
    HeadingClose,
    ParagraphOpen,
    ParagraphClose,
    Inline(Vec<InlineToken>),
    BulletListOpen,
    BulletListClose,
    OrderedListOpen,
    OrderedListClose,
    ListItemOpen,
    ListItemClose,
    BlockquoteOpen,
    BlockquoteClose,
    /// Indented or fenced code, content verbatim.
    CodeBlock(String),
    Rule,
    /// Raw HTML block; neither backend renders it.
    Html(String),
}

/// Token inside a heading or paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineToken {
    Text(String),
    StrongOpen,
    StrongClose,
    EmOpen,
    EmClose,
    CodeInline(String),
    SoftBreak,
    HardBreak,
}

impl InlineToken {
    pub fn text(s: impl Into<String>) -> Self {
        InlineToken::Text(s.into())
    }
}

impl Token {
    /// Short name used in log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Token::HeadingOpen(_) => "heading_open",
            Token::HeadingClose => "heading_close",
            Token::ParagraphOpen => "paragraph_open",
            Token::ParagraphClose => "paragraph_close",
            Token::Inline(_) => "inline",
            Token::BulletListOpen => "bullet_list_open",
            Token::BulletListClose => "bullet_list_close",
            Token::OrderedListOpen => "ordered_list_open",
            Token::OrderedListClose => "ordered_list_close",
            Token::ListItemOpen => "list_item_open",
            Token::ListItemClose => "list_item_close",
            Token::BlockquoteOpen => "blockquote_open",
            Token::BlockquoteClose => "blockquote_close",
            Token::CodeBlock(_) => "code_block",
            Token::Rule => "hr",
            Token::Html(_) => "html_block",
        }
    }
}

/// Tokenize markdown into the flat block token stream.
///
/// Pure and deterministic: the same input always yields the same tokens.
pub fn tokenize(markdown: &str) -> Vec<Token> {
    let mut builder = TokenBuilder::default();
    for event in Parser::new(markdown) {
        builder.push(event);
    }
    builder.finish()
}

#[derive(Default)]
struct TokenBuilder {
    tokens: Vec<Token>,
    /// Inline children of the heading/paragraph currently open.
    inline: Option<Vec<InlineToken>>,
    /// The open paragraph was synthesized for loose inline content.
    implicit_paragraph: bool,
    code: Option<String>,
    html: Option<String>,
    /// Depth of `Image` tags; alt text is not rendered.
    image_depth: usize,
}

impl TokenBuilder {
    fn push(&mut self, event: Event<'_>) {
        if let Some(code) = self.code.as_mut() {
            match event {
                Event::Text(text) => code.push_str(&text),
                Event::End(TagEnd::CodeBlock) => {
                    let content = self.code.take().unwrap_or_default();
                    self.tokens.push(Token::CodeBlock(content));
                }
                _ => {}
            }
            return;
        }

        if let Some(html) = self.html.as_mut() {
            match event {
                Event::Html(text) | Event::Text(text) => html.push_str(&text),
                Event::End(TagEnd::HtmlBlock) => {
                    let content = self.html.take().unwrap_or_default();
                    self.tokens.push(Token::Html(content));
                }
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.inline_token(InlineToken::Text(text.into_string())),
            Event::Code(code) => self.inline_token(InlineToken::CodeInline(code.into_string())),
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                self.inline_token(InlineToken::CodeInline(math.into_string()))
            }
            Event::SoftBreak => self.inline_token(InlineToken::SoftBreak),
            Event::HardBreak => self.inline_token(InlineToken::HardBreak),
            Event::Rule => {
                self.close_implicit_paragraph();
                self.tokens.push(Token::Rule);
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.inline_token(InlineToken::Text(marker.to_string()));
            }
            // Inline HTML and footnote references have no printed form.
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.close_implicit_paragraph();
                self.tokens.push(Token::ParagraphOpen);
                self.inline = Some(Vec::new());
            }
            Tag::Heading { level, .. } => {
                self.close_implicit_paragraph();
                self.tokens.push(Token::HeadingOpen(level as u8));
                self.inline = Some(Vec::new());
            }
            Tag::BlockQuote { .. } => {
                self.close_implicit_paragraph();
                self.tokens.push(Token::BlockquoteOpen);
            }
            Tag::CodeBlock(_) => {
                self.close_implicit_paragraph();
                self.code = Some(String::new());
            }
            Tag::HtmlBlock => {
                self.close_implicit_paragraph();
                self.html = Some(String::new());
            }
            Tag::List(start) => {
                self.close_implicit_paragraph();
                self.tokens.push(match start {
                    Some(_) => Token::OrderedListOpen,
                    None => Token::BulletListOpen,
                });
            }
            Tag::Item => {
                self.close_implicit_paragraph();
                self.tokens.push(Token::ListItemOpen);
            }
            Tag::Strong => self.inline_token(InlineToken::StrongOpen),
            Tag::Emphasis => self.inline_token(InlineToken::EmOpen),
            Tag::Image { .. } => self.image_depth += 1,
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush_inline();
                self.tokens.push(Token::ParagraphClose);
                self.implicit_paragraph = false;
            }
            TagEnd::Heading(_) => {
                self.flush_inline();
                self.tokens.push(Token::HeadingClose);
            }
            TagEnd::BlockQuote { .. } => {
                self.close_implicit_paragraph();
                self.tokens.push(Token::BlockquoteClose);
            }
            TagEnd::List(ordered) => {
                self.close_implicit_paragraph();
                self.tokens.push(if ordered {
                    Token::OrderedListClose
                } else {
                    Token::BulletListClose
                });
            }
            TagEnd::Item => {
                self.close_implicit_paragraph();
                self.tokens.push(Token::ListItemClose);
            }
            TagEnd::Strong => self.inline_token(InlineToken::StrongClose),
            TagEnd::Emphasis => self.inline_token(InlineToken::EmClose),
            TagEnd::Image => self.image_depth = self.image_depth.saturating_sub(1),
            _ => {}
        }
    }

    fn inline_token(&mut self, token: InlineToken) {
        if self.image_depth > 0 {
            return;
        }
        if self.inline.is_none() {
            self.tokens.push(Token::ParagraphOpen);
            self.inline = Some(Vec::new());
            self.implicit_paragraph = true;
        }
        if let Some(inline) = self.inline.as_mut() {
            inline.push(token);
        }
    }

    fn flush_inline(&mut self) {
        if let Some(children) = self.inline.take() {
            self.tokens.push(Token::Inline(children));
        }
    }

    fn close_implicit_paragraph(&mut self) {
        if self.implicit_paragraph {
            self.flush_inline();
            self.tokens.push(Token::ParagraphClose);
            self.implicit_paragraph = false;
        }
    }

    fn finish(mut self) -> Vec<Token> {
        self.close_implicit_paragraph();
        self.tokens
    }
}
