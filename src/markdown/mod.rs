//! Markdown input side of the rendering pipeline.
//!
//! - [`tokens`]: adapts pulldown-cmark events into a flat open/close token
//!   stream with inline children
//! - [`inline`]: folds inline tokens into coalesced [`StyledRun`]s
//!
//! Both modules are pure; nothing here performs I/O.

mod inline;
mod tokens;

pub use inline::{StyledRun, format_inline, is_blank, plain_text};
pub use tokens::{InlineToken, Token, tokenize};
