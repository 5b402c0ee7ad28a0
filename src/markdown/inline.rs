//! Inline token → styled run formatting.
//!
//! Bold and italic are independent on/off flags, not counters: a close
//! token for a style that is not open leaves it off. Text accumulates in a
//! buffer tagged with the current flags and is flushed on every flag change
//! and at the end. Inline code becomes its own monospace run immediately.

use super::tokens::InlineToken;

/// A contiguous span of text sharing one formatting state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    /// Monospace run produced by inline code.
    pub code: bool,
}

impl StyledRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            ..Default::default()
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            italic: true,
            ..Default::default()
        }
    }

    pub fn code(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: true,
            ..Default::default()
        }
    }

    fn same_style(&self, other: &StyledRun) -> bool {
        self.bold == other.bold && self.italic == other.italic && self.code == other.code
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Formatting flags threaded through the fold.
#[derive(Debug, Default)]
struct InlineState {
    bold: bool,
    italic: bool,
    buffer: String,
    runs: Vec<StyledRun>,
}

impl InlineState {
    fn step(mut self, token: &InlineToken) -> Self {
        match token {
            InlineToken::Text(text) => self.buffer.push_str(text),
            InlineToken::SoftBreak => self.buffer.push(' '),
            InlineToken::HardBreak => self.buffer.push('\n'),
            InlineToken::StrongOpen => self.toggle(|s| s.bold = true),
            InlineToken::StrongClose => self.toggle(|s| s.bold = false),
            InlineToken::EmOpen => self.toggle(|s| s.italic = true),
            InlineToken::EmClose => self.toggle(|s| s.italic = false),
            InlineToken::CodeInline(code) => {
                self.flush();
                push_run(&mut self.runs, StyledRun::code(code.as_str()));
            }
        }
        self
    }

    fn toggle(&mut self, change: impl FnOnce(&mut Self)) {
        self.flush();
        change(self);
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let run = StyledRun {
            text: std::mem::take(&mut self.buffer),
            bold: self.bold,
            italic: self.italic,
            code: false,
        };
        push_run(&mut self.runs, run);
    }

    fn finish(mut self) -> Vec<StyledRun> {
        self.flush();
        self.runs
    }
}

/// Append a run, merging it into the previous one when the style matches.
fn push_run(runs: &mut Vec<StyledRun>, run: StyledRun) {
    if run.text.is_empty() {
        return;
    }
    match runs.last_mut() {
        Some(last) if last.same_style(&run) => last.text.push_str(&run.text),
        _ => runs.push(run),
    }
}

/// Convert inline tokens into coalesced styled runs.
///
/// Only zero-length runs are dropped; whitespace-only runs are kept because
/// they carry the spacing between differently styled words.
pub fn format_inline(tokens: &[InlineToken]) -> Vec<StyledRun> {
    tokens
        .iter()
        .fold(InlineState::default(), InlineState::step)
        .finish()
}

/// Literal text of an inline sequence, ignoring formatting.
pub fn plain_text(tokens: &[InlineToken]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            InlineToken::Text(text) | InlineToken::CodeInline(text) => out.push_str(text),
            InlineToken::SoftBreak => out.push(' '),
            InlineToken::HardBreak => out.push('\n'),
            _ => {}
        }
    }
    out
}

/// True when no run carries visible text.
pub fn is_blank(runs: &[StyledRun]) -> bool {
    runs.iter().all(StyledRun::is_blank)
}
