//! Line breaking for the cursor backend.
//!
//! Built-in PDF fonts come without metrics we can query, so widths are
//! estimated from per-character classes. The estimate only has to be close
//! enough that justified lines do not visibly overrun the margin.

use crate::markdown::StyledRun;

use super::canvas::FontFamily;

/// Style of one fragment of a word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FragmentStyle {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

impl FragmentStyle {
    fn of(run: &StyledRun) -> Self {
        Self {
            bold: run.bold,
            italic: run.italic,
            code: run.code,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub style: FragmentStyle,
}

/// Unbreakable unit; one word may span several styled fragments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Word {
    pub fragments: Vec<Fragment>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Word(Word),
    /// Forced line end from a hard break.
    Break,
}

/// One laid out line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub words: Vec<Word>,
    /// Width of the words plus single spaces between them.
    pub natural_width: f32,
    /// Last line of the paragraph or ended by a hard break; never justified.
    pub ends_paragraph: bool,
}

/// Width estimate for one font family at one size.
#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    pub family: FontFamily,
    pub size: f32,
}

impl Metrics {
    pub fn new(family: FontFamily, size: f32) -> Self {
        Self { family, size }
    }

    pub fn char_width(&self, c: char, style: FragmentStyle) -> f32 {
        let family = if style.code { FontFamily::Mono } else { self.family };
        let em = match family {
            FontFamily::Mono => 0.6,
            FontFamily::Serif => proportional_em(c),
            FontFamily::Sans => proportional_em(c) * 1.1,
        };
        let weight = if style.bold && family != FontFamily::Mono { 1.05 } else { 1.0 };
        em * weight * self.size
    }

    pub fn text_width(&self, text: &str, style: FragmentStyle) -> f32 {
        text.chars().map(|c| self.char_width(c, style)).sum()
    }

    pub fn word_width(&self, word: &Word) -> f32 {
        word.fragments
            .iter()
            .map(|f| self.text_width(&f.text, f.style))
            .sum()
    }

    pub fn space_width(&self) -> f32 {
        self.char_width(' ', FragmentStyle::default())
    }
}

fn proportional_em(c: char) -> f32 {
    match c {
        ' ' => 0.25,
        'i' | 'j' | 'l' | 't' | 'f' | 'r' | 'I' | '.' | ',' | ';' | ':' | '!' | '|' | '\'' => 0.3,
        'm' | 'w' | 'M' | 'W' | '@' | '%' => 0.8,
        c if c.is_ascii_uppercase() || c.is_ascii_digit() => 0.62,
        _ => 0.5,
    }
}

/// Split styled runs into words at whitespace. Newlines from hard breaks
/// become [`Item::Break`].
pub fn split_words(runs: &[StyledRun]) -> Vec<Item> {
    let mut items = Vec::new();
    let mut word = Word::default();

    for run in runs {
        let style = FragmentStyle::of(run);
        for c in run.text.chars() {
            if c == '\n' {
                end_word(&mut word, &mut items);
                items.push(Item::Break);
            } else if c.is_whitespace() {
                end_word(&mut word, &mut items);
            } else {
                match word.fragments.last_mut() {
                    Some(fragment) if fragment.style == style => fragment.text.push(c),
                    _ => word.fragments.push(Fragment {
                        text: c.to_string(),
                        style,
                    }),
                }
            }
        }
    }
    end_word(&mut word, &mut items);
    items
}

fn end_word(word: &mut Word, items: &mut Vec<Item>) {
    if !word.fragments.is_empty() {
        items.push(Item::Word(std::mem::take(word)));
    }
}

/// Greedy line breaking. The first line is `first_width` wide, the rest
/// `rest_width`. A word wider than the line gets a line of its own.
pub fn wrap(items: &[Item], metrics: &Metrics, first_width: f32, rest_width: f32) -> Vec<Line> {
    let space = metrics.space_width();
    let mut lines = Vec::new();
    let mut line = Line::default();

    for item in items {
        match item {
            Item::Break => {
                line.ends_paragraph = true;
                lines.push(std::mem::take(&mut line));
            }
            Item::Word(word) => {
                let width = metrics.word_width(word);
                let available = if lines.is_empty() { first_width } else { rest_width };
                if !line.words.is_empty() && line.natural_width + space + width > available {
                    lines.push(std::mem::take(&mut line));
                }
                if !line.words.is_empty() {
                    line.natural_width += space;
                }
                line.natural_width += width;
                line.words.push(word.clone());
            }
        }
    }

    if !line.words.is_empty() {
        line.ends_paragraph = true;
        lines.push(line);
    } else if let Some(last) = lines.last_mut() {
        last.ends_paragraph = true;
    }
    lines
}

/// Width of each gap between words when `line` is stretched to `width`.
pub fn justified_gap(line: &Line, metrics: &Metrics, width: f32) -> f32 {
    let space = metrics.space_width();
    let gaps = line.words.len().saturating_sub(1);
    if line.ends_paragraph || gaps == 0 || line.natural_width >= width {
        return space;
    }
    space + (width - line.natural_width) / gaps as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn metrics() -> Metrics {
        Metrics::new(FontFamily::Serif, 12.0)
    }

    fn words(line: &Line) -> Vec<String> {
        line.words
            .iter()
            .map(|w| w.fragments.iter().map(|f| f.text.as_str()).collect())
            .collect()
    }

    #[test]
    fn test_split_words_joins_fragments_across_runs() {
        let runs = vec![StyledRun::plain("say "), StyledRun::bold("hel"), StyledRun::plain("lo, world")];
        let items = split_words(&runs);
        assert_eq!(items.len(), 3);
        let Item::Word(word) = &items[1] else {
            panic!("expected word");
        };
        assert_eq!(word.fragments.len(), 2);
        assert!(word.fragments[0].style.bold);
        assert_eq!(word.fragments[1].text, "lo,");
    }

    #[test]
    fn test_hard_break_ends_line() {
        let items = split_words(&[StyledRun::plain("one\ntwo")]);
        let lines = wrap(&items, &metrics(), 500.0, 500.0);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_paragraph);
        assert_eq!(words(&lines[1]), vec!["two"]);
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(10);
        let items = split_words(&[StyledRun::plain(text)]);
        let m = metrics();
        let lines = wrap(&items, &m, 200.0, 300.0);
        assert!(lines.len() > 2);
        assert!(lines[0].natural_width <= 200.0);
        assert!(lines[1..].iter().all(|l| l.natural_width <= 300.0));
        assert!(lines.last().unwrap().ends_paragraph);
        assert!(!lines[0].ends_paragraph);
    }

    #[test]
    fn test_overlong_word_gets_own_line() {
        let items = split_words(&[StyledRun::plain("a supercalifragilistic b")]);
        let lines = wrap(&items, &metrics(), 30.0, 30.0);
        assert_eq!(lines.len(), 3);
        assert_eq!(words(&lines[1]), vec!["supercalifragilistic"]);
    }

    #[test]
    fn test_justified_gap() {
        let m = metrics();
        let items = split_words(&[StyledRun::plain("aa bb cc dd ee ff gg hh")]);
        let lines = wrap(&items, &m, 60.0, 60.0);
        let first = &lines[0];
        let gap = justified_gap(first, &m, 60.0);
        let gaps = (first.words.len() - 1) as f32;
        let stretched = first.natural_width - gaps * m.space_width() + gaps * gap;
        assert!((stretched - 60.0).abs() < 0.01);

        let last = lines.last().unwrap();
        assert_eq!(justified_gap(last, &m, 60.0), m.space_width());
    }

    #[test]
    fn test_mono_is_fixed_pitch() {
        let m = Metrics::new(FontFamily::Mono, 10.0);
        let style = FragmentStyle::default();
        assert_eq!(m.text_width("iiii", style), m.text_width("MMMM", style));
        assert!((m.text_width("abc", style) - 18.0).abs() < 0.001);
    }

    proptest! {
        #[test]
        fn test_wrap_keeps_every_word(text in "[a-z ]{0,200}") {
            let items = split_words(&[StyledRun::plain(text.clone())]);
            let lines = wrap(&items, &metrics(), 80.0, 120.0);
            let rejoined: Vec<String> = lines.iter().flat_map(words).collect();
            let expected: Vec<String> = text.split_whitespace().map(str::to_string).collect();
            prop_assert_eq!(rejoined, expected);
        }
    }
}
