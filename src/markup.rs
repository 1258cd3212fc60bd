//! Markdown-lite inline formatting for message text.
//!
//! Only `**bold**`, `*italic*` and line breaks are recognised. Markers are
//! matched left to right, shortest span first; a marker without a partner
//! stays literal. Formatting is purely presentational: text is never
//! interpreted beyond choosing a style for it.

use crossterm::style::Stylize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Plain,
    Bold,
    Italic,
    BoldItalic,
}

impl Emphasis {
    fn with_italic(self) -> Self {
        match self {
            Emphasis::Plain | Emphasis::Italic => Emphasis::Italic,
            Emphasis::Bold | Emphasis::BoldItalic => Emphasis::BoldItalic,
        }
    }
}

/// A run of text sharing one emphasis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub emphasis: Emphasis,
}

impl Segment {
    pub fn new(text: impl Into<String>, emphasis: Emphasis) -> Self {
        Self {
            text: text.into(),
            emphasis,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Emphasis::Plain)
    }
}

/// Parse message text into lines of styled segments
pub fn parse(text: &str) -> Vec<Vec<Segment>> {
    text.split('\n').map(parse_line).collect()
}

fn parse_line(line: &str) -> Vec<Segment> {
    let mut segments = Vec::new();

    for (piece, bold) in split_pairs(line, "**") {
        let base = if bold { Emphasis::Bold } else { Emphasis::Plain };
        for (inner, italic) in split_pairs(&piece, "*") {
            if inner.is_empty() {
                continue;
            }
            let emphasis = if italic { base.with_italic() } else { base };
            segments.push(Segment::new(inner, emphasis));
        }
    }

    segments
}

/// Split `text` into (piece, enclosed) pairs on non-greedy `delim ... delim` spans
fn split_pairs(text: &str, delim: &str) -> Vec<(String, bool)> {
    let mut pieces = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(delim) {
        let after = &rest[start + delim.len()..];
        let Some(end) = after.find(delim) else {
            break;
        };
        pieces.push((rest[..start].to_string(), false));
        pieces.push((after[..end].to_string(), true));
        rest = &after[end + delim.len()..];
    }

    pieces.push((rest.to_string(), false));
    pieces
}

/// Word-wrap one parsed line to `width` columns, keeping emphasis intact.
///
/// Runs of whitespace collapse to a single space. Words longer than the
/// width are split across lines rather than truncated.
pub fn wrap(line: &[Segment], width: usize) -> Vec<Vec<Segment>> {
    let words = words(line);
    if width == 0 || words.is_empty() {
        return vec![merge(line.iter().flat_map(|s| s.text.chars().map(move |c| (c, s.emphasis))))];
    }

    let mut lines: Vec<Vec<(char, Emphasis)>> = Vec::new();
    let mut current: Vec<(char, Emphasis)> = Vec::new();

    for word in words {
        for chunk in word.chunks(width) {
            let needed = if current.is_empty() {
                chunk.len()
            } else {
                current.len() + 1 + chunk.len()
            };

            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if let (Some(&(_, prev)), Some(&(_, next))) = (current.last(), chunk.first()) {
                let space = if prev == next { prev } else { Emphasis::Plain };
                current.push((' ', space));
            }
            current.extend_from_slice(chunk);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines.into_iter().map(merge).collect()
}

fn words(line: &[Segment]) -> Vec<Vec<(char, Emphasis)>> {
    let mut words = Vec::new();
    let mut word = Vec::new();

    for segment in line {
        for c in segment.text.chars() {
            if c.is_whitespace() {
                if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
            } else {
                word.push((c, segment.emphasis));
            }
        }
    }
    if !word.is_empty() {
        words.push(word);
    }

    words
}

fn merge(chars: impl IntoIterator<Item = (char, Emphasis)>) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    for (c, emphasis) in chars {
        match segments.last_mut() {
            Some(last) if last.emphasis == emphasis => last.text.push(c),
            _ => segments.push(Segment::new(c.to_string(), emphasis)),
        }
    }
    segments
}

/// Text with the markers removed
pub fn to_plain(text: &str) -> String {
    parse(text)
        .iter()
        .map(|line| line.iter().map(|s| s.text.as_str()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text with emphasis rendered as terminal escape sequences
pub fn to_ansi(text: &str) -> String {
    parse(text)
        .iter()
        .map(|line| {
            line.iter()
                .map(|segment| {
                    let text = segment.text.as_str();
                    match segment.emphasis {
                        Emphasis::Plain => text.to_string(),
                        Emphasis::Bold => text.bold().to_string(),
                        Emphasis::Italic => text.italic().to_string(),
                        Emphasis::BoldItalic => text.bold().italic().to_string(),
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
