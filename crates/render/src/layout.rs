//! Greedy line breaking of styled text.

use std::borrow::Cow;

use crate::fonts::{FontKind, FontSet};
use crate::theme::Colour;

/// Text measurement used by the line breaker.
pub trait Measure {
    /// Text as it will be written in `font` (base fonts fold to ASCII).
    fn prepare<'a>(&self, text: &'a str, font: FontKind) -> Cow<'a, str>;

    /// Width in millimetres of prepared `text` at `size` points.
    fn width(&self, text: &str, font: FontKind, size: f32) -> f32;
}

impl Measure for FontSet {
    fn prepare<'a>(&self, text: &'a str, font: FontKind) -> Cow<'a, str> {
        FontSet::prepare(self, text, font)
    }

    fn width(&self, text: &str, font: FontKind, size: f32) -> f32 {
        self.text_width(text, font, size)
    }
}

/// Input fragment. A fragment whose text is exactly `"\n"` forces a break.
#[derive(Debug, Clone, PartialEq)]
pub struct Styled {
    pub text: String,
    pub font: FontKind,
    pub colour: Colour,
    pub strike: bool,
}

impl Styled {
    pub fn new(text: impl Into<String>, font: FontKind, colour: Colour) -> Self {
        Self {
            text: text.into(),
            font,
            colour,
            strike: false,
        }
    }
}

/// Positioned text of one line, `x` relative to the line start.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub font: FontKind,
    pub colour: Colour,
    pub strike: bool,
    pub x: f32,
    pub width: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub runs: Vec<Run>,
    pub width: f32,
}

impl Line {
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn text(&self) -> String {
        let mut text = String::new();
        let mut end = 0.0;
        for run in &self.runs {
            if !text.is_empty() && run.x > end + 0.01 {
                text.push(' ');
            }
            text.push_str(&run.text);
            end = run.x + run.width;
        }
        text
    }

    fn push(&mut self, piece: &Piece, space: f32, width: f32, measure: &impl Measure, size: f32) {
        if let Some(last) = self.runs.last_mut() {
            if last.font == piece.font && last.colour == piece.colour && last.strike == piece.strike
            {
                if space > 0.0 {
                    last.text.push(' ');
                }
                last.text.push_str(&piece.text);
                last.width = measure.width(&last.text, last.font, size);
                self.width = last.x + last.width;
                return;
            }
        }

        let x = self.width + space;
        self.runs.push(Run {
            text: piece.text.clone(),
            font: piece.font,
            colour: piece.colour,
            strike: piece.strike,
            x,
            width,
        });
        self.width = x + width;
    }
}

#[derive(Debug, Clone)]
struct Piece {
    text: String,
    font: FontKind,
    colour: Colour,
    strike: bool,
}

enum Word {
    Text { pieces: Vec<Piece>, space_before: bool },
    Break,
}

/// Break `fragments` into lines no wider than `max_width` millimetres.
///
/// Words are never split unless a single word is wider than a whole line.
/// Pieces of one word with different styles stay on the same line.
pub fn wrap(measure: &impl Measure, fragments: &[Styled], size: f32, max_width: f32) -> Vec<Line> {
    let words = split_words(measure, fragments);

    let mut lines = Vec::new();
    let mut line = Line::default();

    for word in words {
        let (pieces, space_before) = match word {
            Word::Break => {
                lines.push(std::mem::take(&mut line));
                continue;
            }
            Word::Text {
                pieces,
                space_before,
            } => (pieces, space_before),
        };

        let widths: Vec<f32> = pieces
            .iter()
            .map(|piece| measure.width(&piece.text, piece.font, size))
            .collect();
        let word_width: f32 = widths.iter().sum();
        let mut space = if space_before && !line.is_empty() {
            measure.width(" ", pieces[0].font, size)
        } else {
            0.0
        };

        if !line.is_empty() && line.width + space + word_width > max_width {
            lines.push(std::mem::take(&mut line));
            space = 0.0;
        }

        if word_width > max_width {
            push_split(&mut line, &mut lines, &pieces, space, measure, size, max_width);
            continue;
        }

        for (index, (piece, width)) in pieces.iter().zip(widths).enumerate() {
            let gap = if index == 0 { space } else { 0.0 };
            line.push(piece, gap, width, measure, size);
        }
    }

    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

fn split_words(measure: &impl Measure, fragments: &[Styled]) -> Vec<Word> {
    let mut words: Vec<Word> = Vec::new();
    let mut pending_space = false;

    for fragment in fragments {
        if fragment.text == "\n" {
            words.push(Word::Break);
            pending_space = false;
            continue;
        }

        let prepared = measure.prepare(&fragment.text, fragment.font);
        let mut chunk_start = None;
        let mut push_chunk = |chunk: &str, pending_space: &mut bool| {
            let piece = Piece {
                text: chunk.to_string(),
                font: fragment.font,
                colour: fragment.colour,
                strike: fragment.strike,
            };
            match words.last_mut() {
                Some(Word::Text { pieces, .. }) if !*pending_space => pieces.push(piece),
                _ => words.push(Word::Text {
                    pieces: vec![piece],
                    space_before: *pending_space,
                }),
            }
            *pending_space = false;
        };

        for (index, c) in prepared.char_indices() {
            if c.is_whitespace() {
                if let Some(start) = chunk_start.take() {
                    push_chunk(&prepared[start..index], &mut pending_space);
                }
                pending_space = true;
            } else if chunk_start.is_none() {
                chunk_start = Some(index);
            }
        }
        if let Some(start) = chunk_start {
            push_chunk(&prepared[start..], &mut pending_space);
        }
    }

    words
}

/// Place a word wider than the line, breaking it between characters.
fn push_split(
    line: &mut Line,
    lines: &mut Vec<Line>,
    pieces: &[Piece],
    space: f32,
    measure: &impl Measure,
    size: f32,
    max_width: f32,
) {
    let mut gap = space;
    for piece in pieces {
        let mut chunk = String::new();
        let mut chunk_width = 0.0;

        for c in piece.text.chars() {
            let mut buf = [0u8; 4];
            let char_width = measure.width(c.encode_utf8(&mut buf), piece.font, size);

            if line.width + gap + chunk_width + char_width > max_width
                && (!chunk.is_empty() || !line.is_empty())
            {
                if !chunk.is_empty() {
                    let part = Piece {
                        text: std::mem::take(&mut chunk),
                        ..piece.clone()
                    };
                    line.push(&part, gap, chunk_width, measure, size);
                }
                lines.push(std::mem::take(line));
                chunk_width = 0.0;
                gap = 0.0;
            }

            chunk.push(c);
            chunk_width += char_width;
        }

        if !chunk.is_empty() {
            let part = Piece {
                text: chunk,
                ..piece.clone()
            };
            line.push(&part, gap, chunk_width, measure, size);
            gap = 0.0;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Every character is one millimetre wide at 10pt.
    pub(crate) struct FixedWidth;

    impl Measure for FixedWidth {
        fn prepare<'a>(&self, text: &'a str, _font: FontKind) -> Cow<'a, str> {
            Cow::Borrowed(text)
        }

        fn width(&self, text: &str, _font: FontKind, size: f32) -> f32 {
            text.chars().count() as f32 * size / 10.0
        }
    }

    fn plain(text: &str) -> Styled {
        Styled::new(text, FontKind::Regular, Colour::from_u8(0, 0, 0))
    }

    fn texts(lines: &[Line]) -> Vec<String> {
        lines.iter().map(Line::text).collect()
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let lines = wrap(&FixedWidth, &[plain("ala ma kota a kot ma ale")], 10.0, 10.0);
        assert_eq!(texts(&lines), vec!["ala ma", "kota a kot", "ma ale"]);
        assert!(lines.iter().all(|line| line.width <= 10.0));
    }

    #[test]
    fn styled_pieces_of_one_word_stay_together() {
        let bold = Styled::new("kod", FontKind::Bold, Colour::from_u8(0, 0, 0));
        let lines = wrap(
            &FixedWidth,
            &[plain("xxxxxx "), bold, plain("owanie dalej")],
            10.0,
            10.0,
        );

        assert_eq!(lines[0].text(), "xxxxxx");
        assert_eq!(lines[1].runs[0].text, "kod");
        assert_eq!(lines[1].runs[1].text, "owanie");
        assert!((lines[1].runs[1].x - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn overlong_words_are_split() {
        let lines = wrap(&FixedWidth, &[plain("abcdefghijklmnop")], 10.0, 6.0);
        assert_eq!(texts(&lines), vec!["abcdef", "ghijkl", "mnop"]);
    }

    #[test]
    fn hard_breaks_start_new_lines() {
        let lines = wrap(&FixedWidth, &[plain("a"), plain("\n"), plain("b")], 10.0, 50.0);
        assert_eq!(texts(&lines), vec!["a", "b"]);
    }

    #[test]
    fn empty_input_yields_one_empty_line() {
        let lines = wrap(&FixedWidth, &[], 10.0, 50.0);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_empty());
    }
}
