//! Markdown to a flat list of printable blocks.
//!
//! The PDF flow only needs to know what to draw, so nested Markdown structure
//! is flattened: list items carry their depth and marker, quote paragraphs are
//! their own block kind and table cells hold styled spans.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
    pub link: bool,
    pub strike: bool,
}

/// A run of text with uniform style. A `"\n"` span is a hard line break.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: SpanStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, spans: Vec<Span> },
    Paragraph(Vec<Span>),
    /// One list item paragraph; continuation paragraphs have an empty marker.
    ListItem {
        depth: usize,
        marker: String,
        spans: Vec<Span>,
    },
    Quote(Vec<Span>),
    Code(Vec<String>),
    Rule,
    Table {
        header: Vec<Vec<Span>>,
        rows: Vec<Vec<Vec<Span>>>,
    },
}

/// Plain text of a span list, used for heading bookmarks and tests.
pub fn plain_text(spans: &[Span]) -> String {
    spans.iter().map(|span| span.text.as_str()).collect()
}

pub fn parse(markdown: &str) -> Vec<Block> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut builder = BlockBuilder::default();
    for event in Parser::new_ext(markdown, options) {
        builder.event(event);
    }
    builder.finish()
}

#[derive(Default)]
struct TableState {
    header: Vec<Vec<Span>>,
    rows: Vec<Vec<Vec<Span>>>,
    row: Vec<Vec<Span>>,
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    spans: Vec<Span>,
    bold: u32,
    italic: u32,
    strike: u32,
    link: u32,
    heading: Option<u8>,
    code_block: Option<String>,
    quote_depth: u32,
    /// Next number of each open list; `None` for bullet lists.
    lists: Vec<Option<u64>>,
    /// Marker of an item whose first paragraph has not been emitted yet.
    pending_marker: Option<String>,
    table: Option<TableState>,
}

impl BlockBuilder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => match &mut self.code_block {
                Some(code) => code.push_str(&text),
                None => self.push_text(&text, false),
            },
            Event::Code(code) => self.push_text(&code, true),
            Event::SoftBreak => self.push_text(" ", false),
            Event::HardBreak => self.push_text("\n", false),
            Event::Rule => {
                self.flush();
                self.blocks.push(Block::Rule);
            }
            Event::TaskListMarker(checked) => {
                self.push_text(if checked { "[x] " } else { "[ ] " }, false)
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                // Tight items carry no paragraph; loose ones start here.
                if self.pending_marker.is_none() {
                    self.flush();
                }
            }
            Tag::Heading { level, .. } => {
                self.flush();
                self.heading = Some(heading_level(level));
            }
            Tag::BlockQuote => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                if let CodeBlockKind::Fenced(lang) = &kind {
                    tracing::trace!(lang = %lang, "fenced code block");
                }
                self.code_block = Some(String::new());
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let marker = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{number}.");
                        *number += 1;
                        marker
                    }
                    _ => "•".to_string(),
                };
                self.pending_marker = Some(marker);
            }
            Tag::Table(_) => {
                self.flush();
                self.table = Some(TableState::default());
            }
            Tag::TableCell => self.spans.clear(),
            Tag::Emphasis => self.italic += 1,
            Tag::Strong => self.bold += 1,
            Tag::Strikethrough => self.strike += 1,
            Tag::Link { .. } => self.link += 1,
            // Images are not fetched; their alt text is shown in italics.
            Tag::Image { .. } => self.italic += 1,
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Item => self.flush(),
            TagEnd::Heading(_) => {
                let spans = std::mem::take(&mut self.spans);
                if let Some(level) = self.heading.take() {
                    self.blocks.push(Block::Heading { level, spans });
                }
            }
            TagEnd::BlockQuote => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code_block.take() {
                    let lines = code.trim_end_matches('\n').lines().map(str::to_string).collect();
                    self.blocks.push(Block::Code(lines));
                }
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
            }
            TagEnd::TableCell => {
                let cell = std::mem::take(&mut self.spans);
                if let Some(table) = &mut self.table {
                    table.row.push(cell);
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = &mut self.table {
                    table.header = std::mem::take(&mut table.row);
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = &mut self.table {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.blocks.push(Block::Table {
                        header: table.header,
                        rows: table.rows,
                    });
                }
            }
            TagEnd::Emphasis | TagEnd::Image => self.italic = self.italic.saturating_sub(1),
            TagEnd::Strong => self.bold = self.bold.saturating_sub(1),
            TagEnd::Strikethrough => self.strike = self.strike.saturating_sub(1),
            TagEnd::Link => self.link = self.link.saturating_sub(1),
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str, code: bool) {
        let style = SpanStyle {
            bold: self.bold > 0,
            italic: self.italic > 0,
            code,
            link: self.link > 0,
            strike: self.strike > 0,
        };

        match self.spans.last_mut() {
            Some(last) if last.style == style && last.text != "\n" && text != "\n" => {
                last.text.push_str(text)
            }
            _ => self.spans.push(Span {
                text: text.to_string(),
                style,
            }),
        }
    }

    /// Emit buffered inline content as the block the context calls for.
    fn flush(&mut self) {
        if self.table.is_some() || self.heading.is_some() {
            return;
        }

        let spans = std::mem::take(&mut self.spans);
        let has_text = spans.iter().any(|span| !span.text.trim().is_empty());

        if !self.lists.is_empty() {
            if has_text {
                let marker = self.pending_marker.take().unwrap_or_default();
                self.blocks.push(Block::ListItem {
                    depth: self.lists.len(),
                    marker,
                    spans,
                });
            }
            return;
        }

        if !has_text {
            return;
        }

        if self.quote_depth > 0 {
            self.blocks.push(Block::Quote(spans));
        } else {
            self.blocks.push(Block::Paragraph(spans));
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_and_paragraphs() {
        let blocks = parse("# Wstęp\n\nPierwszy akapit\nciąg dalszy.\n\n## Dalej\n");
        assert_eq!(
            blocks,
            vec![
                Block::Heading {
                    level: 1,
                    spans: vec![Span::plain("Wstęp")]
                },
                Block::Paragraph(vec![Span::plain("Pierwszy akapit ciąg dalszy.")]),
                Block::Heading {
                    level: 2,
                    spans: vec![Span::plain("Dalej")]
                },
            ]
        );
    }

    #[test]
    fn inline_styles_are_tracked() {
        let blocks = parse("Zwykły **gruby _oba_** i `kod` oraz [link](https://fotz.pl).");
        let Block::Paragraph(spans) = &blocks[0] else {
            panic!("expected a paragraph, got {blocks:?}");
        };

        let bold_italic = spans.iter().find(|s| s.text == "oba").unwrap();
        assert!(bold_italic.style.bold && bold_italic.style.italic);
        assert!(spans.iter().any(|s| s.text == "kod" && s.style.code));
        assert!(spans.iter().any(|s| s.text == "link" && s.style.link));
        assert_eq!(
            plain_text(spans),
            "Zwykły gruby oba i kod oraz link."
        );
    }

    #[test]
    fn nested_lists_keep_depth_and_numbering() {
        let blocks = parse("1. Pierwszy\n2. Drugi\n   - zagnieżdżony\n3. Trzeci\n");
        let items: Vec<_> = blocks
            .iter()
            .filter_map(|block| match block {
                Block::ListItem { depth, marker, spans } => {
                    Some((*depth, marker.as_str(), plain_text(spans)))
                }
                _ => None,
            })
            .collect();

        assert_eq!(
            items,
            vec![
                (1, "1.", "Pierwszy".to_string()),
                (1, "2.", "Drugi".to_string()),
                (2, "•", "zagnieżdżony".to_string()),
                (1, "3.", "Trzeci".to_string()),
            ]
        );
    }

    #[test]
    fn code_quote_rule_and_table() {
        let markdown = "> Cytat\n\n```rust\nfn main() {}\nlet x = 1;\n```\n\n---\n\n| A | B |\n|---|---|\n| 1 | **2** |\n";
        let blocks = parse(markdown);

        assert_eq!(blocks[0], Block::Quote(vec![Span::plain("Cytat")]));
        assert_eq!(
            blocks[1],
            Block::Code(vec!["fn main() {}".to_string(), "let x = 1;".to_string()])
        );
        assert_eq!(blocks[2], Block::Rule);

        let Block::Table { header, rows } = &blocks[3] else {
            panic!("expected a table, got {:?}", blocks[3]);
        };
        assert_eq!(header.len(), 2);
        assert_eq!(rows.len(), 1);
        assert!(rows[0][1][0].style.bold);
    }

    #[test]
    fn images_become_italic_alt_text() {
        let blocks = parse("![Wykres sprzedaży](https://example.com/a.png)");
        let Block::Paragraph(spans) = &blocks[0] else {
            panic!("expected a paragraph, got {blocks:?}");
        };
        assert_eq!(spans[0].text, "Wykres sprzedaży");
        assert!(spans[0].style.italic);
    }

    #[test]
    fn hard_breaks_are_separate_spans() {
        let blocks = parse("linia\\\ndruga");
        let Block::Paragraph(spans) = &blocks[0] else {
            panic!("expected a paragraph, got {blocks:?}");
        };
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1].text, "\n");
    }
}
