//! Body text: lays out parsed Markdown blocks page after page.

use crate::canvas::Canvas;
use crate::fonts::FontKind;
use crate::layout::{wrap, Styled};
use crate::markdown::{Block, Span};
use crate::theme::{pt_to_mm, Colour};

const LIST_INDENT_PT: f32 = 20.0;
const MARKER_GAP_MM: f32 = 2.0;
const QUOTE_BAR_PT: f32 = 3.0;
const QUOTE_PADDING_PT: f32 = 15.0;
const CELL_PADDING_PT: f32 = 8.0;
const CODE_LINE_HEIGHT: f32 = 1.4;
const HEADING_LINE_HEIGHT: f32 = 1.25;

const QUOTE_BACKGROUND: Colour = Colour::from_u8(0xF9, 0xF9, 0xF9);
const STRIPE_BACKGROUND: Colour = Colour::from_u8(0xF5, 0xF5, 0xF5);
const CELL_BORDER: Colour = Colour::from_u8(0xDD, 0xDD, 0xDD);
const WHITE: Colour = Colour::from_u8(0xFF, 0xFF, 0xFF);

/// Base font and colours applied to a run of spans.
#[derive(Clone, Copy)]
struct TextStyle {
    font: FontKind,
    colour: Colour,
    /// Colour of bold and link spans.
    emphasis: Colour,
}

pub(crate) fn render_blocks(canvas: &mut Canvas<'_>, blocks: &[Block]) {
    for block in blocks {
        match block {
            Block::Heading { level, spans } => heading(canvas, *level, spans),
            Block::Paragraph(spans) => paragraph(canvas, spans),
            Block::ListItem {
                depth,
                marker,
                spans,
            } => list_item(canvas, *depth, marker, spans),
            Block::Quote(spans) => quote(canvas, spans),
            Block::Code(lines) => code(canvas, lines),
            Block::Rule => rule(canvas),
            Block::Table { header, rows } => table(canvas, header, rows),
        }
    }
}

fn styled(spans: &[Span], style: TextStyle) -> Vec<Styled> {
    spans
        .iter()
        .map(|span| {
            let mut font = FontKind::from_flags(span.style.bold, span.style.italic, span.style.code);
            if font != FontKind::Mono {
                if matches!(style.font, FontKind::Bold | FontKind::BoldItalic) {
                    font = font.emboldened();
                }
                if matches!(style.font, FontKind::Italic | FontKind::BoldItalic) {
                    font = font.italicised();
                }
            }

            let colour = if span.style.bold || span.style.link {
                style.emphasis
            } else {
                style.colour
            };

            Styled {
                text: span.text.clone(),
                font,
                colour,
                strike: span.style.strike,
            }
        })
        .collect()
}

fn body_style(canvas: &Canvas<'_>) -> TextStyle {
    TextStyle {
        font: FontKind::Regular,
        colour: canvas.theme.text,
        emphasis: canvas.theme.secondary,
    }
}

/// Heading; level 1 opens a new page unless the current one is still empty.
pub(crate) fn heading(canvas: &mut Canvas<'_>, level: u8, spans: &[Span]) {
    let theme = canvas.theme;
    let style = theme.heading(level);
    let colour = if level <= 2 {
        theme.primary
    } else {
        theme.secondary
    };

    if level == 1 && !canvas.at_top() {
        canvas.start_page(true);
    }
    canvas.space(style.space_before);

    let text_style = TextStyle {
        font: FontKind::Bold,
        colour,
        emphasis: colour,
    };
    let lines = wrap(
        canvas.fonts,
        &styled(spans, text_style),
        style.size,
        theme.content_width(),
    );

    // Keep the heading on the same page as the first line that follows it.
    let height = canvas.line_height(style.size, HEADING_LINE_HEIGHT) * lines.len() as f32;
    let next_line = canvas.line_height(theme.body_size, theme.line_height);
    canvas.ensure_space(height + next_line);

    canvas.write_lines(&lines, theme.margins.left, style.size, HEADING_LINE_HEIGHT);

    if level == 2 {
        canvas.set_y(canvas.y() + pt_to_mm(5.0));
        canvas.rule(1.5, theme.primary);
        canvas.set_y(canvas.y() + pt_to_mm(1.5));
    }
    canvas.space(style.space_after);
}

fn paragraph(canvas: &mut Canvas<'_>, spans: &[Span]) {
    let theme = canvas.theme;
    let lines = wrap(
        canvas.fonts,
        &styled(spans, body_style(canvas)),
        theme.body_size,
        theme.content_width(),
    );
    canvas.write_lines(&lines, theme.margins.left, theme.body_size, theme.line_height);
    canvas.space(theme.paragraph_spacing);
}

fn list_item(canvas: &mut Canvas<'_>, depth: usize, marker: &str, spans: &[Span]) {
    let theme = canvas.theme;
    let size = theme.body_size;
    let indent = pt_to_mm(LIST_INDENT_PT) * depth.max(1) as f32;
    let marker_x = theme.margins.left + indent - pt_to_mm(LIST_INDENT_PT) * 0.6;
    let text_x = theme.margins.left + indent + MARKER_GAP_MM;
    let width = (theme.content_width() - indent - MARKER_GAP_MM).max(20.0);

    let lines = wrap(canvas.fonts, &styled(spans, body_style(canvas)), size, width);
    let height = canvas.line_height(size, theme.line_height);

    for (index, line) in lines.iter().enumerate() {
        canvas.ensure_space(height);
        if index == 0 && !marker.is_empty() {
            let prepared = canvas.fonts.prepare(marker, FontKind::Regular);
            let top = canvas.y();
            let baseline = top + (height - pt_to_mm(size)) / 2.0 + pt_to_mm(size) * 0.75;
            canvas.text_at(&prepared, FontKind::Regular, size, theme.text, marker_x, baseline);
        }
        canvas.draw_line(line, text_x, size, height);
        canvas.set_y(canvas.y() + height);
    }
    canvas.space(5.0);
}

fn quote(canvas: &mut Canvas<'_>, spans: &[Span]) {
    let theme = canvas.theme;
    let size = theme.body_size;
    let padding = pt_to_mm(QUOTE_PADDING_PT);
    let bar = pt_to_mm(QUOTE_BAR_PT);
    let left = theme.margins.left;
    let width = theme.content_width();

    let style = TextStyle {
        font: FontKind::Italic,
        colour: theme.secondary,
        emphasis: theme.secondary,
    };
    let lines = wrap(
        canvas.fonts,
        &styled(spans, style),
        size,
        width - bar - 2.0 * padding,
    );
    let height = canvas.line_height(size, theme.line_height);

    canvas.space(20.0);
    canvas.ensure_space(padding + height);
    quote_padding(canvas, width, padding);
    for line in &lines {
        canvas.ensure_space(height);
        canvas.band(left, canvas.y(), width, height, QUOTE_BACKGROUND);
        canvas.band(left, canvas.y(), bar, height, theme.primary);
        canvas.draw_line(line, left + bar + padding, size, height);
        canvas.set_y(canvas.y() + height);
    }
    canvas.ensure_space(padding);
    quote_padding(canvas, width, padding);
    canvas.space(20.0);
}

fn quote_padding(canvas: &mut Canvas<'_>, width: f32, padding: f32) {
    let left = canvas.theme.margins.left;
    canvas.band(left, canvas.y(), width, padding, QUOTE_BACKGROUND);
    canvas.band(left, canvas.y(), pt_to_mm(QUOTE_BAR_PT), padding, canvas.theme.primary);
    canvas.set_y(canvas.y() + padding);
}

fn code(canvas: &mut Canvas<'_>, lines: &[String]) {
    let theme = canvas.theme;
    let size = theme.code_size;
    let inset = 3.0;
    let left = theme.margins.left;
    let width = theme.content_width();
    let height = canvas.line_height(size, CODE_LINE_HEIGHT);

    canvas.space(theme.paragraph_spacing / 2.0);
    canvas.ensure_space(height * 2.0);
    canvas.band(left, canvas.y(), width, inset, STRIPE_BACKGROUND);
    canvas.set_y(canvas.y() + inset);

    for source_line in lines {
        let fragment = Styled::new(source_line.as_str(), FontKind::Mono, theme.text);
        for line in wrap(canvas.fonts, &[fragment], size, width - 2.0 * inset) {
            canvas.ensure_space(height);
            canvas.band(left, canvas.y(), width, height, STRIPE_BACKGROUND);
            canvas.draw_line(&line, left + inset, size, height);
            canvas.set_y(canvas.y() + height);
        }
    }

    canvas.band(left, canvas.y(), width, inset, STRIPE_BACKGROUND);
    canvas.set_y(canvas.y() + inset);
    canvas.space(theme.paragraph_spacing);
}

fn rule(canvas: &mut Canvas<'_>) {
    let theme = canvas.theme;
    canvas.space(theme.paragraph_spacing);
    canvas.ensure_space(pt_to_mm(theme.paragraph_spacing));
    canvas.rule(0.75, theme.rule);
    canvas.space(theme.paragraph_spacing);
}

fn table(canvas: &mut Canvas<'_>, header: &[Vec<Span>], rows: &[Vec<Vec<Span>>]) {
    let theme = canvas.theme;
    let columns = header
        .len()
        .max(rows.iter().map(Vec::len).max().unwrap_or(0));
    if columns == 0 {
        return;
    }

    canvas.space(15.0);

    let header_style = TextStyle {
        font: FontKind::Bold,
        colour: WHITE,
        emphasis: WHITE,
    };
    if !header.is_empty() {
        table_row(canvas, header, columns, header_style, Some(theme.primary));
    }

    let cell_style = TextStyle {
        font: FontKind::Regular,
        colour: theme.text,
        emphasis: theme.secondary,
    };
    for (index, row) in rows.iter().enumerate() {
        let background = (index % 2 == 1).then_some(STRIPE_BACKGROUND);
        table_row(canvas, row, columns, cell_style, background);
    }

    canvas.space(15.0);
}

fn table_row(
    canvas: &mut Canvas<'_>,
    cells: &[Vec<Span>],
    columns: usize,
    style: TextStyle,
    background: Option<Colour>,
) {
    let theme = canvas.theme;
    let size = theme.table_size;
    let padding = pt_to_mm(CELL_PADDING_PT);
    let column_width = theme.content_width() / columns as f32;
    let line_height = canvas.line_height(size, 1.4);

    let wrapped: Vec<_> = (0..columns)
        .map(|column| {
            let spans = cells.get(column).map(Vec::as_slice).unwrap_or(&[]);
            wrap(
                canvas.fonts,
                &styled(spans, style),
                size,
                column_width - 2.0 * padding,
            )
        })
        .collect();
    let row_lines = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
    let row_height = row_lines as f32 * line_height + 2.0 * padding;

    canvas.ensure_space(row_height);
    let top = canvas.y();
    let left = theme.margins.left;
    let right = left + theme.content_width();

    if let Some(colour) = background {
        canvas.band(left, top, theme.content_width(), row_height, colour);
    }

    for (column, lines) in wrapped.iter().enumerate() {
        let x = left + column as f32 * column_width + padding;
        canvas.set_y(top + padding);
        for line in lines {
            canvas.draw_line(line, x, size, line_height);
            canvas.set_y(canvas.y() + line_height);
        }
    }

    let bottom = top + row_height;
    canvas.stroke((left, top), (right, top), 0.75, CELL_BORDER);
    canvas.stroke((left, bottom), (right, bottom), 0.75, CELL_BORDER);
    for column in 0..=columns {
        let x = left + column as f32 * column_width;
        canvas.stroke((x, top), (x, bottom), 0.75, CELL_BORDER);
    }
    canvas.set_y(bottom);
}
