//! Pages outside the body flow: cover, title, contents, logo and full-page images.

use image::{DynamicImage, GenericImageView};

use crate::canvas::{contain_fit, Canvas};
use crate::document::TocEntry;
use crate::flow;
use crate::fonts::FontKind;
use crate::layout::{wrap, Styled};
use crate::markdown::Span;
use crate::theme::pt_to_mm;

const TITLE_SIZE: f32 = 28.0;
const SUBTITLE_SIZE: f32 = 16.0;
const AUTHOR_SIZE: f32 = 12.0;
const TOC_ROW_PADDING_PT: f32 = 8.0;
const TOC_PAGE_COLUMN_MM: f32 = 15.0;
const LOGO_OFFSET_PT: f32 = 200.0;
const LOGO_WIDTH_PT: f32 = 150.0;
const BRAND_SIZE: f32 = 14.0;

/// Unnumbered page filled edge to edge with `image`.
pub(crate) fn full_page_image(canvas: &mut Canvas<'_>, image: &DynamicImage) {
    canvas.start_page(false);
    canvas.cover_image(image);
}

/// Typographic first page used when no cover image is available.
pub(crate) fn title_page(canvas: &mut Canvas<'_>, title: &str, subtitle: &str, author: &str) {
    let theme = canvas.theme;
    canvas.start_page(false);

    let width = theme.content_width();
    let mut y = theme.page_height() * 0.33;

    let title_lines = wrap(
        canvas.fonts,
        &[Styled::new(title, FontKind::Bold, theme.primary)],
        TITLE_SIZE,
        width,
    );
    let title_height = canvas.line_height(TITLE_SIZE, 1.2);
    for line in &title_lines {
        canvas.set_y(y);
        let x = (theme.page_width() - line.width) / 2.0;
        canvas.draw_line(line, x, TITLE_SIZE, title_height);
        y += title_height;
    }

    y += 6.0;
    let rule_half = 25.0;
    let centre = theme.page_width() / 2.0;
    canvas.stroke(
        (centre - rule_half, y),
        (centre + rule_half, y),
        2.0,
        theme.accent,
    );
    y += 10.0;

    if !subtitle.trim().is_empty() {
        let subtitle_lines = wrap(
            canvas.fonts,
            &[Styled::new(subtitle, FontKind::Regular, theme.secondary)],
            SUBTITLE_SIZE,
            width,
        );
        let subtitle_height = canvas.line_height(SUBTITLE_SIZE, 1.3);
        for line in &subtitle_lines {
            canvas.set_y(y);
            let x = (theme.page_width() - line.width) / 2.0;
            canvas.draw_line(line, x, SUBTITLE_SIZE, subtitle_height);
            y += subtitle_height;
        }
    }

    if !author.trim().is_empty() {
        let baseline = theme.page_height() - theme.margins.bottom - 20.0;
        canvas.centred_text(author, FontKind::Regular, AUTHOR_SIZE, theme.muted, baseline);
    }
}

/// Table of contents: label heading, then one row per entry with a dotted
/// leader running to the right-aligned page number.
pub(crate) fn contents(canvas: &mut Canvas<'_>, entries: &[TocEntry]) {
    let theme = canvas.theme;
    flow::heading(canvas, 2, &[Span::plain(theme.toc_label.as_str())]);
    canvas.space(15.0);

    let size = theme.body_size;
    let padding = pt_to_mm(TOC_ROW_PADDING_PT);
    let left = theme.margins.left;
    let right = left + theme.content_width();
    let title_width = theme.content_width() - TOC_PAGE_COLUMN_MM;
    let line_height = canvas.line_height(size, 1.3);

    let dot = canvas.fonts.prepare(".", FontKind::Regular).into_owned();
    let dot_width = canvas.fonts.text_width(&dot, FontKind::Regular, size).max(0.1);

    for entry in entries {
        let lines = wrap(
            canvas.fonts,
            &[Styled::new(entry.title.as_str(), FontKind::Regular, theme.secondary)],
            size,
            title_width,
        );
        let row_height = lines.len() as f32 * line_height + 2.0 * padding;
        canvas.ensure_space(row_height);

        let top = canvas.y();
        canvas.set_y(top + padding);
        for line in &lines {
            canvas.draw_line(line, left, size, line_height);
            canvas.set_y(canvas.y() + line_height);
        }

        let page = entry.page.to_string();
        let page_width = canvas.fonts.text_width(&page, FontKind::Regular, size);
        let last_top = top + padding + (lines.len().max(1) - 1) as f32 * line_height;
        let baseline = last_top + (line_height - pt_to_mm(size)) / 2.0 + pt_to_mm(size) * 0.75;
        canvas.text_at(&page, FontKind::Regular, size, theme.muted, right - page_width, baseline);

        let leader_start = left + lines.last().map_or(0.0, |line| line.width) + 2.0;
        let leader_end = right - page_width - 2.0;
        let dots = ((leader_end - leader_start) / (dot_width * 2.0)).floor();
        if dots >= 1.0 {
            let leader = vec![dot.as_str(); dots as usize].join(" ");
            let leader_width = canvas.fonts.text_width(&leader, FontKind::Regular, size);
            canvas.text_at(&leader, FontKind::Regular, size, theme.rule, leader_end - leader_width, baseline);
        }

        canvas.set_y(top + row_height);
    }
}

/// Closing page with the logo, brand name and website.
pub(crate) fn logo_page(canvas: &mut Canvas<'_>, logo: &DynamicImage) {
    let theme = canvas.theme;
    canvas.start_page(true);

    let max_width = pt_to_mm(LOGO_WIDTH_PT);
    let (width, height) = contain_fit(logo.dimensions(), (max_width, max_width * 1.5));
    let top = theme.margins.top + pt_to_mm(LOGO_OFFSET_PT);
    let x = (theme.page_width() - width) / 2.0;
    canvas.image(logo, x, top, width, height);

    let mut baseline = top + height + pt_to_mm(30.0) + pt_to_mm(BRAND_SIZE);
    canvas.centred_text(&theme.brand_name, FontKind::Regular, BRAND_SIZE, theme.secondary, baseline);

    baseline += pt_to_mm(theme.body_size * 2.0);
    canvas.centred_text(
        &theme.brand_website,
        FontKind::Regular,
        theme.body_size,
        theme.secondary,
        baseline,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontSet;
    use crate::theme::Theme;
    use image::RgbImage;

    #[test]
    fn contents_break_across_pages() {
        let theme = Theme::default();
        let fonts = FontSet::builtin();
        let mut canvas = Canvas::new("toc", &theme, &fonts).unwrap();
        canvas.start_page(true);

        let entries: Vec<_> = (1..=60)
            .map(|page| TocEntry::new(format!("Rozdział numer {page}"), page))
            .collect();
        contents(&mut canvas, &entries);
        assert!(canvas.page_count() >= 2);
    }

    #[test]
    fn special_pages_each_take_one_page() {
        let theme = Theme::default();
        let fonts = FontSet::builtin();
        let mut canvas = Canvas::new("pages", &theme, &fonts).unwrap();
        let image = DynamicImage::ImageRgb8(RgbImage::new(40, 60));

        title_page(&mut canvas, "Tytuł bardzo długiego poradnika o planowaniu", "Poradnik", "FOTZ Studio");
        logo_page(&mut canvas, &image);
        full_page_image(&mut canvas, &image);
        assert_eq!(canvas.page_count(), 3);

        let bytes = canvas.finish().unwrap();
        assert!(!bytes.is_empty());
    }
}
