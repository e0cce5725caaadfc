//! Page management on top of `printpdf`.
//!
//! The canvas keeps a cursor measured in millimetres from the top of the
//! current page; `printpdf` measures from the bottom, so every drawing call
//! converts.

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use printpdf::{
    Image, ImageTransform, Line as PdfLine, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point,
};

use crate::error::RenderError;
use crate::fonts::{FontKind, FontRefs, FontSet};
use crate::layout::Line;
use crate::theme::{pt_to_mm, Colour, Theme};

const LAYER: &str = "Content";
const IMAGE_DPI: f32 = 300.0;

/// Fraction of the font size between the top of a line box's text and its baseline.
const ASCENT: f32 = 0.75;

pub(crate) struct Canvas<'a> {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    refs: FontRefs,
    pub(crate) fonts: &'a FontSet,
    pub(crate) theme: &'a Theme,
    /// Cursor, millimetres from the top edge.
    y: f32,
    pages: u32,
    /// Numbered pages so far; body numbering starts after the cover.
    numbered_pages: u32,
    /// The page `PdfDocument::new` creates up front has not been claimed yet.
    unclaimed: bool,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(title: &str, theme: &'a Theme, fonts: &'a FontSet) -> Result<Self, RenderError> {
        let (doc, page, layer) = PdfDocument::new(
            title,
            Mm(theme.page_width()),
            Mm(theme.page_height()),
            LAYER,
        );
        let refs = fonts.register(&doc)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            refs,
            fonts,
            theme,
            y: theme.margins.top,
            pages: 1,
            numbered_pages: 0,
            unclaimed: true,
        })
    }

    /// Start a new page; numbered pages get the page number in the footer.
    pub(crate) fn start_page(&mut self, numbered: bool) {
        if self.unclaimed {
            self.unclaimed = false;
        } else {
            let (page, layer) = self.doc.add_page(
                Mm(self.theme.page_width()),
                Mm(self.theme.page_height()),
                LAYER,
            );
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.pages += 1;
        }

        self.y = self.theme.margins.top;
        if numbered {
            self.numbered_pages += 1;
            self.draw_footer();
        }
    }

    pub(crate) fn page_count(&self) -> u32 {
        self.pages
    }

    pub(crate) fn y(&self) -> f32 {
        self.y
    }

    pub(crate) fn set_y(&mut self, y: f32) {
        self.y = y;
    }

    pub(crate) fn at_top(&self) -> bool {
        self.y <= self.theme.margins.top + 0.01
    }

    fn bottom_limit(&self) -> f32 {
        self.theme.page_height() - self.theme.margins.bottom
    }

    /// Move to a fresh body page unless `height` still fits on this one.
    pub(crate) fn ensure_space(&mut self, height: f32) {
        if self.y + height > self.bottom_limit() + 0.01 && !self.at_top() {
            self.start_page(true);
        }
    }

    /// Vertical space in points; swallowed at the top of a page.
    pub(crate) fn space(&mut self, points: f32) {
        if !self.at_top() {
            self.y = (self.y + pt_to_mm(points)).min(self.bottom_limit());
        }
    }

    pub(crate) fn line_height(&self, size: f32, factor: f32) -> f32 {
        pt_to_mm(size * factor)
    }

    /// Write wrapped lines starting at the cursor, breaking pages as needed.
    pub(crate) fn write_lines(&mut self, lines: &[Line], x: f32, size: f32, factor: f32) {
        let height = self.line_height(size, factor);
        for line in lines {
            self.ensure_space(height);
            self.draw_line(line, x, size, height);
            self.y += height;
        }
    }

    /// Draw one line in a box of `height` whose top is the cursor.
    pub(crate) fn draw_line(&self, line: &Line, x: f32, size: f32, height: f32) {
        let baseline = self.baseline(size, height);
        for run in &line.runs {
            self.text_at(&run.text, run.font, size, run.colour, x + run.x, baseline);
            if run.strike {
                let middle = baseline - pt_to_mm(size) * 0.3;
                self.stroke(
                    (x + run.x, middle),
                    (x + run.x + run.width, middle),
                    0.5,
                    run.colour,
                );
            }
        }
    }

    fn baseline(&self, size: f32, height: f32) -> f32 {
        let text_height = pt_to_mm(size);
        self.y + (height - text_height) / 2.0 + text_height * ASCENT
    }

    /// Draw already prepared text with its baseline `baseline` mm from the top.
    pub(crate) fn text_at(
        &self,
        text: &str,
        font: FontKind,
        size: f32,
        colour: Colour,
        x: f32,
        baseline: f32,
    ) {
        if text.is_empty() {
            return;
        }
        self.layer.set_fill_color(colour.to_pdf());
        self.layer.use_text(
            text,
            size,
            Mm(x),
            Mm(self.theme.page_height() - baseline),
            self.refs.get(font),
        );
    }

    /// Draw unprepared text centred on the page.
    pub(crate) fn centred_text(
        &self,
        text: &str,
        font: FontKind,
        size: f32,
        colour: Colour,
        baseline: f32,
    ) {
        let prepared = self.fonts.prepare(text, font);
        let width = self.fonts.text_width(&prepared, font, size);
        let x = (self.theme.page_width() - width) / 2.0;
        self.text_at(&prepared, font, size, colour, x, baseline);
    }

    /// Straight line between two points given from the top-left corner.
    pub(crate) fn stroke(&self, from: (f32, f32), to: (f32, f32), thickness: f32, colour: Colour) {
        let height = self.theme.page_height();
        self.layer.set_outline_color(colour.to_pdf());
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(PdfLine {
            points: vec![
                (Point::new(Mm(from.0), Mm(height - from.1)), false),
                (Point::new(Mm(to.0), Mm(height - to.1)), false),
            ],
            is_closed: false,
        });
    }

    /// Solid rectangle, painted as one stroke as thick as the rectangle is tall.
    pub(crate) fn band(&self, x: f32, top: f32, width: f32, height: f32, colour: Colour) {
        let middle = top + height / 2.0;
        let thickness = height / crate::theme::MM_PER_PT;
        self.stroke((x, middle), (x + width, middle), thickness, colour);
    }

    /// Horizontal rule across the content width at the cursor.
    pub(crate) fn rule(&self, thickness: f32, colour: Colour) {
        let left = self.theme.margins.left;
        let right = self.theme.page_width() - self.theme.margins.right;
        self.stroke((left, self.y), (right, self.y), thickness, colour);
    }

    /// Place `image` so that its top-left corner is at (`x`, `top`).
    pub(crate) fn image(&self, image: &DynamicImage, x: f32, top: f32, width: f32, height: f32) {
        let (px_width, px_height) = image.dimensions();
        if px_width == 0 || px_height == 0 {
            return;
        }

        let natural_width = px_width as f32 / IMAGE_DPI * 25.4;
        let natural_height = px_height as f32 / IMAGE_DPI * 25.4;

        let flattened = flatten_alpha(image);
        Image::from_dynamic_image(&flattened).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(x)),
                translate_y: Some(Mm(self.theme.page_height() - top - height)),
                scale_x: Some(width / natural_width),
                scale_y: Some(height / natural_height),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
    }

    /// Fill the whole page with `image`, scaled to cover and centred.
    pub(crate) fn cover_image(&self, image: &DynamicImage) {
        let (page_width, page_height) = (self.theme.page_width(), self.theme.page_height());
        let (width, height) = cover_fit(image.dimensions(), (page_width, page_height));
        let x = (page_width - width) / 2.0;
        let top = (page_height - height) / 2.0;
        self.image(image, x, top, width, height);
    }

    fn draw_footer(&self) {
        let size = self.theme.footer_size;
        let baseline = self.theme.page_height() - self.theme.margins.bottom / 2.0 + pt_to_mm(size) / 3.0;
        self.centred_text(
            &self.numbered_pages.to_string(),
            FontKind::Regular,
            size,
            self.theme.muted,
            baseline,
        );
    }

    pub(crate) fn finish(self) -> Result<Vec<u8>, RenderError> {
        self.doc.save_to_bytes().map_err(RenderError::pdf)
    }
}

/// Size in millimetres of an image scaled by `max(page_w / img_w, page_h / img_h)`.
pub(crate) fn cover_fit(pixels: (u32, u32), page: (f32, f32)) -> (f32, f32) {
    let (px_width, px_height) = (pixels.0.max(1) as f32, pixels.1.max(1) as f32);
    let scale = (page.0 / px_width).max(page.1 / px_height);
    (px_width * scale, px_height * scale)
}

/// Size in millimetres of an image scaled to fit inside `bounds`.
pub(crate) fn contain_fit(pixels: (u32, u32), bounds: (f32, f32)) -> (f32, f32) {
    let (px_width, px_height) = (pixels.0.max(1) as f32, pixels.1.max(1) as f32);
    let scale = (bounds.0 / px_width).min(bounds.1 / px_height);
    (px_width * scale, px_height * scale)
}

/// Composite transparent pixels onto white; PDF images are written as RGB.
fn flatten_alpha(image: &DynamicImage) -> DynamicImage {
    if !image.color().has_alpha() {
        return DynamicImage::ImageRgb8(image.to_rgb8());
    }

    let rgba = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u16::from(a);
        let blend = |channel: u8| ((u16::from(channel) * alpha + 255 * (255 - alpha)) / 255) as u8;
        rgb.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    DynamicImage::ImageRgb8(rgb)
}
