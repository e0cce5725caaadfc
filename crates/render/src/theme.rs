//! Colours, sizes and page geometry of the house style.

use crate::error::RenderError;

/// Millimetres per typographic point.
pub const MM_PER_PT: f32 = 25.4 / 72.0;

pub fn pt_to_mm(pt: f32) -> f32 {
    pt * MM_PER_PT
}

/// An RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Colour {
    pub const fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn parse_hex(value: &str) -> Result<Self, RenderError> {
        let invalid = || RenderError::InvalidColour {
            value: value.to_string(),
        };

        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Self::from_u8(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub(crate) fn to_pdf(self) -> printpdf::Color {
        printpdf::Color::Rgb(printpdf::Rgb::new(self.r, self.g, self.b, None))
    }
}

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub const fn trbl(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

/// Size and spacing of one heading level, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingStyle {
    pub size: f32,
    pub space_before: f32,
    pub space_after: f32,
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Colour,
    pub secondary: Colour,
    pub accent: Colour,
    pub text: Colour,
    pub muted: Colour,
    pub rule: Colour,
    /// Page width and height in millimetres.
    pub page_size: (f32, f32),
    pub margins: Margins,
    pub body_size: f32,
    pub line_height: f32,
    pub paragraph_spacing: f32,
    pub code_size: f32,
    pub table_size: f32,
    pub footer_size: f32,
    pub headings: [HeadingStyle; 6],
    pub toc_label: String,
    pub brand_name: String,
    pub brand_website: String,
}

impl Theme {
    pub fn heading(&self, level: u8) -> HeadingStyle {
        let index = usize::from(level.clamp(1, 6)) - 1;
        self.headings[index]
    }

    pub fn page_width(&self) -> f32 {
        self.page_size.0
    }

    pub fn page_height(&self) -> f32 {
        self.page_size.1
    }

    pub fn content_width(&self) -> f32 {
        self.page_width() - self.margins.left - self.margins.right
    }
}

impl Default for Theme {
    fn default() -> Self {
        let heading = |size, space_before, space_after| HeadingStyle {
            size,
            space_before,
            space_after,
        };

        Self {
            primary: Colour::from_u8(0x60, 0x1A, 0x43),
            secondary: Colour::from_u8(0x16, 0x2E, 0x52),
            accent: Colour::from_u8(0xC9, 0xA2, 0x27),
            text: Colour::from_u8(0x33, 0x33, 0x33),
            muted: Colour::from_u8(0x66, 0x66, 0x66),
            rule: Colour::from_u8(0xCC, 0xCC, 0xCC),
            page_size: (210.0, 297.0),
            margins: Margins::trbl(20.0, 20.0, 25.0, 20.0),
            body_size: 11.0,
            line_height: 1.6,
            paragraph_spacing: 10.0,
            code_size: 9.5,
            table_size: 10.0,
            footer_size: 10.0,
            headings: [
                heading(24.0, 40.0, 20.0),
                heading(18.0, 30.0, 15.0),
                heading(14.0, 20.0, 10.0),
                heading(12.0, 15.0, 8.0),
                heading(11.0, 12.0, 6.0),
                heading(11.0, 12.0, 6.0),
            ],
            toc_label: "SPIS TREŚCI".to_string(),
            brand_name: "FOTZ Studio".to_string(),
            brand_website: "fotz.pl".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colours() {
        let colour = Colour::parse_hex("#601A43").unwrap();
        assert_eq!(colour, Colour::from_u8(0x60, 0x1A, 0x43));
        assert_eq!(Colour::parse_hex("ffffff").unwrap(), Colour::from_u8(255, 255, 255));
    }

    #[test]
    fn rejects_malformed_colours() {
        for value in ["#60", "#GG1A43", "burgundy", "#601A43FF", "#ąąą"] {
            assert!(Colour::parse_hex(value).is_err(), "{value} should be rejected");
        }
    }

    #[test]
    fn content_width_of_a4_with_default_margins() {
        let theme = Theme::default();
        assert!((theme.content_width() - 170.0).abs() < f32::EPSILON);
        assert_eq!(theme.heading(9), theme.heading(6));
    }
}
