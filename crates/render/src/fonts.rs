//! Font selection, metrics and registration with the PDF document.
//!
//! Two families are supported: a TrueType family loaded from disk, or the
//! PDF base-14 Helvetica/Courier fonts which need no files at all. Base fonts
//! only cover a single-byte encoding, so text destined for them is folded to
//! ASCII first (`ż` becomes `z`, typographic quotes become straight quotes).

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use owned_ttf_parser::{AsFaceRef, OwnedFace};
use printpdf::{BuiltinFont, IndirectFontRef, PdfDocumentReference};

use crate::error::RenderError;
use crate::theme::pt_to_mm;

/// The five faces a document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontKind {
    Regular,
    Bold,
    Italic,
    BoldItalic,
    Mono,
}

impl FontKind {
    pub fn from_flags(bold: bool, italic: bool, code: bool) -> Self {
        match (code, bold, italic) {
            (true, _, _) => FontKind::Mono,
            (false, true, true) => FontKind::BoldItalic,
            (false, true, false) => FontKind::Bold,
            (false, false, true) => FontKind::Italic,
            (false, false, false) => FontKind::Regular,
        }
    }

    /// The same face with bold weight added; mono stays mono.
    pub fn emboldened(self) -> Self {
        match self {
            FontKind::Regular | FontKind::Bold => FontKind::Bold,
            FontKind::Italic | FontKind::BoldItalic => FontKind::BoldItalic,
            FontKind::Mono => FontKind::Mono,
        }
    }

    /// The same face in italics; mono stays mono.
    pub fn italicised(self) -> Self {
        match self {
            FontKind::Regular | FontKind::Italic => FontKind::Italic,
            FontKind::Bold | FontKind::BoldItalic => FontKind::BoldItalic,
            FontKind::Mono => FontKind::Mono,
        }
    }

    const ALL: [FontKind; 5] = [
        FontKind::Regular,
        FontKind::Bold,
        FontKind::Italic,
        FontKind::BoldItalic,
        FontKind::Mono,
    ];

    fn index(self) -> usize {
        match self {
            FontKind::Regular => 0,
            FontKind::Bold => 1,
            FontKind::Italic => 2,
            FontKind::BoldItalic => 3,
            FontKind::Mono => 4,
        }
    }
}

/// Paths of a TrueType family. Only `regular` is mandatory; other variants
/// fall back to it, and a missing `mono` falls back to Courier.
#[derive(Debug, Clone, Default)]
pub struct FontPaths {
    pub regular: Option<PathBuf>,
    pub bold: Option<PathBuf>,
    pub italic: Option<PathBuf>,
    pub bold_italic: Option<PathBuf>,
    pub mono: Option<PathBuf>,
}

#[derive(Clone)]
enum FontSource {
    Builtin(BuiltinFont),
    TrueType {
        data: Arc<Vec<u8>>,
        face: Arc<OwnedFace>,
    },
}

impl FontSource {
    fn load(path: &Path) -> Result<Self, RenderError> {
        let data = std::fs::read(path).map_err(|source| RenderError::FontRead {
            path: path.to_path_buf(),
            source,
        })?;
        let face = OwnedFace::from_vec(data.clone(), 0).map_err(|err| RenderError::FontParse {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        Ok(FontSource::TrueType {
            data: Arc::new(data),
            face: Arc::new(face),
        })
    }

    /// Width of `text` in thousandths of the font size.
    fn width_units(&self, text: &str) -> f32 {
        match self {
            FontSource::Builtin(font) => text.chars().map(|c| builtin_width(*font, c)).sum(),
            FontSource::TrueType { face, .. } => {
                let face = face.as_face_ref();
                let units_per_em = f32::from(face.units_per_em().max(1));
                text.chars()
                    .map(|c| {
                        let advance = face
                            .glyph_index(c)
                            .and_then(|glyph| face.glyph_hor_advance(glyph))
                            .map(f32::from)
                            .unwrap_or(units_per_em / 2.0);
                        advance * 1000.0 / units_per_em
                    })
                    .sum()
            }
        }
    }

    fn is_builtin(&self) -> bool {
        matches!(self, FontSource::Builtin(_))
    }
}

/// A complete family ready to be registered with documents.
#[derive(Clone)]
pub struct FontSet {
    sources: [FontSource; 5],
}

impl FontSet {
    /// Helvetica for text and Courier for code.
    pub fn builtin() -> Self {
        Self {
            sources: [
                FontSource::Builtin(BuiltinFont::Helvetica),
                FontSource::Builtin(BuiltinFont::HelveticaBold),
                FontSource::Builtin(BuiltinFont::HelveticaOblique),
                FontSource::Builtin(BuiltinFont::HelveticaBoldOblique),
                FontSource::Builtin(BuiltinFont::Courier),
            ],
        }
    }

    /// Load a TrueType family, or the base fonts when no regular face is set.
    pub fn load(paths: &FontPaths) -> Result<Self, RenderError> {
        let Some(regular_path) = &paths.regular else {
            if paths.bold.is_some() || paths.italic.is_some() || paths.bold_italic.is_some() {
                tracing::warn!("font variants configured without a regular face, using base fonts");
            }
            return Ok(Self::builtin());
        };

        let regular = FontSource::load(regular_path)?;
        let variant = |path: &Option<PathBuf>| match path {
            Some(path) => FontSource::load(path),
            None => Ok(regular.clone()),
        };
        let bold = variant(&paths.bold)?;
        let italic = variant(&paths.italic)?;
        let bold_italic = match &paths.bold_italic {
            Some(path) => FontSource::load(path)?,
            None => bold.clone(),
        };
        let mono = match &paths.mono {
            Some(path) => FontSource::load(path)?,
            None => FontSource::Builtin(BuiltinFont::Courier),
        };

        tracing::info!(regular = %regular_path.display(), "loaded TrueType font family");

        Ok(Self {
            sources: [regular, bold, italic, bold_italic, mono],
        })
    }

    fn source(&self, kind: FontKind) -> &FontSource {
        &self.sources[kind.index()]
    }

    /// Text as it will be written with `kind`: folded to ASCII for base fonts.
    pub fn prepare<'a>(&self, text: &'a str, kind: FontKind) -> Cow<'a, str> {
        if self.source(kind).is_builtin() {
            fold_to_ascii(text)
        } else {
            Cow::Borrowed(text)
        }
    }

    /// Width in millimetres of already prepared `text` at `size` points.
    pub fn text_width(&self, text: &str, kind: FontKind, size: f32) -> f32 {
        pt_to_mm(self.source(kind).width_units(text) * size / 1000.0)
    }

    pub(crate) fn register(&self, doc: &PdfDocumentReference) -> Result<FontRefs, RenderError> {
        let mut refs = Vec::with_capacity(FontKind::ALL.len());
        for kind in FontKind::ALL {
            let font = match self.source(kind) {
                FontSource::Builtin(font) => doc.add_builtin_font(*font),
                FontSource::TrueType { data, .. } => {
                    doc.add_external_font(std::io::Cursor::new(data.as_slice()))
                }
            }
            .map_err(RenderError::pdf)?;
            refs.push(font);
        }
        Ok(FontRefs { refs })
    }
}

/// Fonts registered with one document, indexed by [`FontKind`].
pub(crate) struct FontRefs {
    refs: Vec<IndirectFontRef>,
}

impl FontRefs {
    pub(crate) fn get(&self, kind: FontKind) -> &IndirectFontRef {
        &self.refs[kind.index()]
    }
}

/// Fold text to printable ASCII; unknown characters become `?`.
pub fn fold_to_ascii(text: &str) -> Cow<'_, str> {
    if text.bytes().all(|b| (0x20..0x7f).contains(&b)) {
        return Cow::Borrowed(text);
    }

    let mut folded = String::with_capacity(text.len());
    for c in text.chars() {
        if (' '..='~').contains(&c) {
            folded.push(c);
        } else if c.is_whitespace() {
            folded.push(' ');
        } else if let Some(replacement) = fold_char(c) {
            folded.push_str(replacement);
        } else {
            let lower = c.to_lowercase().next().unwrap_or(c);
            match fold_char(lower) {
                Some(replacement) if lower != c => {
                    folded.push_str(&replacement.to_uppercase());
                }
                _ => folded.push('?'),
            }
        }
    }
    Cow::Owned(folded)
}

fn fold_char(c: char) -> Option<&'static str> {
    let folded = match c {
        'ą' | 'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' => "a",
        'ć' | 'ç' | 'č' | 'ĉ' => "c",
        'ď' | 'đ' => "d",
        'ę' | 'è' | 'é' | 'ê' | 'ë' | 'ě' | 'ē' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ı' => "i",
        'ł' | 'ľ' | 'ĺ' => "l",
        'ń' | 'ñ' | 'ň' => "n",
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'ø' | 'ő' => "o",
        'ŕ' | 'ř' => "r",
        'ś' | 'š' | 'ş' => "s",
        'ť' | 'ţ' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ů' | 'ű' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        '‘' | '’' | '‚' | '′' | '´' => "'",
        '“' | '”' | '„' | '″' | '«' | '»' => "\"",
        '–' | '—' | '−' | '‐' => "-",
        '…' => "...",
        '•' | '·' | '▪' | '◦' => "-",
        '×' => "x",
        '©' => "(c)",
        '®' => "(R)",
        '™' => "(TM)",
        '€' => "EUR",
        '°' => "o",
        '→' => "->",
        '←' => "<-",
        '✓' | '✔' => "v",
        _ => return None,
    };
    Some(folded)
}

fn builtin_width(font: BuiltinFont, c: char) -> f32 {
    let table = match font {
        BuiltinFont::Courier
        | BuiltinFont::CourierBold
        | BuiltinFont::CourierOblique
        | BuiltinFont::CourierBoldOblique => return 600.0,
        BuiltinFont::HelveticaBold | BuiltinFont::HelveticaBoldOblique => &HELVETICA_BOLD_WIDTHS,
        _ => &HELVETICA_WIDTHS,
    };

    let code = c as u32;
    if (32..=126).contains(&code) {
        f32::from(table[(code - 32) as usize])
    } else {
        556.0
    }
}

/// Advance widths of Helvetica for ASCII 32..=126, from the Adobe AFM.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

/// Advance widths of Helvetica-Bold for ASCII 32..=126, from the Adobe AFM.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    333, 333, 584, 584, 584, 611, 975, // :..@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    333, 278, 333, 584, 556, 333, // [..`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a..m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n..z
    389, 280, 389, 584, // {..~
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polish_text_folds_to_ascii() {
        assert_eq!(fold_to_ascii("Zażółć gęślą jaźń"), "Zazolc gesla jazn");
        assert_eq!(fold_to_ascii("ŁÓDŹ"), "LODZ");
        assert_eq!(fold_to_ascii("„cytat” – koniec…"), "\"cytat\" - koniec...");
    }

    #[test]
    fn ascii_is_borrowed_and_unknown_becomes_question_mark() {
        assert!(matches!(fold_to_ascii("plain text"), Cow::Borrowed(_)));
        assert_eq!(fold_to_ascii("日本"), "??");
    }

    #[test]
    fn builtin_widths_follow_helvetica_metrics() {
        let fonts = FontSet::builtin();
        let regular = fonts.text_width("i", FontKind::Regular, 1000.0);
        let bold = fonts.text_width("i", FontKind::Bold, 1000.0);
        assert!(bold > regular);

        let mono_i = fonts.text_width("i", FontKind::Mono, 12.0);
        let mono_m = fonts.text_width("m", FontKind::Mono, 12.0);
        assert!((mono_i - mono_m).abs() < f32::EPSILON);

        // 10 digits at 10pt: 10 * 556/1000 * 10pt = 55.6pt
        let digits = fonts.text_width("0123456789", FontKind::Regular, 10.0);
        assert!((digits - pt_to_mm(55.6)).abs() < 0.01);
    }

    #[test]
    fn missing_regular_face_means_base_fonts() {
        let fonts = FontSet::load(&FontPaths::default()).unwrap();
        assert_eq!(fonts.prepare("żółw", FontKind::Regular), "zolw");
    }

    #[test]
    fn unreadable_font_file_is_reported() {
        let paths = FontPaths {
            regular: Some(PathBuf::from("/definitely/not/here.ttf")),
            ..FontPaths::default()
        };
        assert!(matches!(
            FontSet::load(&paths),
            Err(RenderError::FontRead { .. })
        ));
    }

    #[test]
    fn font_kinds_combine_flags() {
        assert_eq!(FontKind::from_flags(true, true, false), FontKind::BoldItalic);
        assert_eq!(FontKind::from_flags(true, false, true), FontKind::Mono);
        assert_eq!(FontKind::Italic.emboldened(), FontKind::BoldItalic);
        assert_eq!(FontKind::Bold.italicised(), FontKind::BoldItalic);
    }
}
