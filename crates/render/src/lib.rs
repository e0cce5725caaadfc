//! Markdown to paginated PDF rendering for folio.
//!
//! [`Renderer`] turns a [`Manuscript`] (formatted Markdown, table of contents
//! entries and decoded images) into PDF bytes using `printpdf`.

mod canvas;
mod document;
mod error;
mod flow;
mod fonts;
mod layout;
mod markdown;
mod pages;
mod theme;

pub use document::{Manuscript, Renderer, TocEntry};
pub use error::RenderError;
pub use fonts::{fold_to_ascii, FontKind, FontPaths, FontSet};
pub use layout::{wrap, Line, Measure, Run, Styled};
pub use markdown::{parse, plain_text, Block, Span, SpanStyle};
pub use theme::{Colour, HeadingStyle, Margins, Theme};
