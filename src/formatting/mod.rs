//! House-style Markdown formatting applied before rendering.
//!
//! Passes run in a fixed order: line endings are normalised first so the
//! line-based heading pass sees clean input, and keywords are bolded last so
//! headings are already in their final casing.

mod headings;
mod keywords;

use folio_kernel::settings::{BoldMode, FormattingSettings};

pub use headings::{sentence_case, standardize_headings};
pub use keywords::apply_bold_keywords;

/// CRLF and lone CR become LF.
pub fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

/// Formatting rules shared by every request.
#[derive(Debug, Clone)]
pub struct Formatter {
    proper_nouns: Vec<String>,
    bold_mode: BoldMode,
    max_suffix_len: usize,
}

impl Formatter {
    pub fn new(settings: &FormattingSettings) -> Self {
        Self {
            proper_nouns: settings.proper_nouns.clone(),
            bold_mode: settings.bold_mode,
            max_suffix_len: settings.max_suffix_len,
        }
    }

    /// Line endings, then headings, then keyword emphasis.
    pub fn format(&self, content: &str, keywords: &[String]) -> String {
        let content = normalize_line_endings(content);
        let content = standardize_headings(&content, &self.proper_nouns);
        if keywords.is_empty() {
            return content;
        }
        apply_bold_keywords(&content, keywords, self.bold_mode, self.max_suffix_len)
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(&FormattingSettings::default())
    }
}
