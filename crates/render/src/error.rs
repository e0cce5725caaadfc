use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing or producing a PDF.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read font file '{path}': {source}")]
    FontRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font file '{path}': {reason}")]
    FontParse { path: PathBuf, reason: String },

    #[error("invalid colour '{value}': expected #RRGGBB")]
    InvalidColour { value: String },

    /// The PDF backend rejected a font, image or the final serialisation.
    #[error("PDF backend error: {0}")]
    Pdf(String),
}

impl RenderError {
    pub(crate) fn pdf(err: impl std::fmt::Display) -> Self {
        Self::Pdf(err.to_string())
    }
}
