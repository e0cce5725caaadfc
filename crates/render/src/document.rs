use std::sync::Arc;

use image::DynamicImage;

use crate::canvas::Canvas;
use crate::error::RenderError;
use crate::fonts::FontSet;
use crate::theme::Theme;
use crate::{flow, markdown, pages};

/// One row of the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    pub page: u32,
}

impl TocEntry {
    pub fn new(title: impl Into<String>, page: u32) -> Self {
        Self {
            title: title.into(),
            page,
        }
    }
}

/// Content and decoded images of one document.
#[derive(Debug, Clone, Default)]
pub struct Manuscript {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    /// Formatted Markdown body.
    pub markdown: String,
    pub toc: Vec<TocEntry>,
    pub cover: Option<DynamicImage>,
    pub logo: Option<DynamicImage>,
    pub infographics: Vec<DynamicImage>,
}

/// Renders manuscripts with a fixed theme and font family.
///
/// Cheap to clone; rendering is CPU bound, so async callers should run
/// [`Renderer::render`] on a blocking thread.
#[derive(Clone)]
pub struct Renderer {
    theme: Arc<Theme>,
    fonts: Arc<FontSet>,
}

impl Renderer {
    pub fn new(theme: Theme, fonts: FontSet) -> Self {
        Self {
            theme: Arc::new(theme),
            fonts: Arc::new(fonts),
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Produce the PDF: cover (or title page), contents and body, logo
    /// page, then one page per infographic.
    pub fn render(&self, manuscript: &Manuscript) -> Result<Vec<u8>, RenderError> {
        self.render_counted(manuscript).map(|(pdf, _)| pdf)
    }

    fn render_counted(&self, manuscript: &Manuscript) -> Result<(Vec<u8>, u32), RenderError> {
        let mut canvas = Canvas::new(&manuscript.title, &self.theme, &self.fonts)?;

        match &manuscript.cover {
            Some(cover) => pages::full_page_image(&mut canvas, cover),
            None => pages::title_page(
                &mut canvas,
                &manuscript.title,
                &manuscript.subtitle,
                &manuscript.author,
            ),
        }

        canvas.start_page(true);
        if !manuscript.toc.is_empty() {
            pages::contents(&mut canvas, &manuscript.toc);
        }

        let blocks = markdown::parse(&manuscript.markdown);
        flow::render_blocks(&mut canvas, &blocks);

        if let Some(logo) = &manuscript.logo {
            pages::logo_page(&mut canvas, logo);
        }
        for infographic in &manuscript.infographics {
            pages::full_page_image(&mut canvas, infographic);
        }

        let page_count = canvas.page_count();
        let pdf = canvas.finish()?;
        tracing::debug!(
            pages = page_count,
            blocks = blocks.len(),
            bytes = pdf.len(),
            "rendered PDF"
        );
        Ok((pdf, page_count))
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(Theme::default(), FontSet::builtin())
    }
}
