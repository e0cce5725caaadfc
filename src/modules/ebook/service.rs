//! The generation pipeline: fetch images, format, render, package.

use std::sync::Arc;

use folio_http::error::AppError;
use folio_kernel::settings::{DocumentSettings, Settings};
use folio_render::{Colour, FontPaths, FontSet, Manuscript, RenderError, Renderer, Theme, TocEntry};
use thiserror::Error;

use super::archive::{build_archive, BundleContents};
use super::assets::{fetch_assets, AssetSet, AssetUrls, FetchError, HttpImageSource, ImageSource};
use super::models::{BundleJob, DocumentJob};
use crate::formatting::Formatter;
use crate::utils::safe_file_stem;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to render PDF: {0}")]
    Render(#[from] RenderError),

    #[error("failed to write ZIP bundle: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("rendering task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Fetch(err) => AppError::upstream(err.to_string()),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

/// A generated file ready to be downloaded.
#[derive(Debug, Clone)]
pub struct Generated {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct EbookService {
    source: Arc<dyn ImageSource>,
    renderer: Renderer,
    formatter: Arc<Formatter>,
    defaults: Arc<DocumentSettings>,
    strict: bool,
}

impl EbookService {
    /// Wire the service from settings: theme, fonts and the HTTP image source.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let source = HttpImageSource::new(&settings.fetch)?;
        let theme = theme_from_settings(&settings.document)?;
        let fonts = FontSet::load(&font_paths(&settings.document))?;

        Ok(Self::new(Arc::new(source), Renderer::new(theme, fonts), settings))
    }

    pub fn new(source: Arc<dyn ImageSource>, renderer: Renderer, settings: &Settings) -> Self {
        Self {
            source,
            renderer,
            formatter: Arc::new(Formatter::new(&settings.formatting)),
            defaults: Arc::new(settings.document.clone()),
            strict: settings.fetch.strict,
        }
    }

    pub fn defaults(&self) -> &DocumentSettings {
        &self.defaults
    }

    pub async fn generate_pdf(&self, job: DocumentJob) -> Result<Generated, ServiceError> {
        let assets = self.fetch(&job, None).await?;
        let filename = format!("{}.pdf", safe_file_stem(&job.title));
        let bytes = self.render(job, &assets).await?;

        tracing::info!(filename = %filename, bytes = bytes.len(), "generated PDF");
        Ok(Generated { filename, bytes })
    }

    pub async fn generate_bundle(&self, job: BundleJob) -> Result<Generated, ServiceError> {
        let BundleJob {
            document,
            mockup_url,
            blog_post,
            shop_description,
        } = job;

        let assets = self.fetch(&document, mockup_url.as_deref()).await?;
        let stem = safe_file_stem(&document.title);
        let pdf = self.render(document, &assets).await?;

        let pdf_name = format!("{stem}.pdf");
        let archive = build_archive(&BundleContents {
            pdf_name: &pdf_name,
            pdf: &pdf,
            assets: &assets,
            blog_post: blog_post.as_deref(),
            shop_description: shop_description.as_deref(),
        })?;

        let filename = format!("{stem}_{}.zip", self.defaults.bundle_suffix);
        tracing::info!(filename = %filename, bytes = archive.len(), "generated ZIP bundle");
        Ok(Generated {
            filename,
            bytes: archive,
        })
    }

    async fn fetch(&self, job: &DocumentJob, mockup: Option<&str>) -> Result<AssetSet, FetchError> {
        let urls = AssetUrls {
            cover: job.cover_url.as_deref(),
            logo: job.logo_url.as_deref(),
            mockup,
            infographics: &job.infographic_urls,
        };
        fetch_assets(self.source.as_ref(), urls, self.strict).await
    }

    /// Format and render on the blocking pool; decoding and layout are CPU bound.
    async fn render(&self, job: DocumentJob, assets: &AssetSet) -> Result<Vec<u8>, ServiceError> {
        let renderer = self.renderer.clone();
        let formatter = Arc::clone(&self.formatter);
        let strict = self.strict;
        let cover = assets.cover.clone();
        let logo = assets.logo.clone();
        let infographics = assets.infographics.clone();

        tokio::task::spawn_blocking(move || {
            let decode = |image: &super::assets::FetchedImage| match image.decode() {
                Ok(decoded) => Ok(Some(decoded)),
                Err(err) if strict => Err(err),
                Err(err) => {
                    tracing::warn!(url = %image.url, error = %err, "skipping image that could not be decoded");
                    Ok(None)
                }
            };

            let mut manuscript = Manuscript {
                markdown: formatter.format(&job.content, &job.keywords),
                toc: job
                    .toc
                    .into_iter()
                    .map(|item| TocEntry::new(item.title, item.page))
                    .collect(),
                title: job.title,
                subtitle: job.subtitle,
                author: job.author,
                ..Manuscript::default()
            };
            if let Some(cover) = &cover {
                manuscript.cover = decode(cover)?;
            }
            if let Some(logo) = &logo {
                manuscript.logo = decode(logo)?;
            }
            for (_, infographic) in &infographics {
                manuscript.infographics.extend(decode(infographic)?);
            }

            Ok::<_, ServiceError>(renderer.render(&manuscript)?)
        })
        .await?
    }
}

/// House style with the configured colours and labels.
pub fn theme_from_settings(document: &DocumentSettings) -> Result<Theme, RenderError> {
    Ok(Theme {
        primary: Colour::parse_hex(&document.primary_color)?,
        secondary: Colour::parse_hex(&document.secondary_color)?,
        accent: Colour::parse_hex(&document.accent_color)?,
        toc_label: document.toc_label.clone(),
        brand_name: document.brand_name.clone(),
        brand_website: document.brand_website.clone(),
        ..Theme::default()
    })
}

fn font_paths(document: &DocumentSettings) -> FontPaths {
    let fonts = &document.fonts;
    FontPaths {
        regular: fonts.regular.clone(),
        bold: fonts.bold.clone(),
        italic: fonts.italic.clone(),
        bold_italic: fonts.bold_italic.clone(),
        mono: fonts.mono.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::ebook::assets::tests::{png, MemorySource};
    use crate::modules::ebook::models::TocItem;
    use std::io::Cursor;
    use std::sync::atomic::Ordering;

    fn job(title: &str) -> DocumentJob {
        DocumentJob {
            content: "# Wstęp\n\nPlanowanie tygodnia w notion.".to_string(),
            title: title.to_string(),
            subtitle: "Poradnik".to_string(),
            author: "FOTZ Studio".to_string(),
            toc: vec![TocItem {
                title: "Wstęp".to_string(),
                page: 3,
            }],
            keywords: vec!["notion".to_string()],
            cover_url: None,
            infographic_urls: Vec::new(),
            logo_url: None,
        }
    }

    fn service(source: MemorySource, strict: bool) -> EbookService {
        let mut settings = Settings::default();
        settings.fetch.strict = strict;
        EbookService::new(Arc::new(source), Renderer::default(), &settings)
    }

    #[tokio::test]
    async fn pdf_is_named_after_the_title() {
        let generated = service(MemorySource::default(), false)
            .generate_pdf(job("Plan: tydzień!"))
            .await
            .unwrap();

        assert_eq!(generated.filename, "Plan_tydzień.pdf");
        assert!(generated.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn bundle_fetches_each_image_once() {
        let source = Arc::new(
            MemorySource::default()
                .with("https://img/cover.png", png(20, 30))
                .with("https://img/mockup.png", png(10, 10)),
        );
        let service = EbookService::new(source.clone(), Renderer::default(), &Settings::default());

        let mut document = job("Poradnik");
        document.cover_url = Some("https://img/cover.png".to_string());
        let generated = service
            .generate_bundle(BundleJob {
                document,
                mockup_url: Some("https://img/mockup.png".to_string()),
                blog_post: Some("Wpis".to_string()),
                shop_description: None,
            })
            .await
            .unwrap();

        assert_eq!(generated.filename, "Poradnik_FOTZ.zip");
        assert_eq!(source.requests.load(Ordering::SeqCst), 2);

        let archive = zip::ZipArchive::new(Cursor::new(generated.bytes)).unwrap();
        let mut names: Vec<_> = archive.file_names().collect();
        names.sort();
        assert_eq!(
            names,
            vec!["Poradnik.pdf", "blog_post.md", "cover_a4.png", "mockup_tablet.png"]
        );
    }

    #[tokio::test]
    async fn missing_images_fail_only_in_strict_mode() {
        let mut document = job("Poradnik");
        document.logo_url = Some("https://img/missing.png".to_string());

        let lenient = service(MemorySource::default(), false)
            .generate_pdf(document.clone())
            .await;
        assert!(lenient.is_ok());

        let strict = service(MemorySource::default(), true)
            .generate_pdf(document)
            .await
            .unwrap_err();
        assert!(matches!(strict, ServiceError::Fetch(_)));
        assert_eq!(
            AppError::from(strict).status(),
            axum::http::StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn invalid_colours_are_rejected() {
        let mut document = DocumentSettings::default();
        document.primary_color = "purple".to_string();
        assert!(matches!(
            theme_from_settings(&document),
            Err(RenderError::InvalidColour { .. })
        ));
    }
}
