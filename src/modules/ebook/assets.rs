//! Remote images used by a document: downloading, sniffing and decoding.

use std::time::Duration;

use async_trait::async_trait;
use folio_kernel::settings::FetchSettings;
use futures::future::join_all;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    #[error("download of '{url}' failed: {reason}")]
    Request { url: String, reason: String },

    #[error("download of '{url}' timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("'{url}' answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("'{url}' is larger than the {limit} byte limit")]
    TooLarge { url: String, limit: u64 },

    #[error("'{url}' is not a supported image: {reason}")]
    NotAnImage { url: String, reason: String },
}

/// Where image bytes come from.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Downloads images over HTTP(S).
pub struct HttpImageSource {
    client: reqwest::Client,
    timeout_secs: u64,
    max_bytes: u64,
}

impl HttpImageSource {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| FetchError::Client(err.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: settings.timeout_secs,
            max_bytes: settings.max_image_bytes,
        })
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let request_error = |err: reqwest::Error| {
            if err.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    secs: self.timeout_secs,
                }
            } else {
                FetchError::Request {
                    url: url.to_string(),
                    reason: err.to_string(),
                }
            }
        };

        let mut response = self.client.get(url).send().await.map_err(request_error)?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let too_large = || FetchError::TooLarge {
            url: url.to_string(),
            limit: self.max_bytes,
        };
        if response.content_length().is_some_and(|len| len > self.max_bytes) {
            return Err(too_large());
        }

        // Hosts may stream without a Content-Length, so the cap is enforced per chunk.
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(request_error)? {
            if (bytes.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(too_large());
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

/// Downloaded image bytes with their detected format.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub url: String,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl FetchedImage {
    /// Sniff the format from the magic bytes; anything unrecognised is rejected.
    pub fn sniff(url: &str, bytes: Vec<u8>) -> Result<Self, FetchError> {
        let format = image::guess_format(&bytes).map_err(|err| FetchError::NotAnImage {
            url: url.to_string(),
            reason: err.to_string(),
        })?;

        Ok(Self {
            url: url.to_string(),
            bytes,
            format,
        })
    }

    /// File extension for archive entries.
    pub fn extension(&self) -> &'static str {
        match self.format {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
            ImageFormat::WebP => "webp",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Ico => "ico",
            _ => "png",
        }
    }

    pub fn decode(&self) -> Result<DynamicImage, FetchError> {
        image::load_from_memory_with_format(&self.bytes, self.format).map_err(|err| {
            FetchError::NotAnImage {
                url: self.url.clone(),
                reason: err.to_string(),
            }
        })
    }
}

/// URLs of the images one request refers to.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetUrls<'a> {
    pub cover: Option<&'a str>,
    pub logo: Option<&'a str>,
    pub mockup: Option<&'a str>,
    pub infographics: &'a [String],
}

/// Images successfully fetched for one request, in request order.
#[derive(Debug, Clone, Default)]
pub struct AssetSet {
    pub cover: Option<FetchedImage>,
    pub logo: Option<FetchedImage>,
    pub mockup: Option<FetchedImage>,
    /// Fetched infographics with their 1-based position in the request.
    pub infographics: Vec<(usize, FetchedImage)>,
}

#[derive(Clone, Copy)]
enum Slot {
    Cover,
    Logo,
    Mockup,
    Infographic(usize),
}

/// Fetch every image concurrently.
///
/// In lenient mode a failed image is logged and left out; in strict mode the
/// first failure is returned.
pub async fn fetch_assets(
    source: &dyn ImageSource,
    urls: AssetUrls<'_>,
    strict: bool,
) -> Result<AssetSet, FetchError> {
    let mut wanted: Vec<(Slot, &str)> = Vec::new();
    wanted.extend(urls.cover.map(|url| (Slot::Cover, url)));
    wanted.extend(urls.logo.map(|url| (Slot::Logo, url)));
    wanted.extend(urls.mockup.map(|url| (Slot::Mockup, url)));
    wanted.extend(
        urls.infographics
            .iter()
            .enumerate()
            .map(|(index, url)| (Slot::Infographic(index + 1), url.as_str())),
    );

    let results = join_all(wanted.iter().map(|(_, url)| async move {
        let bytes = source.fetch(url).await?;
        FetchedImage::sniff(url, bytes)
    }))
    .await;

    let mut assets = AssetSet::default();
    for ((slot, url), result) in wanted.into_iter().zip(results) {
        let image = match result {
            Ok(image) => image,
            Err(err) if strict => return Err(err),
            Err(err) => {
                tracing::warn!(url, error = %err, "skipping image that could not be fetched");
                continue;
            }
        };

        tracing::debug!(url, bytes = image.bytes.len(), format = ?image.format, "fetched image");
        match slot {
            Slot::Cover => assets.cover = Some(image),
            Slot::Logo => assets.logo = Some(image),
            Slot::Mockup => assets.mockup = Some(image),
            Slot::Infographic(number) => assets.infographics.push((number, image)),
        }
    }
    Ok(assets)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves images from memory and counts requests.
    #[derive(Default)]
    pub(crate) struct MemorySource {
        images: HashMap<String, Vec<u8>>,
        pub(crate) requests: AtomicUsize,
    }

    impl MemorySource {
        pub(crate) fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
            self.images.insert(url.to_string(), bytes);
            self
        }
    }

    #[async_trait]
    impl ImageSource for MemorySource {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.images.get(url).cloned().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    pub(crate) fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Jpeg).unwrap();
        bytes.into_inner()
    }

    #[tokio::test]
    async fn fetches_every_slot_in_order() {
        let source = MemorySource::default()
            .with("https://img/cover", png(4, 6))
            .with("https://img/logo", jpeg(8, 8))
            .with("https://img/1", png(2, 2))
            .with("https://img/2", png(3, 3));
        let infographics = vec!["https://img/1".to_string(), "https://img/2".to_string()];

        let assets = fetch_assets(
            &source,
            AssetUrls {
                cover: Some("https://img/cover"),
                logo: Some("https://img/logo"),
                mockup: None,
                infographics: &infographics,
            },
            false,
        )
        .await
        .unwrap();

        assert_eq!(assets.cover.as_ref().unwrap().extension(), "png");
        assert_eq!(assets.logo.as_ref().unwrap().extension(), "jpg");
        assert!(assets.mockup.is_none());
        let urls: Vec<_> = assets
            .infographics
            .iter()
            .map(|(number, image)| (*number, image.url.as_str()))
            .collect();
        assert_eq!(urls, vec![(1, "https://img/1"), (2, "https://img/2")]);
        assert_eq!(source.requests.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn lenient_mode_skips_failures() {
        let source = MemorySource::default().with("https://img/text", b"hello".to_vec());
        let assets = fetch_assets(
            &source,
            AssetUrls {
                cover: Some("https://img/missing"),
                mockup: Some("https://img/text"),
                ..AssetUrls::default()
            },
            false,
        )
        .await
        .unwrap();

        assert!(assets.cover.is_none());
        assert!(assets.mockup.is_none());
    }

    #[tokio::test]
    async fn infographics_keep_their_request_position() {
        let source = MemorySource::default().with("https://img/2", png(2, 2));
        let infographics = vec!["https://img/1".to_string(), "https://img/2".to_string()];
        let assets = fetch_assets(
            &source,
            AssetUrls {
                infographics: &infographics,
                ..AssetUrls::default()
            },
            false,
        )
        .await
        .unwrap();

        assert_eq!(assets.infographics.len(), 1);
        assert_eq!(assets.infographics[0].0, 2);
        assert_eq!(assets.infographics[0].1.url, "https://img/2");
    }

    #[tokio::test]
    async fn strict_mode_reports_the_failure() {
        let source = MemorySource::default();
        let err = fetch_assets(
            &source,
            AssetUrls {
                logo: Some("https://img/missing"),
                ..AssetUrls::default()
            },
            true,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    async fn serve(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{address}")
    }

    fn http_source(max_image_bytes: u64) -> HttpImageSource {
        HttpImageSource::new(&FetchSettings {
            max_image_bytes,
            ..FetchSettings::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn streamed_body_over_the_limit_is_rejected() {
        use axum::body::{Body, Bytes};
        use axum::routing::get;

        let router = axum::Router::new()
            .route(
                "/chunked",
                get(|| async {
                    let chunks = (0..8).map(|_| Ok::<_, std::io::Error>(Bytes::from(vec![0u8; 1024])));
                    Body::from_stream(futures::stream::iter(chunks))
                }),
            )
            .route("/sized", get(|| async { vec![0u8; 8192] }))
            .route("/small", get(|| async { png(2, 2) }));
        let base = serve(router).await;
        let source = http_source(4096);

        let err = source.fetch(&format!("{base}/chunked")).await.unwrap_err();
        assert!(matches!(err, FetchError::TooLarge { limit: 4096, .. }));

        let err = source.fetch(&format!("{base}/sized")).await.unwrap_err();
        assert!(matches!(err, FetchError::TooLarge { limit: 4096, .. }));

        let bytes = source.fetch(&format!("{base}/small")).await.unwrap();
        assert_eq!(bytes, png(2, 2));
    }

    #[test]
    fn decodes_sniffed_images() {
        let image = FetchedImage::sniff("mem", png(5, 7)).unwrap();
        let decoded = image.decode().unwrap();
        assert_eq!((decoded.width(), decoded.height()), (5, 7));
    }
}
