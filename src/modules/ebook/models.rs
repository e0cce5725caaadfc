use folio_http::error::FieldError;
use folio_kernel::settings::DocumentSettings;
use serde::{Deserialize, Serialize};

/// Table of contents row as sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocItem {
    pub title: String,
    pub page: u32,
}

/// Body of `POST /generate-pdf`.
///
/// Every field is optional at the serde level so that validation can report
/// all missing fields at once.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PdfRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub toc_items: Option<Vec<TocItem>>,
    #[serde(default)]
    pub keywords_to_bold: Option<Vec<String>>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub infographic_urls: Option<Vec<String>>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// Body of `POST /generate-zip`: the PDF fields plus marketing assets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZipRequest {
    #[serde(default, alias = "pdf_content")]
    pub content: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub toc_items: Option<Vec<TocItem>>,
    #[serde(default)]
    pub keywords_to_bold: Option<Vec<String>>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub infographic_urls: Option<Vec<String>>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub mockup_url: Option<String>,
    #[serde(default)]
    pub blog_post: Option<String>,
    #[serde(default)]
    pub shop_description: Option<String>,
}

/// A validated document request with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentJob {
    pub content: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub toc: Vec<TocItem>,
    pub keywords: Vec<String>,
    pub cover_url: Option<String>,
    pub infographic_urls: Vec<String>,
    pub logo_url: Option<String>,
}

/// A validated bundle request.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleJob {
    pub document: DocumentJob,
    pub mockup_url: Option<String>,
    pub blog_post: Option<String>,
    pub shop_description: Option<String>,
}

impl PdfRequest {
    pub fn into_job(self, defaults: &DocumentSettings) -> Result<DocumentJob, Vec<FieldError>> {
        let mut errors = Vec::new();
        let job = DocumentJob {
            content: required("content", self.content, &mut errors),
            title: required("title", self.title, &mut errors),
            subtitle: or_default(self.subtitle, &defaults.default_subtitle),
            author: or_default(self.author, &defaults.default_author),
            toc: self.toc_items.unwrap_or_default(),
            keywords: self.keywords_to_bold.unwrap_or_default(),
            cover_url: optional_url("cover_url", self.cover_url, &mut errors),
            infographic_urls: url_list("infographic_urls", self.infographic_urls, &mut errors),
            logo_url: optional_url("logo_url", self.logo_url, &mut errors),
        };

        if errors.is_empty() {
            Ok(job)
        } else {
            Err(errors)
        }
    }
}

impl ZipRequest {
    pub fn into_job(self, defaults: &DocumentSettings) -> Result<BundleJob, Vec<FieldError>> {
        let mut errors = Vec::new();
        let mockup_url = optional_url("mockup_url", self.mockup_url, &mut errors);

        let document = PdfRequest {
            content: self.content,
            title: self.title,
            subtitle: self.subtitle,
            author: self.author,
            toc_items: self.toc_items,
            keywords_to_bold: self.keywords_to_bold,
            cover_url: self.cover_url,
            infographic_urls: self.infographic_urls,
            logo_url: self.logo_url,
        }
        .into_job(defaults);

        let document = match document {
            Ok(document) if errors.is_empty() => document,
            Ok(_) => return Err(errors),
            Err(mut document_errors) => {
                document_errors.extend(errors);
                return Err(document_errors);
            }
        };

        Ok(BundleJob {
            document,
            mockup_url,
            blog_post: non_blank(self.blog_post),
            shop_description: non_blank(self.shop_description),
        })
    }
}

fn required(field: &str, value: Option<String>, errors: &mut Vec<FieldError>) -> String {
    match non_blank(value) {
        Some(value) => value,
        None => {
            errors.push(FieldError::required(field));
            String::new()
        }
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    non_blank(value).unwrap_or_else(|| default.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn optional_url(field: &str, value: Option<String>, errors: &mut Vec<FieldError>) -> Option<String> {
    let url = non_blank(value)?.trim().to_string();
    match check_url(&url) {
        Ok(()) => Some(url),
        Err(reason) => {
            errors.push(FieldError::new(field, reason));
            None
        }
    }
}

fn url_list(field: &str, values: Option<Vec<String>>, errors: &mut Vec<FieldError>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(index, url)| optional_url(&format!("{field}[{index}]"), Some(url), errors))
        .collect()
}

fn check_url(url: &str) -> Result<(), String> {
    let parsed = reqwest::Url::parse(url).map_err(|err| format!("invalid URL: {err}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!("unsupported URL scheme '{scheme}', expected http or https")),
    }
}
