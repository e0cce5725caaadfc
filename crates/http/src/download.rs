//! Binary attachment responses.

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// A file returned as an attachment download.
#[derive(Debug)]
pub struct Download {
    bytes: Vec<u8>,
    content_type: &'static str,
    filename: String,
}

impl Download {
    pub fn new(bytes: Vec<u8>, content_type: &'static str, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type,
            filename: filename.into(),
        }
    }

    pub fn pdf(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self::new(bytes, PDF_CONTENT_TYPE, filename)
    }

    pub fn zip(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self::new(bytes, ZIP_CONTENT_TYPE, filename)
    }
}

impl IntoResponse for Download {
    fn into_response(self) -> Response {
        let disposition = HeaderValue::from_str(&content_disposition(&self.filename))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

        (
            [
                (
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(self.content_type),
                ),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}

/// `attachment` disposition with an ASCII fallback name and the exact
/// UTF-8 name in `filename*` (RFC 6266 / RFC 5987).
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if fallback == filename {
        format!("attachment; filename=\"{filename}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            percent_encode(filename)
        )
    }
}

fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        let attr_char = byte.is_ascii_alphanumeric()
            || matches!(
                byte,
                b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
            );
        if attr_char {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_names_are_quoted_verbatim() {
        assert_eq!(
            content_disposition("My_Ebook.pdf"),
            "attachment; filename=\"My_Ebook.pdf\""
        );
    }

    #[test]
    fn unicode_names_get_an_encoded_variant() {
        let value = content_disposition("Zażółć.pdf");
        assert!(value.starts_with("attachment; filename=\"Za____.pdf\""));
        assert!(value.ends_with("filename*=UTF-8''Za%C5%BC%C3%B3%C5%82%C4%87.pdf"));
    }

    #[test]
    fn response_carries_type_and_disposition() {
        let response = Download::zip(vec![1, 2, 3], "bundle.zip").into_response();
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"bundle.zip\""
        );
    }
}
