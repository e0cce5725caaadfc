//! ZIP bundle of the PDF and its marketing assets.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::assets::AssetSet;

pub const BLOG_POST_ENTRY: &str = "blog_post.md";
pub const SHOP_DESCRIPTION_ENTRY: &str = "opis_sklepu.md";

/// Everything that goes into one bundle.
pub struct BundleContents<'a> {
    pub pdf_name: &'a str,
    pub pdf: &'a [u8],
    pub assets: &'a AssetSet,
    pub blog_post: Option<&'a str>,
    pub shop_description: Option<&'a str>,
}

impl BundleContents<'_> {
    /// Entry names paired with their data, in archive order.
    pub fn entries(&self) -> Vec<(String, &[u8])> {
        let mut entries: Vec<(String, &[u8])> = vec![(self.pdf_name.to_string(), self.pdf)];

        if let Some(cover) = &self.assets.cover {
            entries.push((format!("cover_a4.{}", cover.extension()), cover.bytes.as_slice()));
        }
        if let Some(mockup) = &self.assets.mockup {
            entries.push((format!("mockup_tablet.{}", mockup.extension()), mockup.bytes.as_slice()));
        }
        for (number, infographic) in &self.assets.infographics {
            entries.push((
                format!("infographic_{number}.{}", infographic.extension()),
                infographic.bytes.as_slice(),
            ));
        }
        if let Some(blog_post) = self.blog_post {
            entries.push((BLOG_POST_ENTRY.to_string(), blog_post.as_bytes()));
        }
        if let Some(description) = self.shop_description {
            entries.push((SHOP_DESCRIPTION_ENTRY.to_string(), description.as_bytes()));
        }
        if let Some(logo) = &self.assets.logo {
            entries.push((format!("logo_fotz.{}", logo.extension()), logo.bytes.as_slice()));
        }
        entries
    }
}

/// Write a deflate-compressed ZIP archive in memory.
pub fn build_archive(contents: &BundleContents<'_>) -> zip::result::ZipResult<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, data) in contents.entries() {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(data)?;
    }

    let archive = writer.finish()?.into_inner();
    tracing::debug!(bytes = archive.len(), "wrote ZIP bundle");
    Ok(archive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::ebook::assets::tests::{jpeg, png};
    use crate::modules::ebook::assets::FetchedImage;
    use std::io::Read;
    use zip::ZipArchive;

    fn names(bytes: Vec<u8>) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(str::to_string).collect::<Vec<_>>()
    }

    #[test]
    fn bundle_holds_pdf_and_every_asset() {
        let assets = AssetSet {
            cover: Some(FetchedImage::sniff("c", png(2, 2)).unwrap()),
            logo: Some(FetchedImage::sniff("l", png(2, 2)).unwrap()),
            mockup: Some(FetchedImage::sniff("m", jpeg(2, 2)).unwrap()),
            infographics: vec![
                (1, FetchedImage::sniff("1", png(2, 2)).unwrap()),
                (2, FetchedImage::sniff("2", jpeg(2, 2)).unwrap()),
            ],
        };
        let contents = BundleContents {
            pdf_name: "Poradnik.pdf",
            pdf: b"%PDF-1.3",
            assets: &assets,
            blog_post: Some("# Blog"),
            shop_description: Some("Opis"),
        };

        let mut names = names(build_archive(&contents).unwrap());
        names.sort();
        assert_eq!(
            names,
            vec![
                "Poradnik.pdf",
                "blog_post.md",
                "cover_a4.png",
                "infographic_1.png",
                "infographic_2.jpg",
                "logo_fotz.png",
                "mockup_tablet.jpg",
                "opis_sklepu.md",
            ]
        );
    }

    #[test]
    fn infographic_names_follow_request_positions() {
        let assets = AssetSet {
            infographics: vec![(2, FetchedImage::sniff("2", png(2, 2)).unwrap())],
            ..AssetSet::default()
        };
        let contents = BundleContents {
            pdf_name: "ebook.pdf",
            pdf: b"%PDF-1.3",
            assets: &assets,
            blog_post: None,
            shop_description: None,
        };

        let mut names = names(build_archive(&contents).unwrap());
        names.sort();
        assert_eq!(names, vec!["ebook.pdf", "infographic_2.png"]);
    }

    #[test]
    fn minimal_bundle_is_just_the_pdf() {
        let assets = AssetSet::default();
        let contents = BundleContents {
            pdf_name: "ebook.pdf",
            pdf: b"%PDF-1.3",
            assets: &assets,
            blog_post: None,
            shop_description: None,
        };

        let bytes = build_archive(&contents).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);

        let mut pdf = String::new();
        archive
            .by_name("ebook.pdf")
            .unwrap()
            .read_to_string(&mut pdf)
            .unwrap();
        assert_eq!(pdf, "%PDF-1.3");
    }
}
