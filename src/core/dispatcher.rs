use crate::core::converter;
use crate::core::docx::DocxWriter;
use crate::core::world_bank;
use crate::domain::document::DEFAULT_IMAGE_WIDTH_INCHES;
use crate::domain::model::{ArtifactKind, ExportArtifact, ExportFormat, PortfolioRecord};
use crate::domain::ports::{ImageFetcher, PdfRenderer};
use crate::utils::error::{ExportError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

const ENTRY_STEM: &str = "portfolio_export";

/// Turns composed HTML (or the records themselves) into artifacts.
pub struct FormatDispatcher<'a> {
    pdf: &'a dyn PdfRenderer,
    images: &'a dyn ImageFetcher,
    base_url: &'a str,
    zip_html: bool,
    default_image_width: f32,
}

impl<'a> FormatDispatcher<'a> {
    pub fn new(pdf: &'a dyn PdfRenderer, images: &'a dyn ImageFetcher, base_url: &'a str) -> Self {
        Self {
            pdf,
            images,
            base_url,
            zip_html: false,
            default_image_width: DEFAULT_IMAGE_WIDTH_INCHES,
        }
    }

    pub fn zip_html(mut self, enabled: bool) -> Self {
        self.zip_html = enabled;
        self
    }

    pub fn default_image_width(mut self, inches: f32) -> Self {
        self.default_image_width = inches;
        self
    }

    /// One artifact for the whole request; several formats are bundled in a zip.
    pub async fn dispatch(
        &self,
        formats: &[ExportFormat],
        html: &str,
        records: &[PortfolioRecord],
    ) -> Result<ExportArtifact> {
        // 重複的格式只產生一次，保留首次出現的順序
        let mut unique: Vec<ExportFormat> = Vec::with_capacity(formats.len());
        for format in formats {
            if !unique.contains(format) {
                unique.push(*format);
            }
        }

        match unique.as_slice() {
            [] => Err(ExportError::UnsupportedFormat {
                format: String::new(),
            }),
            [ExportFormat::Html] if self.zip_html => {
                let entries = vec![(entry_name(ExportFormat::Html), html.as_bytes().to_vec())];
                Ok(ExportArtifact::new(zip_entries(&entries)?, ArtifactKind::Zip))
            }
            [format] => self.produce(*format, html, records).await,
            _ => {
                let mut entries = Vec::with_capacity(unique.len());
                for format in &unique {
                    let artifact = self.produce(*format, html, records).await?;
                    entries.push((entry_name(*format), artifact.data));
                }
                tracing::debug!("Bundling {} artifacts into a zip", entries.len());
                Ok(ExportArtifact::new(zip_entries(&entries)?, ArtifactKind::Zip))
            }
        }
    }

    pub async fn produce(
        &self,
        format: ExportFormat,
        html: &str,
        records: &[PortfolioRecord],
    ) -> Result<ExportArtifact> {
        tracing::debug!("Producing {} artifact", format);
        let writer = DocxWriter::new(self.images).with_default_image_width(self.default_image_width);

        let data = match format {
            ExportFormat::Pdf => self.pdf.render(html).await?,
            ExportFormat::Docx => {
                let document = converter::convert(html, self.base_url);
                writer.render(&document).await?
            }
            ExportFormat::WorldBank => {
                let document = world_bank::build_document(records);
                writer.render(&document).await?
            }
            ExportFormat::Html => html.as_bytes().to_vec(),
        };

        Ok(ExportArtifact::new(data, format.artifact_kind()))
    }
}

fn entry_name(format: ExportFormat) -> String {
    match format {
        ExportFormat::WorldBank => format!("{}_world_bank.docx", ENTRY_STEM),
        other => format!("{}.{}", ENTRY_STEM, other.artifact_kind().extension()),
    }
}

pub fn zip_entries(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for (name, data) in entries {
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(data)?;
    }

    // 完成並取回底層 Vec<u8>
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Layout;
    use async_trait::async_trait;
    use std::io::Read;

    struct EchoPdf;

    #[async_trait]
    impl PdfRenderer for EchoPdf {
        async fn render(&self, html: &str) -> Result<Vec<u8>> {
            Ok(format!("%PDF-1.4\n{}", html.len()).into_bytes())
        }
    }

    struct NoImages;

    #[async_trait]
    impl ImageFetcher for NoImages {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            Err(ExportError::DocumentError {
                message: format!("offline: {}", url),
            })
        }
    }

    fn records() -> Vec<PortfolioRecord> {
        vec![PortfolioRecord {
            name: "PRJ-1".to_string(),
            title: Some("Atlas".to_string()),
            ..Default::default()
        }]
    }

    fn zip_names(data: &[u8]) -> Vec<String> {
        let archive = zip::ZipArchive::new(std::io::Cursor::new(data)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_single_formats() {
        let html = crate::core::composer::compose(&records(), Layout::Kartoza, "https://site");
        let dispatcher = FormatDispatcher::new(&EchoPdf, &NoImages, "https://site");

        let pdf = dispatcher.dispatch(&[ExportFormat::Pdf], &html, &records()).await.unwrap();
        assert_eq!(pdf.kind, ArtifactKind::Pdf);
        assert!(pdf.data.starts_with(b"%PDF"));

        let docx = dispatcher.dispatch(&[ExportFormat::Docx], &html, &records()).await.unwrap();
        assert_eq!(docx.kind, ArtifactKind::Docx);
        assert!(!docx.data.is_empty());

        let wb = dispatcher
            .dispatch(&[ExportFormat::WorldBank], &html, &records())
            .await
            .unwrap();
        assert_eq!(wb.kind, ArtifactKind::Docx);

        let raw = dispatcher.dispatch(&[ExportFormat::Html], &html, &records()).await.unwrap();
        assert_eq!(raw.kind, ArtifactKind::Html);
        assert_eq!(raw.data, html.as_bytes());
    }

    #[tokio::test]
    async fn test_zip_html_packaging() {
        let dispatcher = FormatDispatcher::new(&EchoPdf, &NoImages, "https://site").zip_html(true);
        let artifact = dispatcher
            .dispatch(&[ExportFormat::Html], "<html></html>", &records())
            .await
            .unwrap();

        assert_eq!(artifact.kind, ArtifactKind::Zip);
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(artifact.data)).unwrap();
        let mut content = String::new();
        archive
            .by_name("portfolio_export.html")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "<html></html>");
    }

    #[tokio::test]
    async fn test_multiple_formats_are_bundled() {
        let dispatcher = FormatDispatcher::new(&EchoPdf, &NoImages, "https://site");
        let artifact = dispatcher
            .dispatch(
                &[ExportFormat::Pdf, ExportFormat::Docx, ExportFormat::WorldBank],
                "<html><body><p>x</p></body></html>",
                &records(),
            )
            .await
            .unwrap();

        assert_eq!(artifact.kind, ArtifactKind::Zip);
        assert_eq!(
            zip_names(&artifact.data),
            vec![
                "portfolio_export.docx",
                "portfolio_export.pdf",
                "portfolio_export_world_bank.docx",
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_formats_are_produced_once() {
        let dispatcher = FormatDispatcher::new(&EchoPdf, &NoImages, "https://site");

        let single = dispatcher
            .dispatch(&[ExportFormat::Pdf, ExportFormat::Pdf], "<html></html>", &records())
            .await
            .unwrap();
        assert_eq!(single.kind, ArtifactKind::Pdf);

        let bundle = dispatcher
            .dispatch(
                &[ExportFormat::Html, ExportFormat::Pdf, ExportFormat::Html],
                "<html></html>",
                &records(),
            )
            .await
            .unwrap();
        assert_eq!(bundle.kind, ArtifactKind::Zip);
        assert_eq!(
            zip_names(&bundle.data),
            vec!["portfolio_export.html", "portfolio_export.pdf"]
        );
    }

    #[tokio::test]
    async fn test_no_formats_is_unsupported() {
        let dispatcher = FormatDispatcher::new(&EchoPdf, &NoImages, "https://site");
        let result = dispatcher.dispatch(&[], "", &records()).await;
        assert!(matches!(result, Err(ExportError::UnsupportedFormat { .. })));
    }
}
