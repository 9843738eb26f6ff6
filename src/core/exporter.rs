use crate::core::composer;
use crate::core::dispatcher::FormatDispatcher;
use crate::domain::document::DEFAULT_IMAGE_WIDTH_INCHES;
use crate::domain::model::{ExportFormat, ExportRequest, ExportResponse, Layout};
use crate::domain::ports::{ConfigProvider, FileSink, ImageFetcher, PdfRenderer, RecordSource};
use crate::utils::error::{ExportError, Result};
use chrono::Local;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub base_url: String,
    pub zip_html: bool,
    pub default_image_width_inches: f32,
}

impl ExportOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            zip_html: false,
            default_image_width_inches: DEFAULT_IMAGE_WIDTH_INCHES,
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            zip_html: config.zip_html(),
            default_image_width_inches: config.default_image_width_inches(),
        }
    }
}

/// Parses the JSON-encoded identifier list sent by the list view.
pub fn parse_portfolio_names(portfolio_names: &str) -> Result<Vec<String>> {
    if portfolio_names.trim().is_empty() {
        return Err(ExportError::NoPortfolioNames);
    }
    let names: Vec<String> = serde_json::from_str(portfolio_names).map_err(|e| {
        ExportError::InvalidPortfolioNames {
            message: e.to_string(),
        }
    })?;
    Ok(names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}

pub fn export_file_name(extension: &str) -> String {
    format!(
        "portfolio_export_{}.{}",
        Local::now().format("%Y%m%d%H%M%S"),
        extension
    )
}

pub struct PortfolioExporter<R: RecordSource, S: FileSink> {
    records: R,
    sink: S,
    pdf: Box<dyn PdfRenderer>,
    images: Box<dyn ImageFetcher>,
    options: ExportOptions,
}

impl<R: RecordSource, S: FileSink> PortfolioExporter<R, S> {
    pub fn new(
        records: R,
        sink: S,
        pdf: Box<dyn PdfRenderer>,
        images: Box<dyn ImageFetcher>,
        options: ExportOptions,
    ) -> Self {
        Self {
            records,
            sink,
            pdf,
            images,
            options,
        }
    }

    /// Entry point mirroring the remote call: `(portfolio_names, format, layout)`.
    pub async fn export_portfolio(
        &self,
        portfolio_names: &str,
        format: &str,
        layout: Option<&str>,
    ) -> Result<ExportResponse> {
        // 名單檢查先於格式檢查
        let portfolio_names = parse_portfolio_names(portfolio_names)?;
        if portfolio_names.is_empty() {
            return Err(ExportError::NoPortfolioNames);
        }

        let request = ExportRequest {
            portfolio_names,
            formats: ExportFormat::parse_list(format)?,
            layout: Layout::from_option(layout)?,
        };
        self.export(&request).await
    }

    pub async fn export(&self, request: &ExportRequest) -> Result<ExportResponse> {
        if request.portfolio_names.is_empty() {
            return Err(ExportError::NoPortfolioNames);
        }
        if request.formats.is_empty() {
            return Err(ExportError::UnsupportedFormat {
                format: String::new(),
            });
        }

        tracing::info!(
            "📄 Exporting {} portfolios as {:?} ({:?} layout)",
            request.portfolio_names.len(),
            request.formats,
            request.layout
        );

        let mut records = Vec::with_capacity(request.portfolio_names.len());
        for name in &request.portfolio_names {
            tracing::debug!("Loading portfolio {}", name);
            records.push(self.records.get_portfolio(name).await?);
        }

        let html = composer::compose(&records, request.layout, &self.options.base_url);
        tracing::debug!("Composed {} bytes of HTML", html.len());

        let dispatcher = FormatDispatcher::new(
            self.pdf.as_ref(),
            self.images.as_ref(),
            &self.options.base_url,
        )
        .zip_html(self.options.zip_html)
        .default_image_width(self.options.default_image_width_inches);
        let artifact = dispatcher.dispatch(&request.formats, &html, &records).await?;

        let file_name = export_file_name(artifact.kind.extension());
        tracing::debug!("Saving {} ({} bytes)", file_name, artifact.data.len());
        let file_url = self.sink.save_private(&file_name, &artifact.data).await?;

        tracing::info!("✅ Export saved to {}", file_url);
        Ok(ExportResponse::success(file_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PortfolioRecord;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    struct MockRecords {
        records: HashMap<String, PortfolioRecord>,
    }

    impl MockRecords {
        fn with(names: &[&str]) -> Self {
            let records = names
                .iter()
                .map(|name| {
                    (
                        name.to_string(),
                        PortfolioRecord {
                            name: name.to_string(),
                            title: Some(format!("Project {}", name)),
                            ..Default::default()
                        },
                    )
                })
                .collect();
            Self { records }
        }
    }

    impl RecordSource for MockRecords {
        async fn get_portfolio(&self, name: &str) -> Result<PortfolioRecord> {
            self.records
                .get(name)
                .cloned()
                .ok_or_else(|| ExportError::RecordNotFound {
                    name: name.to_string(),
                })
        }
    }

    #[derive(Clone)]
    struct MockSink {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockSink {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }
    }

    impl FileSink for MockSink {
        async fn save_private(&self, file_name: &str, data: &[u8]) -> Result<String> {
            let mut files = self.files.lock().await;
            files.insert(file_name.to_string(), data.to_vec());
            Ok(format!("/private/files/{}", file_name))
        }
    }

    struct FakePdf;

    #[async_trait]
    impl PdfRenderer for FakePdf {
        async fn render(&self, _html: &str) -> Result<Vec<u8>> {
            Ok(b"%PDF-1.4 fake".to_vec())
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

    fn exporter(sink: MockSink) -> PortfolioExporter<MockRecords, MockSink> {
        PortfolioExporter::new(
            MockRecords::with(&["PRJ-1", "PRJ-2"]),
            sink,
            Box::new(FakePdf),
            Box::new(NoImages),
            ExportOptions::new("https://erp.example.com"),
        )
    }

    #[tokio::test]
    async fn test_every_format_succeeds() {
        for format in ["pdf", "docx", "html", "world_bank"] {
            let sink = MockSink::new();
            let response = exporter(sink.clone())
                .export_portfolio(r#"["PRJ-1","PRJ-2"]"#, format, None)
                .await
                .unwrap();

            assert_eq!(response.status, "success");
            assert!(response.file_url.starts_with("/private/files/portfolio_export_"));

            let files = sink.files.lock().await;
            assert_eq!(files.len(), 1);
            let (name, data) = files.iter().next().unwrap();
            let extension = if format == "world_bank" { "docx" } else { format };
            assert!(name.ends_with(&format!(".{}", extension)));
            assert!(!data.is_empty());
        }
    }

    #[tokio::test]
    async fn test_empty_names_fail_regardless_of_format() {
        for names in ["", "[]", "[\"  \"]"] {
            for format in ["pdf", "odt"] {
                let result = exporter(MockSink::new())
                    .export_portfolio(names, format, None)
                    .await;
                assert!(
                    matches!(result, Err(ExportError::NoPortfolioNames)),
                    "names={:?} format={}",
                    names,
                    format
                );
            }
        }
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let result = exporter(MockSink::new())
            .export_portfolio(r#"["PRJ-1"]"#, "odt", None)
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedFormat { .. }));
        assert!(err.to_string().starts_with("Unsupported file format"));
    }

    #[tokio::test]
    async fn test_unknown_record_and_bad_names() {
        let result = exporter(MockSink::new())
            .export_portfolio(r#"["PRJ-404"]"#, "docx", None)
            .await;
        assert!(matches!(result, Err(ExportError::RecordNotFound { .. })));

        let result = exporter(MockSink::new())
            .export_portfolio("PRJ-1", "docx", None)
            .await;
        assert!(matches!(result, Err(ExportError::InvalidPortfolioNames { .. })));
    }

    #[tokio::test]
    async fn test_multiple_formats_store_a_zip() {
        let sink = MockSink::new();
        let response = exporter(sink.clone())
            .export_portfolio(r#"["PRJ-1"]"#, "pdf,docx", Some("world bank"))
            .await
            .unwrap();
        assert!(response.file_url.ends_with(".zip"));
    }

    #[tokio::test]
    async fn test_typed_request_with_repeated_format() {
        let sink = MockSink::new();
        let request = ExportRequest {
            portfolio_names: vec!["PRJ-1".to_string()],
            formats: vec![ExportFormat::Pdf, ExportFormat::Pdf],
            layout: Layout::Kartoza,
        };

        let response = exporter(sink.clone()).export(&request).await.unwrap();

        assert!(response.file_url.ends_with(".pdf"));
        let files = sink.files.lock().await;
        let data = files.values().next().unwrap();
        assert_eq!(data, b"%PDF-1.4 fake");
    }

    #[test]
    fn test_export_file_name() {
        let name = export_file_name("pdf");
        assert!(name.starts_with("portfolio_export_"));
        assert!(name.ends_with(".pdf"));
        // portfolio_export_ + 14 位時間戳 + .pdf
        assert_eq!(name.len(), "portfolio_export_".len() + 14 + 4);
    }
}
