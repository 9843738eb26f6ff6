// Adapters layer: concrete implementations of the domain ports.

pub mod file_sink;
pub mod images;
pub mod pdf;
pub mod records;

pub use file_sink::LocalFileSink;
pub use images::HttpImageFetcher;
pub use pdf::{CommandPdfRenderer, HttpPdfRenderer};
pub use records::{ApiRecordSource, JsonDirRecordSource};

use crate::config::toml_config::{PdfRendererType, SourceType, TomlConfig};
use crate::core::exporter::{ExportOptions, PortfolioExporter};
use crate::domain::model::PortfolioRecord;
use crate::domain::ports::{ConfigProvider, PdfRenderer, RecordSource};
use crate::utils::error::{ExportError, Result};

/// Record source selected by `[source] type`.
#[derive(Debug, Clone)]
pub enum ConfiguredRecordSource {
    JsonDir(JsonDirRecordSource),
    Api(ApiRecordSource),
}

impl RecordSource for ConfiguredRecordSource {
    async fn get_portfolio(&self, name: &str) -> Result<PortfolioRecord> {
        match self {
            Self::JsonDir(source) => source.get_portfolio(name).await,
            Self::Api(source) => source.get_portfolio(name).await,
        }
    }
}

pub fn record_source(config: &TomlConfig) -> Result<ConfiguredRecordSource> {
    match config.source.r#type {
        SourceType::JsonDir => {
            let path = config
                .source
                .path
                .as_deref()
                .ok_or_else(|| ExportError::MissingConfigError {
                    field: "source.path".to_string(),
                })?;
            Ok(ConfiguredRecordSource::JsonDir(JsonDirRecordSource::new(
                path,
            )))
        }
        SourceType::Api => {
            let mut source = ApiRecordSource::new(config.source_endpoint())?;
            if let (Some(key), Some(secret)) = (&config.source.api_key, &config.source.api_secret)
            {
                source = source.with_token(key, secret);
            }
            Ok(ConfiguredRecordSource::Api(source))
        }
    }
}

pub fn pdf_renderer(config: &TomlConfig) -> Result<Box<dyn PdfRenderer>> {
    match config.pdf.renderer {
        PdfRendererType::Command => Ok(Box::new(CommandPdfRenderer::new(
            config.pdf.program.clone(),
            config.pdf.args.clone(),
        ))),
        PdfRendererType::Http => {
            let endpoint =
                config
                    .pdf
                    .endpoint
                    .as_deref()
                    .ok_or_else(|| ExportError::MissingConfigError {
                        field: "pdf.endpoint".to_string(),
                    })?;
            Ok(Box::new(HttpPdfRenderer::new(
                endpoint,
                config.pdf.timeout_seconds,
            )?))
        }
    }
}

/// Wires every adapter described by the configuration into an exporter.
pub fn build_exporter(
    config: &TomlConfig,
) -> Result<PortfolioExporter<ConfiguredRecordSource, LocalFileSink>> {
    let records = record_source(config)?;
    let sink = LocalFileSink::new(config.output_path(), config.url_prefix());
    let pdf = pdf_renderer(config)?;
    let images = HttpImageFetcher::new(config.image_timeout_seconds())?;

    Ok(PortfolioExporter::new(
        records,
        sink,
        pdf,
        Box::new(images),
        ExportOptions::from_config(config),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_json_dir_source_from_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("PRJ-1.json"), r#"{"title": "Atlas"}"#).unwrap();

        let mut config = TomlConfig::default();
        config.source.path = Some(dir.path().to_string_lossy().to_string());

        let source = record_source(&config).unwrap();
        assert!(matches!(source, ConfiguredRecordSource::JsonDir(_)));
        assert_eq!(source.get_portfolio("PRJ-1").await.unwrap().title(), "Atlas");
    }

    #[test]
    fn test_api_source_and_http_renderer_from_config() {
        let config = TomlConfig::from_toml_str(
            r#"
[site]
base_url = "https://erp.example.com"

[source]
type = "api"

[pdf]
renderer = "http"
endpoint = "http://localhost:3000/render"
"#,
        )
        .unwrap();

        assert!(matches!(
            record_source(&config).unwrap(),
            ConfiguredRecordSource::Api(_)
        ));
        assert!(pdf_renderer(&config).is_ok());
        assert!(build_exporter(&config).is_ok());
    }

    #[test]
    fn test_http_renderer_requires_endpoint() {
        let mut config = TomlConfig::default();
        config.pdf.renderer = PdfRendererType::Http;
        assert!(matches!(
            pdf_renderer(&config),
            Err(ExportError::MissingConfigError { .. })
        ));
    }
}
