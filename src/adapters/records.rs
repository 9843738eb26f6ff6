use crate::domain::model::PortfolioRecord;
use crate::domain::ports::RecordSource;
use crate::utils::error::{ExportError, Result};
use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// Host API envelope: `{"data": {...}}`.
#[derive(Debug, Deserialize)]
struct Envelope {
    data: PortfolioRecord,
}

fn with_name(mut record: PortfolioRecord, name: &str) -> PortfolioRecord {
    if record.name.trim().is_empty() {
        record.name = name.to_string();
    }
    record
}

/// Reads `<dir>/<name>.json`, either a bare record or a `{"data": ...}` envelope.
#[derive(Debug, Clone)]
pub struct JsonDirRecordSource {
    base_path: PathBuf,
}

impl JsonDirRecordSource {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl RecordSource for JsonDirRecordSource {
    async fn get_portfolio(&self, name: &str) -> Result<PortfolioRecord> {
        let not_found = || ExportError::RecordNotFound {
            name: name.to_string(),
        };
        if name.is_empty() || name.contains(['/', '\\', '\0']) || name.contains("..") {
            return Err(not_found());
        }

        let path = self.base_path.join(format!("{}.json", name));
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };

        let mut value: serde_json::Value = serde_json::from_slice(&data)?;
        if let Some(inner) = value.get_mut("data").filter(|v| v.is_object()) {
            value = inner.take();
        }
        let record: PortfolioRecord = serde_json::from_value(value)?;
        Ok(with_name(record, name))
    }
}

/// Host application REST API: `GET {endpoint}/api/resource/Portfolio/{name}`.
#[derive(Debug, Clone)]
pub struct ApiRecordSource {
    endpoint: Url,
    client: Client,
    authorization: Option<String>,
}

impl ApiRecordSource {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| ExportError::InvalidConfigValueError {
            field: "source.endpoint".to_string(),
            value: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            endpoint,
            client: Client::new(),
            authorization: None,
        })
    }

    pub fn with_token(mut self, api_key: &str, api_secret: &str) -> Self {
        self.authorization = Some(format!("token {}:{}", api_key, api_secret));
        self
    }

    fn record_url(&self, name: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ExportError::InvalidConfigValueError {
                field: "source.endpoint".to_string(),
                value: self.endpoint.to_string(),
                reason: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(["api", "resource", "Portfolio", name]);
        Ok(url)
    }
}

impl RecordSource for ApiRecordSource {
    async fn get_portfolio(&self, name: &str) -> Result<PortfolioRecord> {
        let url = self.record_url(name)?;
        tracing::debug!("Fetching portfolio from: {}", url);

        let mut request = self.client.get(url);
        if let Some(authorization) = &self.authorization {
            request = request.header(AUTHORIZATION, authorization);
        }
        let response = request.send().await?;

        tracing::debug!("API response status: {}", response.status());
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ExportError::RecordNotFound {
                name: name.to_string(),
            });
        }

        let envelope: Envelope = response.error_for_status()?.json().await?;
        Ok(with_name(envelope.data, name))
    }
}
