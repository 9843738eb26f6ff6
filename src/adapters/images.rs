use crate::domain::ports::ImageFetcher;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Downloads embedded images over HTTP, one request per call.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("Fetching image: {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ExportError;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let server = MockServer::start();
        let image_mock = server.mock(|when, then| {
            when.method(GET).path("/files/logo.png");
            then.status(200)
                .header("Content-Type", "image/png")
                .body([0x89, b'P', b'N', b'G']);
        });

        let fetcher = HttpImageFetcher::new(5).unwrap();
        let data = fetcher.fetch(&server.url("/files/logo.png")).await.unwrap();

        image_mock.assert();
        assert_eq!(data, vec![0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/files/gone.png");
            then.status(404);
        });

        let fetcher = HttpImageFetcher::new(5).unwrap();
        let result = fetcher.fetch(&server.url("/files/gone.png")).await;
        assert!(matches!(result, Err(ExportError::HttpError(_))));
    }
}
