use crate::domain::model::PortfolioRecord;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait RecordSource: Send + Sync {
    fn get_portfolio(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<PortfolioRecord>> + Send;
}

pub trait FileSink: Send + Sync {
    /// Stores a private file and returns the URL it can be retrieved from.
    fn save_private(
        &self,
        file_name: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn output_path(&self) -> &str;
    fn url_prefix(&self) -> &str;
    fn zip_html(&self) -> bool;
    fn image_timeout_seconds(&self) -> u64;
    fn default_image_width_inches(&self) -> f32;
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<Vec<u8>>;
}
