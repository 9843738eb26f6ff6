pub mod composer;
pub mod converter;
pub mod dispatcher;
pub mod docx;
pub mod exporter;
pub mod style;
pub mod world_bank;

pub use crate::domain::model::{ExportArtifact, ExportFormat, ExportResponse, Layout, PortfolioRecord};
pub use crate::domain::ports::{ConfigProvider, FileSink, ImageFetcher, PdfRenderer, RecordSource};
pub use crate::utils::error::Result;
