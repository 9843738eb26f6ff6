pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{build_exporter, LocalFileSink};
pub use core::exporter::{ExportOptions, PortfolioExporter};
pub use domain::model::{ExportFormat, ExportRequest, ExportResponse, Layout};
pub use utils::error::{ExportError, Result};
