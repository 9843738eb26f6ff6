use crate::domain::ports::FileSink;
use crate::utils::error::{ExportError, Result};
use std::path::PathBuf;

pub const DEFAULT_URL_PREFIX: &str = "/private/files";

/// Private file store on the local disk, served under `url_prefix`.
#[derive(Debug, Clone)]
pub struct LocalFileSink {
    base_path: PathBuf,
    url_prefix: String,
}

impl LocalFileSink {
    pub fn new(base_path: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            url_prefix: url_prefix.into(),
        }
    }
}

impl FileSink for LocalFileSink {
    async fn save_private(&self, file_name: &str, data: &[u8]) -> Result<String> {
        if file_name.is_empty() || file_name.contains(['/', '\\', '\0']) || file_name == ".." {
            return Err(ExportError::ConfigValidationError {
                field: "file_name".to_string(),
                message: format!("invalid file name '{}'", file_name),
            });
        }

        tokio::fs::create_dir_all(&self.base_path).await?;
        let full_path = self.base_path.join(file_name);
        tokio::fs::write(&full_path, data).await?;
        tracing::debug!("Wrote {} bytes to {}", data.len(), full_path.display());

        Ok(format!(
            "{}/{}",
            self.url_prefix.trim_end_matches('/'),
            file_name
        ))
    }
}
