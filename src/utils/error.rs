use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No portfolio names provided")]
    NoPortfolioNames,

    #[error("Portfolio names must be a JSON list of strings: {message}")]
    InvalidPortfolioNames { message: String },

    #[error("Unsupported file format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Unsupported layout: {layout}")]
    UnsupportedLayout { layout: String },

    #[error("Portfolio not found: {name}")]
    RecordNotFound { name: String },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Document generation failed: {message}")]
    DocumentError { message: String },

    #[error("PDF rendering failed: {message}")]
    PdfRenderError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Request,
    Configuration,
    Network,
    Storage,
    Rendering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ExportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ExportError::NoPortfolioNames
            | ExportError::InvalidPortfolioNames { .. }
            | ExportError::UnsupportedFormat { .. }
            | ExportError::UnsupportedLayout { .. }
            | ExportError::RecordNotFound { .. } => ErrorCategory::Request,
            ExportError::ConfigValidationError { .. }
            | ExportError::InvalidConfigValueError { .. }
            | ExportError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ExportError::HttpError(_) => ErrorCategory::Network,
            ExportError::IoError(_) | ExportError::ZipError(_) => ErrorCategory::Storage,
            ExportError::SerializationError(_)
            | ExportError::DocumentError { .. }
            | ExportError::PdfRenderError { .. } => ErrorCategory::Rendering,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Request => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            // 網路錯誤通常重試即可
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Rendering => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ExportError::NoPortfolioNames => "No portfolio names provided".to_string(),
            ExportError::UnsupportedFormat { format } => {
                format!("Unsupported file format '{}'", format)
            }
            ExportError::RecordNotFound { name } => {
                format!("Portfolio '{}' could not be found", name)
            }
            ExportError::HttpError(e) if e.is_timeout() => {
                "A remote service did not answer in time".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Request => match self {
                ExportError::UnsupportedFormat { .. } => {
                    "Use one of: pdf, docx, html, world_bank"
                }
                ExportError::UnsupportedLayout { .. } => "Use one of: kartoza, world_bank",
                ExportError::RecordNotFound { .. } => {
                    "Check the portfolio identifiers against the record source"
                }
                _ => "Pass a JSON list of portfolio identifiers, e.g. [\"PRJ-0001\"]",
            },
            ErrorCategory::Configuration => "Check the configuration file and CLI overrides",
            ErrorCategory::Network => "Check connectivity to the site and retry",
            ErrorCategory::Storage => "Check that the output directory is writable",
            ErrorCategory::Rendering => {
                "Check the PDF renderer installation and the record content"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_errors_carry_user_messages() {
        assert_eq!(
            ExportError::NoPortfolioNames.to_string(),
            "No portfolio names provided"
        );
        let err = ExportError::UnsupportedFormat {
            format: "odt".to_string(),
        };
        assert!(err.to_string().starts_with("Unsupported file format"));
        assert_eq!(err.category(), ErrorCategory::Request);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.recovery_suggestion(), "Use one of: pdf, docx, html, world_bank");
    }

    #[test]
    fn test_io_errors_are_critical() {
        let err = ExportError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
