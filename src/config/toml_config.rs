use crate::adapters::file_sink::DEFAULT_URL_PREFIX;
use crate::adapters::pdf::{default_pdf_args, DEFAULT_PDF_PROGRAM};
use crate::core::ConfigProvider;
use crate::domain::document::{CONTENT_WIDTH_INCHES, DEFAULT_IMAGE_WIDTH_INCHES};
use crate::utils::error::{ExportError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub site: SiteConfig,
    pub source: SourceConfig,
    pub pdf: PdfConfig,
    pub output: OutputConfig,
    pub images: ImagesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[default]
    JsonDir,
    Api,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub r#type: SourceType,
    pub path: Option<String>,
    /// Defaults to `site.base_url`.
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            r#type: SourceType::JsonDir,
            path: Some("./records".to_string()),
            endpoint: None,
            api_key: None,
            api_secret: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfRendererType {
    #[default]
    Command,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    pub renderer: PdfRendererType,
    pub program: String,
    pub args: Vec<String>,
    pub endpoint: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            renderer: PdfRendererType::Command,
            program: DEFAULT_PDF_PROGRAM.to_string(),
            args: default_pdf_args(),
            endpoint: None,
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub url_prefix: String,
    pub zip_html: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./private/files".to_string(),
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
            zip_html: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub timeout_seconds: u64,
    pub default_width_inches: f32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            default_width_inches: DEFAULT_IMAGE_WIDTH_INCHES,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ExportError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ExportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_KEY})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ExportError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 來源 API 端點，未設定時使用網站網址
    pub fn source_endpoint(&self) -> &str {
        self.source
            .endpoint
            .as_deref()
            .unwrap_or(&self.site.base_url)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("site.base_url", &self.site.base_url)?;

        match self.source.r#type {
            SourceType::JsonDir => {
                let path = validation::validate_required_field("source.path", &self.source.path)?;
                validation::validate_path("source.path", path)?;
            }
            SourceType::Api => {
                validation::validate_url("source.endpoint", self.source_endpoint())?;
                if self.source.api_key.is_some() != self.source.api_secret.is_some() {
                    return Err(ExportError::ConfigValidationError {
                        field: "source.api_key".to_string(),
                        message: "api_key and api_secret must be set together".to_string(),
                    });
                }
            }
        }

        match self.pdf.renderer {
            PdfRendererType::Command => {
                validation::validate_non_empty_string("pdf.program", &self.pdf.program)?;
            }
            PdfRendererType::Http => {
                let endpoint =
                    validation::validate_required_field("pdf.endpoint", &self.pdf.endpoint)?;
                validation::validate_url("pdf.endpoint", endpoint)?;
            }
        }
        validation::validate_range("pdf.timeout_seconds", self.pdf.timeout_seconds, 1, 3600)?;

        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_non_empty_string("output.url_prefix", &self.output.url_prefix)?;

        validation::validate_range("images.timeout_seconds", self.images.timeout_seconds, 1, 600)?;
        validation::validate_range(
            "images.default_width_inches",
            self.images.default_width_inches,
            0.1,
            CONTENT_WIDTH_INCHES,
        )?;

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        &self.site.base_url
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn url_prefix(&self) -> &str {
        &self.output.url_prefix
    }

    fn zip_html(&self) -> bool {
        self.output.zip_html
    }

    fn image_timeout_seconds(&self) -> u64 {
        self.images.timeout_seconds
    }

    fn default_image_width_inches(&self) -> f32 {
        self.images.default_width_inches
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = TomlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pdf.program, "wkhtmltopdf");
        assert_eq!(config.url_prefix(), "/private/files");
        assert!(!config.zip_html());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[site]
base_url = "https://erp.example.com"

[source]
type = "api"
api_key = "key"
api_secret = "secret"

[pdf]
renderer = "http"
endpoint = "http://localhost:3000/render"

[output]
path = "./exports"
zip_html = true

[images]
timeout_seconds = 10
default_width_inches = 2.5
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.source.r#type, SourceType::Api);
        assert_eq!(config.source_endpoint(), "https://erp.example.com");
        assert_eq!(config.pdf.renderer, PdfRendererType::Http);
        assert_eq!(config.output_path(), "./exports");
        assert!(config.zip_html());
        assert_eq!(config.image_timeout_seconds(), 10);
        assert_eq!(config.default_image_width_inches(), 2.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PORTFOLIO_EXPORT_TEST_SECRET", "s3cret");

        let toml_content = r#"
[source]
type = "api"
api_key = "key"
api_secret = "${PORTFOLIO_EXPORT_TEST_SECRET}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.source.api_secret.as_deref(), Some("s3cret"));

        std::env::remove_var("PORTFOLIO_EXPORT_TEST_SECRET");
    }

    #[test]
    fn test_config_validation() {
        let invalid = [
            "[site]\nbase_url = \"erp.example.com\"",
            "[source]\ntype = \"api\"\napi_key = \"only-key\"",
            "[pdf]\nrenderer = \"http\"",
            "[images]\ndefault_width_inches = 12.0",
        ];
        for content in invalid {
            let config = TomlConfig::from_toml_str(content).unwrap();
            assert!(config.validate().is_err(), "expected invalid: {}", content);
        }
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[site]\nbase_url = \"https://kartoza.example\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.base_url(), "https://kartoza.example");
        // 未列出的區段使用預設值
        assert_eq!(config.output.path, "./private/files");
    }
}
