use crate::utils::error::{ExportError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// 缺少選填欄位時顯示的字串
pub const PLACEHOLDER: &str = "Unavailable";

/// A Portfolio record as stored by the host application.
///
/// Text fields that are absent, `null`, empty or whitespace-only are treated
/// as missing by the accessors below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioRecord {
    pub name: String,
    pub title: Option<String>,
    pub client: Option<String>,
    pub location: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(deserialize_with = "deserialize_optional_date")]
    pub end_date: Option<NaiveDate>,
    pub contact: Option<String>,
    pub client_reference: Option<String>,
    pub client_logo: Option<String>,
    pub body: Option<String>,
    pub technologies: Vec<TechnologyRow>,
    pub services_listed: Vec<ServiceRow>,
    pub images: Vec<ImageRow>,
    pub approximate_contract_value: Option<f64>,
    pub duration_of_assignment: Option<f64>,
    pub total_staff_months: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnologyRow {
    pub technology: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceRow {
    pub service: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageRow {
    pub website_image: Option<String>,
}

fn deserialize_optional_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl PortfolioRecord {
    pub fn title(&self) -> &str {
        present(&self.title).unwrap_or(&self.name)
    }

    pub fn client(&self) -> &str {
        present(&self.client).unwrap_or_default()
    }

    pub fn location(&self) -> &str {
        present(&self.location).unwrap_or_default()
    }

    pub fn body(&self) -> &str {
        present(&self.body).unwrap_or_default()
    }

    pub fn contact_or_placeholder(&self) -> &str {
        present(&self.contact).unwrap_or(PLACEHOLDER)
    }

    pub fn client_reference_or_placeholder(&self) -> &str {
        present(&self.client_reference).unwrap_or(PLACEHOLDER)
    }

    pub fn client_logo(&self) -> Option<&str> {
        present(&self.client_logo)
    }

    pub fn technologies(&self) -> impl Iterator<Item = &str> {
        self.technologies.iter().filter_map(|row| present(&row.technology))
    }

    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.services_listed.iter().filter_map(|row| present(&row.service))
    }

    pub fn image_paths(&self) -> impl Iterator<Item = &str> {
        self.images.iter().filter_map(|row| present(&row.website_image))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Pdf,
    Docx,
    Html,
    WorldBank,
}

impl ExportFormat {
    /// Parses a comma separated list, keeping the first occurrence of each format.
    pub fn parse_list(value: &str) -> Result<Vec<ExportFormat>> {
        let mut formats = Vec::new();
        for part in value.split(',') {
            let format: ExportFormat = part.parse()?;
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        Ok(formats)
    }

    pub fn artifact_kind(&self) -> ArtifactKind {
        match self {
            ExportFormat::Pdf => ArtifactKind::Pdf,
            ExportFormat::Docx | ExportFormat::WorldBank => ArtifactKind::Docx,
            ExportFormat::Html => ArtifactKind::Html,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_key(s).as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" => Ok(ExportFormat::Docx),
            "html" => Ok(ExportFormat::Html),
            "world_bank" => Ok(ExportFormat::WorldBank),
            _ => Err(ExportError::UnsupportedFormat {
                format: s.trim().to_string(),
            }),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
            ExportFormat::Html => "html",
            ExportFormat::WorldBank => "world_bank",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    #[default]
    Kartoza,
    WorldBank,
}

impl Layout {
    pub fn from_option(value: Option<&str>) -> Result<Layout> {
        match value {
            None => Ok(Layout::default()),
            Some(v) => v.parse(),
        }
    }
}

impl FromStr for Layout {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_key(s).as_str() {
            "" | "kartoza" | "standard" => Ok(Layout::Kartoza),
            "world_bank" => Ok(Layout::WorldBank),
            _ => Err(ExportError::UnsupportedLayout {
                layout: s.trim().to_string(),
            }),
        }
    }
}

fn normalize_key(value: &str) -> String {
    value
        .trim()
        .to_ascii_lowercase()
        .replace([' ', '-'], "_")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Pdf,
    Docx,
    Html,
    Zip,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "pdf",
            ArtifactKind::Docx => "docx",
            ArtifactKind::Html => "html",
            ArtifactKind::Zip => "zip",
        }
    }
}

/// 單次匯出產生的檔案內容
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub data: Vec<u8>,
    pub kind: ArtifactKind,
}

impl ExportArtifact {
    pub fn new(data: Vec<u8>, kind: ArtifactKind) -> Self {
        Self { data, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub portfolio_names: Vec<String>,
    pub formats: Vec<ExportFormat>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportResponse {
    pub status: String,
    pub message: String,
    pub file_url: String,
}

impl ExportResponse {
    pub fn success(file_url: String) -> Self {
        Self {
            status: "success".to_string(),
            message: "Portfolios exported successfully.".to_string(),
            file_url,
        }
    }
}
