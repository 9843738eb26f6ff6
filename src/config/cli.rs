use crate::config::toml_config::TomlConfig;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "portfolio-export")]
#[command(about = "Export portfolio project sheets as PDF, DOCX, HTML or World Bank DOCX")]
pub struct CliConfig {
    /// JSON array of portfolio identifiers, e.g. '["PRJ-0001","PRJ-0002"]'
    #[arg(long)]
    pub portfolio_names: String,

    /// pdf, docx, html, world_bank, or a comma-separated combination
    #[arg(long, default_value = "pdf")]
    pub format: String,

    /// kartoza (default) or world_bank
    #[arg(long)]
    pub layout: Option<String>,

    #[arg(long, help = "TOML configuration file")]
    pub config: Option<String>,

    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(long)]
    pub records_path: Option<String>,

    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long, help = "Wrap single HTML exports in a zip archive")]
    pub zip_html: bool,

    #[arg(long, short, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliConfig {
    /// 命令列參數覆蓋配置檔的值
    pub fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(base_url) = &self.base_url {
            config.site.base_url = base_url.clone();
        }
        if let Some(records_path) = &self.records_path {
            config.source.path = Some(records_path.clone());
        }
        if let Some(output_path) = &self.output_path {
            config.output.path = output_path.clone();
        }
        if self.zip_html {
            config.output.zip_html = true;
        }
    }

    pub fn load_config(&self) -> crate::utils::error::Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConfigProvider;

    #[test]
    fn test_parse_arguments() {
        let cli = CliConfig::try_parse_from([
            "portfolio-export",
            "--portfolio-names",
            r#"["PRJ-1"]"#,
            "--format",
            "pdf,docx",
            "--layout",
            "world_bank",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.portfolio_names, r#"["PRJ-1"]"#);
        assert_eq!(cli.format, "pdf,docx");
        assert_eq!(cli.layout.as_deref(), Some("world_bank"));
        assert!(cli.verbose);
        assert!(!cli.zip_html);
    }

    #[test]
    fn test_format_defaults_to_pdf() {
        let cli = CliConfig::try_parse_from(["portfolio-export", "--portfolio-names", "[]"]).unwrap();
        assert_eq!(cli.format, "pdf");
        assert!(cli.layout.is_none());
    }

    #[test]
    fn test_overrides_win_over_file_values() {
        let cli = CliConfig::try_parse_from([
            "portfolio-export",
            "--portfolio-names",
            "[]",
            "--base-url",
            "https://kartoza.example",
            "--output-path",
            "/tmp/exports",
            "--zip-html",
        ])
        .unwrap();

        let config = cli.load_config().unwrap();
        assert_eq!(config.base_url(), "https://kartoza.example");
        assert_eq!(config.output_path(), "/tmp/exports");
        assert!(config.zip_html());
    }
}
