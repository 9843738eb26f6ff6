use clap::Parser;
use portfolio_export::utils::error::ErrorSeverity;
use portfolio_export::utils::{logger, validation::Validate};
use portfolio_export::{build_exporter, CliConfig, ExportError, ExportResponse};

async fn run(cli: &CliConfig) -> Result<ExportResponse, ExportError> {
    let config = cli.load_config()?;
    config.validate()?;
    tracing::debug!("Effective config: {:?}", config);

    let exporter = build_exporter(&config)?;
    exporter
        .export_portfolio(&cli.portfolio_names, &cli.format, cli.layout.as_deref())
        .await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting portfolio-export CLI");

    match run(&cli).await {
        Ok(response) => {
            tracing::info!("✅ Export completed: {}", response.file_url);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Export failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
