use clap::Parser;
use edhrec_scout::utils::error::ErrorSeverity;
use edhrec_scout::utils::{logger, validation::Validate};
use edhrec_scout::{AverageDeckResponse, AverageDeckService, CliConfig, ReqwestTransport};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting edhrec-scout");
    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        tracing::error!("Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let transport = ReqwestTransport::from_config(&config)?;
    let service = AverageDeckService::new(Arc::new(transport), &config);

    let outcome = service
        .fetch_average_deck(&config.name, Some(&config.bracket))
        .await;
    let response = AverageDeckResponse::from_outcome(&config.name, Some(&config.bracket), &outcome);
    println!("{}", serde_json::to_string_pretty(&response)?);

    if let Err(e) = outcome {
        tracing::error!(
            "Lookup failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 4,      // 查無資料或輸入錯誤
            ErrorSeverity::Medium => 2,   // 網路錯誤
            ErrorSeverity::High => 1,     // 解析或配置錯誤
            ErrorSeverity::Critical => 3, // 系統錯誤
        };
        std::process::exit(exit_code);
    }

    Ok(())
}
