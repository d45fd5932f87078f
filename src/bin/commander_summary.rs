use clap::Parser;
use edhrec_scout::config::{LookupKind, LookupSpec, TomlConfig};
use edhrec_scout::utils::{logger, validation::Validate};
use edhrec_scout::{ReqwestTransport, ScoutError, SummaryService};
use serde_json::Value;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "commander-summary")]
#[command(about = "Commander summaries, tag themes and the tag index from a TOML lookup list")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "scout.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Show the planned lookups without fetching anything
    #[arg(long)]
    dry_run: bool,
}

async fn run_lookup(service: &SummaryService, lookup: &LookupSpec) -> Result<Value, ScoutError> {
    match lookup.kind {
        LookupKind::Summary => {
            let name = lookup.name.as_deref().unwrap_or_default();
            let summary = service.fetch_commander_summary(name, lookup.budget.as_deref()).await?;
            Ok(serde_json::to_value(summary)?)
        }
        LookupKind::Theme => {
            let tag = lookup.tag.as_deref().unwrap_or_default();
            let theme = match lookup.name.as_deref() {
                Some(name) => service.fetch_commander_tag_theme(name, tag).await?,
                None => service.fetch_tag_theme(tag, lookup.identity.as_deref()).await?,
            };
            Ok(serde_json::to_value(theme)?)
        }
        LookupKind::TagIndex => Ok(serde_json::to_value(service.fetch_tag_index().await?)?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("Loading configuration from: {}", args.config);

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        tracing::error!("Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if config.lookups.is_empty() {
        tracing::warn!("No [[lookups]] configured; nothing to do");
        return Ok(());
    }

    if args.dry_run {
        for (index, lookup) in config.lookups.iter().enumerate() {
            println!("{:>2}. {:?}", index + 1, lookup);
        }
        return Ok(());
    }

    let transport = ReqwestTransport::from_config(&config)?;
    let service = SummaryService::new(Arc::new(transport), &config);

    let mut failures = 0;
    let mut results = Vec::with_capacity(config.lookups.len());
    for lookup in &config.lookups {
        match run_lookup(&service, lookup).await {
            Ok(value) => results.push(serde_json::json!({ "lookup": lookup, "result": value })),
            Err(e) => {
                failures += 1;
                tracing::error!("{:?} lookup failed: {}", lookup.kind, e);
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 建議: {}", e.recovery_suggestion());
                results.push(serde_json::json!({ "lookup": lookup, "error": e.to_payload() }));
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&results)?);

    if failures > 0 {
        tracing::warn!("{} of {} lookups failed", failures, config.lookups.len());
        std::process::exit(2);
    }

    Ok(())
}
