use catalog_cards::core::Storage;
use catalog_cards::utils::{logger, validation::Validate};
use catalog_cards::{CatalogEngine, CatalogError, CliConfig, LocalStorage};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting catalog-cards CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let (deployment, criteria) = match config.deployment().and_then(|d| Ok((d, config.criteria()?))) {
        Ok(loaded) => loaded,
        Err(e) => exit_with(&e),
    };
    tracing::info!("✅ Deployment '{}' loaded", deployment.page.title);

    let engine = CatalogEngine::from_deployment(deployment);

    let rendered = match engine.run(&criteria, config.format).await {
        Ok(rendered) => rendered,
        Err(e) => exit_with(&e),
    };

    match &config.output {
        Some(path) => {
            let storage = LocalStorage::new(".");
            if let Err(e) = storage.write_file(path, rendered.content.as_bytes()).await {
                exit_with(&e);
            }
            tracing::info!("📁 Output saved to: {}", storage.resolve(path).display());
        }
        None => print!("{}", rendered.content),
    }

    // 錯誤頁已經輸出，但仍以非零結束讓排程看得到失敗
    if let Some(e) = rendered.failure {
        exit_with(&e);
    }

    tracing::info!(
        "✅ Rendered {} of {} records",
        rendered.visible,
        rendered.total
    );
    Ok(())
}

fn exit_with(e: &CatalogError) -> ! {
    tracing::error!(
        "❌ catalog-cards failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    std::process::exit(e.severity().exit_code());
}
