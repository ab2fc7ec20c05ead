use anyhow::Context;
use clap::Parser;
use order_consolidator::adapters::{CsvAddressCache, InMemoryAddressCache, OfflineLookup, StoreLocator};
use order_consolidator::domain::ports::{AddressCache, AddressLookup, ConfigProvider};
use order_consolidator::utils::error::ErrorSeverity;
use order_consolidator::utils::{logger, validation::Validate};
use order_consolidator::{
    CliConfig, ConsolidatorConfig, EtlEngine, EtlError, LocalStorage, OrderPipeline,
    ProductCatalog,
};
use std::sync::Arc;

fn fail(e: &EtlError) -> ! {
    tracing::error!(
        "❌ Consolidation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn load_settings(config: &CliConfig) -> anyhow::Result<ConsolidatorConfig> {
    let settings = match &config.config {
        Some(path) => ConsolidatorConfig::from_file(path)
            .with_context(|| format!("failed to load settings from {}", path))?,
        None => ConsolidatorConfig::default(),
    };
    settings.validate().context("invalid settings")?;
    Ok(settings)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting order-consolidator");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(&e);
    }

    let settings = Arc::new(load_settings(&config)?);
    let catalog = ProductCatalog::load(config.catalog_file());

    let lookup: Box<dyn AddressLookup> = if config.offline {
        tracing::info!("📴 Offline mode, store locators disabled");
        Box::new(OfflineLookup)
    } else {
        match StoreLocator::from_settings(&settings.locator) {
            Ok(locator) => Box::new(locator),
            Err(e) => fail(&e),
        }
    };

    let cache: Box<dyn AddressCache> = match config.address_cache_file() {
        Some(path) => match CsvAddressCache::load(path) {
            Ok(cache) => Box::new(cache),
            Err(e) => fail(&e),
        },
        None => Box::new(InMemoryAddressCache::new()),
    };

    let storage = LocalStorage::new(".");
    let pipeline = OrderPipeline::new(storage, config, settings, catalog, lookup, cache);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Consolidation completed successfully!");
            println!("✅ Consolidation completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => fail(&e),
    }

    Ok(())
}
