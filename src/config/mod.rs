pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::model::Platform;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_path, Validate};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "order-consolidator")]
#[command(about = "Consolidate platform order exports into a boxed shipment sheet")]
pub struct CliConfig {
    /// 平台匯出的訂單 CSV
    #[arg(long)]
    pub input: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "shipments.csv")]
    pub output_name: String,

    /// 不指定時依欄位自動判斷
    #[arg(long)]
    pub platform: Option<Platform>,

    #[arg(long, default_value = "product_config.json")]
    pub catalog: String,

    /// 門市地址快取 CSV (company,store_name,address)
    #[arg(long)]
    pub address_cache: Option<String>,

    /// TOML 設定檔，未指定時使用內建預設值
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, help = "Skip store locator requests; unresolved stores become ERROR rows")]
    pub offline: bool,

    #[arg(long, help = "Emit JSON logs")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_file(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_name(&self) -> &str {
        &self.output_name
    }

    fn catalog_file(&self) -> &str {
        &self.catalog
    }

    fn address_cache_file(&self) -> Option<&str> {
        self.address_cache.as_deref()
    }

    fn platform(&self) -> Option<Platform> {
        self.platform
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        validate_path("output_path", &self.output_path)?;
        validate_path("output_name", &self.output_name)?;
        validate_path("catalog", &self.catalog)?;
        if let Some(cache) = &self.address_cache {
            validate_path("address_cache", cache)?;
        }
        Ok(())
    }
}
