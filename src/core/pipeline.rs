use crate::config::toml_config::ConsolidatorConfig;
use crate::core::address::{AddressResolver, StoreAddressBook};
use crate::core::catalog::ProductCatalog;
use crate::core::consolidation::ConsolidationEngine;
use crate::core::mappers::C2cMapper;
use crate::core::routing::collect_store_names;
use crate::core::sheet::{read_order_sheet, write_shipment_csv};
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::ConsolidationReport;
use crate::domain::orders::OrderSheet;
use crate::domain::ports::{AddressCache, AddressLookup};
use crate::utils::error::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::Mutex;

/// 匯出檔 → 出貨單：讀檔排序、查門市地址、合併裝箱、寫出 CSV
pub struct OrderPipeline<S, C, L, K>
where
    S: Storage,
    C: ConfigProvider,
    L: AddressLookup,
    K: AddressCache,
{
    storage: S,
    config: C,
    engine: ConsolidationEngine,
    catalog: ProductCatalog,
    resolver: Mutex<AddressResolver<L, K>>,
    today: NaiveDate,
}

impl<S, C, L, K> OrderPipeline<S, C, L, K>
where
    S: Storage,
    C: ConfigProvider,
    L: AddressLookup,
    K: AddressCache,
{
    pub fn new(
        storage: S,
        config: C,
        settings: Arc<ConsolidatorConfig>,
        catalog: ProductCatalog,
        lookup: L,
        cache: K,
    ) -> Self {
        Self {
            storage,
            config,
            engine: ConsolidationEngine::new(settings),
            catalog,
            resolver: Mutex::new(AddressResolver::new(lookup, cache)),
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Mixx 訂購日期使用的「今天」
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn output_file(&self) -> String {
        format!(
            "{}/{}",
            self.config.output_path().trim_end_matches('/'),
            self.config.output_name()
        )
    }

    pub fn into_resolver(self) -> AddressResolver<L, K> {
        self.resolver.into_inner()
    }

    async fn address_book(&self, sheet: &OrderSheet) -> StoreAddressBook {
        let OrderSheet::Shopline(lines) = sheet else {
            return StoreAddressBook::new();
        };

        let requests = collect_store_names(lines, &self.engine.config().shipping);
        if requests.is_empty() {
            return StoreAddressBook::new();
        }

        let total: usize = requests.values().map(|stores| stores.len()).sum();
        tracing::info!("🏪 Resolving {} pickup stores", total);

        let mut resolver = self.resolver.lock().await;
        resolver.resolve_book(&requests).await
    }
}

#[async_trait::async_trait]
impl<S, C, L, K> Pipeline for OrderPipeline<S, C, L, K>
where
    S: Storage,
    C: ConfigProvider,
    L: AddressLookup,
    K: AddressCache,
{
    async fn extract(&self) -> Result<OrderSheet> {
        let input = self.config.input_file();
        tracing::debug!("Reading orders from {}", input);

        let data = self.storage.read_file(input).await?;
        let mut sheet = read_order_sheet(&data, self.config.platform())?;

        tracing::info!(
            "📥 {} export: {} rows, {} orders",
            sheet.platform(),
            sheet.len(),
            sheet.distinct_order_ids()
        );

        sheet.sort_by_recipient();
        Ok(sheet)
    }

    async fn transform(&self, sheet: OrderSheet) -> Result<ConsolidationReport> {
        let book = self.address_book(&sheet).await;

        if let OrderSheet::C2c(lines) = &sheet {
            let special_product = &self.engine.config().order.special_product;
            let special = lines
                .iter()
                .filter(|line| C2cMapper::is_special(line, special_product))
                .count();
            tracing::info!(
                "C2C rows: {} regular, {} bundle ({})",
                lines.len() - special,
                special,
                special_product
            );
        }

        let report = self
            .engine
            .consolidate(&sheet, &self.catalog, &book, self.today)?;

        tracing::info!(
            "🔄 {} shipment rows for {} orders ({} boxes, {} skipped)",
            report.rows.len(),
            report.distinct_orders(),
            report.box_rows,
            report.skipped_rows
        );

        Ok(report)
    }

    async fn load(&self, report: ConsolidationReport) -> Result<String> {
        let output_file = self.output_file();
        let data = write_shipment_csv(&report.rows)?;
        self.storage.write_file(&output_file, &data).await?;

        self.resolver.lock().await.cache_mut().persist()?;

        for issue in &report.issues {
            tracing::debug!("{} [{}] {}", issue.order_id, issue.field, issue.message);
        }
        let review = report.rows_needing_review();
        if review > 0 {
            tracing::warn!("⚠️ {} rows need manual review (ERROR / INVALID_DATE)", review);
        }

        Ok(output_file)
    }
}
