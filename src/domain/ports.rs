use crate::domain::model::{Company, ConsolidationReport, Platform};
use crate::domain::orders::OrderSheet;
use crate::utils::error::Result;
use async_trait::async_trait;
use thiserror::Error;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_file(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_name(&self) -> &str;
    fn catalog_file(&self) -> &str;
    fn address_cache_file(&self) -> Option<&str>;

    /// 未指定時由匯出檔欄位判定
    fn platform(&self) -> Option<Platform> {
        None
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<OrderSheet>;
    async fn transform(&self, sheet: OrderSheet) -> Result<ConsolidationReport>;
    async fn load(&self, report: ConsolidationReport) -> Result<String>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("no store named {0}")]
    NotFound(String),

    #[error("{count} stores match {store}")]
    Ambiguous { store: String, count: usize },

    #[error("lookup transport failed: {0}")]
    TransportError(String),
}

/// 門市名稱查地址的外部服務
#[async_trait]
pub trait AddressLookup: Send + Sync {
    async fn lookup(
        &self,
        company: Company,
        store_name: &str,
    ) -> std::result::Result<String, LookupError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheUpsert {
    Inserted,
    /// 既有列原本沒有地址
    Filled,
    /// 既有列已有地址，不覆寫
    Kept,
}

/// (業者, 門市名稱) → 地址。只由單一寫入者使用。
pub trait AddressCache: Send {
    /// 只回傳非空白的地址
    fn get(&self, company: Company, store_name: &str) -> Option<String>;

    fn upsert(&mut self, company: Company, store_name: &str, address: &str) -> CacheUpsert;

    fn persist(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<T: AddressLookup + ?Sized> AddressLookup for Box<T> {
    async fn lookup(
        &self,
        company: Company,
        store_name: &str,
    ) -> std::result::Result<String, LookupError> {
        (**self).lookup(company, store_name).await
    }
}

impl<T: AddressCache + ?Sized> AddressCache for Box<T> {
    fn get(&self, company: Company, store_name: &str) -> Option<String> {
        (**self).get(company, store_name)
    }

    fn upsert(&mut self, company: Company, store_name: &str, address: &str) -> CacheUpsert {
        (**self).upsert(company, store_name, address)
    }

    fn persist(&mut self) -> Result<()> {
        (**self).persist()
    }
}
