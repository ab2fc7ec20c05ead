use crate::domain::model::Company;
use crate::domain::ports::{AddressCache, AddressLookup, CacheUpsert, LookupError};
use std::collections::{BTreeMap, BTreeSet};

/// 已解析好的門市地址，交給純映射層查詢，不會再觸發網路呼叫
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreAddressBook {
    entries: BTreeMap<Company, BTreeMap<String, String>>,
}

impl StoreAddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, company: Company, store_name: &str, address: impl Into<String>) {
        self.entries
            .entry(company)
            .or_default()
            .insert(store_name.to_string(), address.into());
    }

    pub fn get(&self, company: Company, store_name: &str) -> Option<&str> {
        self.entries
            .get(&company)
            .and_then(|stores| stores.get(store_name))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 查詢失敗時寫入輸出的地址，一律以 ERROR 開頭
pub fn failure_sentinel(store_name: &str, error: &LookupError) -> String {
    match error {
        LookupError::NotFound(_) => format!("ERROR: unable to confirm address for {}", store_name),
        LookupError::Ambiguous { count, .. } => {
            format!("ERROR: {} stores match {}, pick one manually", count, store_name)
        }
        LookupError::TransportError(reason) => {
            format!("ERROR: lookup failed for {} ({})", store_name, reason)
        }
    }
}

/// 門市地址解析：先查快取，沒有再問外部服務，新地址寫回快取。
/// 查詢失敗只回傳 ERROR 字串，不寫入快取。
pub struct AddressResolver<L, C> {
    lookup: L,
    cache: C,
}

impl<L: AddressLookup, C: AddressCache> AddressResolver<L, C> {
    pub fn new(lookup: L, cache: C) -> Self {
        Self { lookup, cache }
    }

    pub async fn resolve(&mut self, company: Company, store_name: &str) -> String {
        if !company.is_pickup() {
            tracing::warn!("Home delivery has no store lookup ({})", store_name);
            return format!("ERROR: {} is not a pickup store", store_name);
        }

        if let Some(address) = self.cache.get(company, store_name) {
            tracing::debug!("🗂️ Cache hit {} {}", company, store_name);
            return address;
        }

        tracing::debug!("🔎 Looking up {} {}", company, store_name);
        match self.lookup.lookup(company, store_name).await {
            Ok(address) => {
                match self.cache.upsert(company, store_name, &address) {
                    CacheUpsert::Inserted | CacheUpsert::Filled => {
                        tracing::info!("📍 Cached {} {} → {}", company, store_name, address);
                    }
                    CacheUpsert::Kept => {
                        tracing::info!(
                            "Cache already holds an address for {} {}, left unchanged",
                            company,
                            store_name
                        );
                    }
                }
                address
            }
            Err(e) => {
                tracing::warn!("⚠️ {} {}: {}", company, store_name, e);
                failure_sentinel(store_name, &e)
            }
        }
    }

    /// 同一業者的多個門市逐一解析，名稱自然去重
    pub async fn resolve_batch<'a, I>(
        &mut self,
        company: Company,
        store_names: I,
    ) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distinct: BTreeSet<&str> = store_names.into_iter().collect();
        let mut resolved = BTreeMap::new();
        for store_name in distinct {
            let address = self.resolve(company, store_name).await;
            resolved.insert(store_name.to_string(), address);
        }
        resolved
    }

    pub async fn resolve_book(
        &mut self,
        requests: &BTreeMap<Company, BTreeSet<String>>,
    ) -> StoreAddressBook {
        let mut book = StoreAddressBook::new();
        for (company, stores) in requests {
            let resolved = self
                .resolve_batch(*company, stores.iter().map(String::as_str))
                .await;
            for (store_name, address) in resolved {
                book.insert(*company, &store_name, address);
            }
        }
        book
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut C {
        &mut self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::address_cache::InMemoryAddressCache;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct ScriptedLookup {
        answers: HashMap<String, Result<String, LookupError>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedLookup {
        fn answer(mut self, store: &str, answer: Result<String, LookupError>) -> Self {
            self.answers.insert(store.to_string(), answer);
            self
        }
    }

    #[async_trait]
    impl AddressLookup for ScriptedLookup {
        async fn lookup(&self, _company: Company, store_name: &str) -> Result<String, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answers
                .get(store_name)
                .cloned()
                .unwrap_or_else(|| Err(LookupError::NotFound(store_name.to_string())))
        }
    }

    #[tokio::test]
    async fn test_cache_hit_skips_lookup() {
        let lookup = ScriptedLookup::default();
        let calls = lookup.calls.clone();
        let mut cache = InMemoryAddressCache::new();
        cache.upsert(Company::Seven, "XX門市", "addrA");

        let mut resolver = AddressResolver::new(lookup, cache);
        let address = resolver.resolve(Company::Seven, "XX門市").await;

        assert_eq!(address, "addrA");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_not_found_returns_sentinel_and_leaves_cache() {
        let lookup = ScriptedLookup::default();
        let mut resolver = AddressResolver::new(lookup, InMemoryAddressCache::new());

        let address = resolver.resolve(Company::Family, "不存在店").await;

        assert!(address.starts_with("ERROR"));
        assert_eq!(resolver.cache().get(Company::Family, "不存在店"), None);
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test]
    async fn test_ambiguous_and_transport_failures() {
        let lookup = ScriptedLookup::default()
            .answer(
                "中山店",
                Err(LookupError::Ambiguous {
                    store: "中山店".to_string(),
                    count: 2,
                }),
            )
            .answer(
                "信義店",
                Err(LookupError::TransportError("timeout".to_string())),
            );
        let mut resolver = AddressResolver::new(lookup, InMemoryAddressCache::new());

        let ambiguous = resolver.resolve(Company::Family, "中山店").await;
        let transport = resolver.resolve(Company::Family, "信義店").await;

        assert!(ambiguous.starts_with("ERROR"));
        assert!(ambiguous.contains("2 stores"));
        assert!(transport.starts_with("ERROR"));
        assert!(transport.contains("timeout"));
    }

    #[tokio::test]
    async fn test_successful_lookup_is_cached() {
        let lookup = ScriptedLookup::default().answer("鑫德門市", Ok("台北市中正區".to_string()));
        let calls = lookup.calls.clone();
        let mut resolver = AddressResolver::new(lookup, InMemoryAddressCache::new());

        assert_eq!(resolver.resolve(Company::Seven, "鑫德門市").await, "台北市中正區");
        assert_eq!(resolver.resolve(Company::Seven, "鑫德門市").await, "台北市中正區");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            resolver.cache().get(Company::Seven, "鑫德門市").as_deref(),
            Some("台北市中正區")
        );
    }

    #[tokio::test]
    async fn test_blank_cache_entry_is_filled() {
        let lookup = ScriptedLookup::default().answer("鑫德門市", Ok("台北市中正區".to_string()));
        let mut cache = InMemoryAddressCache::new();
        cache.upsert(Company::Seven, "鑫德門市", "");

        let mut resolver = AddressResolver::new(lookup, cache);
        assert_eq!(resolver.resolve(Company::Seven, "鑫德門市").await, "台北市中正區");
        assert_eq!(
            resolver.cache().get(Company::Seven, "鑫德門市").as_deref(),
            Some("台北市中正區")
        );
    }

    #[tokio::test]
    async fn test_batch_deduplicates_names() {
        let lookup = ScriptedLookup::default()
            .answer("A店", Ok("addrA".to_string()))
            .answer("B店", Ok("addrB".to_string()));
        let calls = lookup.calls.clone();
        let mut resolver = AddressResolver::new(lookup, InMemoryAddressCache::new());

        let resolved = resolver
            .resolve_batch(Company::Family, ["B店", "A店", "B店"])
            .await;

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved["A店"], "addrA");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_home_delivery_is_not_looked_up() {
        let lookup = ScriptedLookup::default();
        let calls = lookup.calls.clone();
        let mut resolver = AddressResolver::new(lookup, InMemoryAddressCache::new());

        let address = resolver.resolve(Company::Tacat, "任意").await;
        assert!(address.starts_with("ERROR"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_book_groups_by_company() {
        let lookup = ScriptedLookup::default()
            .answer("A店", Ok("addrA".to_string()))
            .answer("B門市", Ok("addrB".to_string()));
        let mut resolver = AddressResolver::new(lookup, InMemoryAddressCache::new());

        let mut requests = BTreeMap::new();
        requests.insert(Company::Family, BTreeSet::from(["A店".to_string()]));
        requests.insert(Company::Seven, BTreeSet::from(["B門市".to_string()]));

        let book = resolver.resolve_book(&requests).await;
        assert_eq!(book.len(), 2);
        assert_eq!(book.get(Company::Family, "A店"), Some("addrA"));
        assert_eq!(book.get(Company::Seven, "B門市"), Some("addrB"));
        assert_eq!(book.get(Company::Seven, "A店"), None);
    }
}
