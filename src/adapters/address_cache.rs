use crate::domain::model::Company;
use crate::domain::ports::{AddressCache, CacheUpsert};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct InMemoryAddressCache {
    entries: BTreeMap<(Company, String), String>,
}

impl InMemoryAddressCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Company, &str, &str)> {
        self.entries
            .iter()
            .map(|((company, store), address)| (*company, store.as_str(), address.as_str()))
    }
}

impl AddressCache for InMemoryAddressCache {
    fn get(&self, company: Company, store_name: &str) -> Option<String> {
        self.entries
            .get(&(company, store_name.to_string()))
            .filter(|address| !address.trim().is_empty())
            .cloned()
    }

    fn upsert(&mut self, company: Company, store_name: &str, address: &str) -> CacheUpsert {
        match self.entries.get_mut(&(company, store_name.to_string())) {
            Some(existing) if existing.trim().is_empty() => {
                *existing = address.to_string();
                CacheUpsert::Filled
            }
            Some(_) => CacheUpsert::Kept,
            None => {
                self.entries
                    .insert((company, store_name.to_string()), address.to_string());
                CacheUpsert::Inserted
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    company: String,
    store_name: String,
    #[serde(default)]
    address: Option<String>,
}

/// 以 CSV 保存的門市地址快取，有新增才會回寫
#[derive(Debug)]
pub struct CsvAddressCache {
    path: PathBuf,
    inner: InMemoryAddressCache,
    dirty: bool,
}

impl CsvAddressCache {
    /// 檔案不存在時從空快取開始
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut inner = InMemoryAddressCache::new();

        if path.exists() {
            let mut reader = csv::Reader::from_path(&path)?;
            for record in reader.deserialize::<CacheRecord>() {
                let record = record?;
                match record.company.parse::<Company>() {
                    Ok(company) => {
                        inner.entries.insert(
                            (company, record.store_name),
                            record.address.unwrap_or_default(),
                        );
                    }
                    Err(e) => tracing::warn!("Skipping address cache row: {}", e),
                }
            }
            tracing::info!(
                "🗂️ Loaded {} cached store addresses from {}",
                inner.len(),
                path.display()
            );
        } else {
            tracing::info!("🗂️ No address cache at {}, starting empty", path.display());
        }

        Ok(Self {
            path,
            inner,
            dirty: false,
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl AddressCache for CsvAddressCache {
    fn get(&self, company: Company, store_name: &str) -> Option<String> {
        self.inner.get(company, store_name)
    }

    fn upsert(&mut self, company: Company, store_name: &str, address: &str) -> CacheUpsert {
        let outcome = self.inner.upsert(company, store_name, address);
        if outcome != CacheUpsert::Kept {
            self.dirty = true;
        }
        outcome
    }

    fn persist(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        for (company, store_name, address) in self.inner.iter() {
            writer.serialize(CacheRecord {
                company: company.as_str().to_string(),
                store_name: store_name.to_string(),
                address: Some(address.to_string()),
            })?;
        }
        writer.flush()?;

        self.dirty = false;
        tracing::info!(
            "💾 Saved {} store addresses to {}",
            self.inner.len(),
            self.path.display()
        );
        Ok(())
    }
}
