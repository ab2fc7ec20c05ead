use crate::utils::error::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// 商品設定中的一筆商品。`qty` 是裝箱用的體積單位。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductEntry {
    #[serde(default)]
    pub name: Option<String>,
    pub qty: i64,
    #[serde(default, deserialize_with = "one_or_many")]
    pub mixx_name: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub c2c_code: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub c2c_name: Vec<String>,
}

// 舊版設定檔的別名是單一字串，新版是陣列
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(value)) if value.is_empty() => Vec::new(),
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
        None => Vec::new(),
    })
}

/// 商品編號 → 商品資料，執行期間唯讀
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    entries: BTreeMap<String, ProductEntry>,
}

impl ProductCatalog {
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, ProductEntry)>,
        K: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let entries: BTreeMap<String, ProductEntry> = serde_json::from_str(content)?;
        Ok(Self { entries })
    }

    /// 載入失敗時退回空的商品設定並記錄警告，之後的查詢都會找不到
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("⚠️ Product catalog {} unavailable: {}", path.display(), e);
                return Self::default();
            }
        };

        match Self::from_json_str(&content) {
            Ok(catalog) => {
                tracing::info!(
                    "📦 Loaded {} products from {}",
                    catalog.len(),
                    path.display()
                );
                catalog
            }
            Err(e) => {
                tracing::warn!("⚠️ Product catalog {} is malformed: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&ProductEntry> {
        self.entries.get(code)
    }

    pub fn unit_volume(&self, code: &str) -> Option<i64> {
        self.entries.get(code).map(|entry| entry.qty)
    }

    /// Mixx 品名比對：任何一個別名包含搜尋字串即可
    pub fn find_by_mixx_name(&self, search: &str) -> Option<&str> {
        let search = search.trim();
        if search.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(_, entry)| entry.mixx_name.iter().any(|alias| alias.contains(search)))
            .map(|(code, _)| code.as_str())
    }

    pub fn find_by_c2c_code(&self, c2c_code: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.c2c_code.iter().any(|code| code == c2c_code))
            .map(|(code, _)| code.as_str())
    }

    /// C2C 的同一個平台編號可能對應多個口味，用商品樣式區分。
    /// 樣式對不上時，只有唯一候選才採用。
    pub fn find_by_c2c(&self, c2c_code: &str, style: Option<&str>) -> Option<&str> {
        let candidates: Vec<(&String, &ProductEntry)> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.c2c_code.iter().any(|code| code == c2c_code))
            .collect();

        if let Some(style) = style {
            if let Some((code, _)) = candidates
                .iter()
                .find(|(_, entry)| entry.c2c_name.iter().any(|name| name == style))
            {
                return Some(code.as_str());
            }
        }

        match candidates.as_slice() {
            [(code, _)] => Some(code.as_str()),
            _ => None,
        }
    }

    pub fn find_by_c2c_name(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(_, entry)| entry.c2c_name.iter().any(|alias| alias.contains(name)))
            .map(|(code, _)| code.as_str())
    }
}
