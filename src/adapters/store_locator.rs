//! 超商門市查詢。7-11 走電子地圖的表單 POST 回 XML（quick-xml 解析），全家走地圖 API 回 JS 包著的 JSON。

use crate::config::toml_config::LocatorSettings;
use crate::domain::model::Company;
use crate::domain::ports::{AddressLookup, LookupError};
use crate::utils::error::Result;
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;

type LookupResult = std::result::Result<String, LookupError>;

fn transport(e: impl std::fmt::Display) -> LookupError {
    LookupError::TransportError(e.to_string())
}

/// 名稱完全相符的地址去重後：零筆找不到，多筆視為無法判斷
fn single_match(store_name: &str, addresses: BTreeSet<String>) -> LookupResult {
    let count = addresses.len();
    let mut iter = addresses.into_iter();
    match (iter.next(), count) {
        (Some(address), 1) => Ok(address),
        (None, _) => Err(LookupError::NotFound(store_name.to_string())),
        (Some(_), count) => Err(LookupError::Ambiguous {
            store: store_name.to_string(),
            count,
        }),
    }
}

pub struct SevenElevenLocator {
    client: Client,
    endpoint: String,
}

impl SevenElevenLocator {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// 電子地圖的 POIName 不含「門市」字尾
    pub fn query_name(store_name: &str) -> &str {
        match store_name.find("門市") {
            Some(index) => &store_name[..index],
            None => store_name,
        }
    }

    pub async fn search(&self, store_name: &str) -> LookupResult {
        let query_name = Self::query_name(store_name);
        let form = [
            ("commandid", "SearchStore"),
            ("city", ""),
            ("town", ""),
            ("roadname", ""),
            ("ID", ""),
            ("StoreName", query_name),
            ("SpecialStore_Kind", ""),
            ("leftMenuChecked", ""),
            ("address", ""),
        ];

        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(transport(format!("HTTP {}", response.status())));
        }

        let body = response.text().await.map_err(transport)?;
        parse_seven_response(&body, store_name, query_name)
    }
}

/// 電子地圖回應中的一筆門市
#[derive(Debug, Default)]
struct GeoPosition {
    name: String,
    address: String,
}

fn read_geo_positions(xml: &str) -> std::result::Result<Vec<GeoPosition>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut positions = Vec::new();
    let mut current: Option<GeoPosition> = None;
    let mut field = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"GeoPosition" => current = Some(GeoPosition::default()),
                name => field = String::from_utf8_lossy(name).into_owned(),
            },
            Event::Text(e) => {
                let text = e.unescape()?;
                append_field(current.as_mut(), &field, &text);
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                append_field(current.as_mut(), &field, &String::from_utf8_lossy(&raw));
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"GeoPosition" {
                    positions.extend(current.take());
                }
                field.clear();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(positions)
}

fn append_field(position: Option<&mut GeoPosition>, field: &str, text: &str) {
    let Some(position) = position else {
        return;
    };
    match field {
        "POIName" => position.name.push_str(text),
        "Address" => position.address.push_str(text),
        _ => {}
    }
}

pub fn parse_seven_response(xml: &str, store_name: &str, query_name: &str) -> LookupResult {
    let matches: BTreeSet<String> = read_geo_positions(xml)
        .map_err(transport)?
        .into_iter()
        .filter(|position| position.name.trim() == query_name)
        .map(|position| position.address.trim().to_string())
        .filter(|address| !address.is_empty())
        .collect();

    single_match(store_name, matches)
}

#[derive(Debug, Deserialize)]
struct FamilyStore {
    #[serde(rename = "NAME")]
    name: String,
    #[serde(default)]
    addr: String,
}

pub struct FamilyMartLocator {
    client: Client,
    endpoint: String,
    referer: String,
    api_key: Option<String>,
}

impl FamilyMartLocator {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        referer: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            referer: referer.into(),
            api_key,
        }
    }

    pub async fn search(&self, store_name: &str) -> LookupResult {
        let mut query = vec![
            ("searchType", "ShopName"),
            ("type", ""),
            ("kw", store_name),
            ("fun", "getByName"),
        ];
        if let Some(key) = &self.api_key {
            query.push(("key", key.as_str()));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .header(reqwest::header::REFERER, &self.referer)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(transport(format!("HTTP {}", response.status())));
        }

        let body = response.text().await.map_err(transport)?;
        parse_family_response(&body, store_name)
    }
}

/// 回應是 `callback([...])`，只取第一個 `[` 到最後一個 `]`
pub fn parse_family_response(body: &str, store_name: &str) -> LookupResult {
    let (Some(start), Some(end)) = (body.find('['), body.rfind(']')) else {
        return Err(LookupError::NotFound(store_name.to_string()));
    };
    if end < start {
        return Err(transport("malformed store list"));
    }

    let stores: Vec<FamilyStore> = serde_json::from_str(&body[start..=end]).map_err(transport)?;
    let matches: BTreeSet<String> = stores
        .into_iter()
        .filter(|store| store.name == store_name && !store.addr.is_empty())
        .map(|store| store.addr)
        .collect();

    single_match(store_name, matches)
}

/// 依業者分派到對應的門市查詢
pub struct StoreLocator {
    seven: SevenElevenLocator,
    family: FamilyMartLocator,
}

impl StoreLocator {
    pub fn new(seven: SevenElevenLocator, family: FamilyMartLocator) -> Self {
        Self { seven, family }
    }

    pub fn from_settings(settings: &LocatorSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        if settings.family_api_key().is_none() {
            tracing::warn!("FamilyMart locator has no API key configured");
        }

        Ok(Self::new(
            SevenElevenLocator::new(client.clone(), settings.seven_url.clone()),
            FamilyMartLocator::new(
                client,
                settings.family_url.clone(),
                settings.family_referer.clone(),
                settings.family_api_key().map(str::to_string),
            ),
        ))
    }
}

#[async_trait]
impl AddressLookup for StoreLocator {
    async fn lookup(&self, company: Company, store_name: &str) -> LookupResult {
        match company {
            Company::Seven => self.seven.search(store_name).await,
            Company::Family => self.family.search(store_name).await,
            Company::Tacat => Err(LookupError::NotFound(store_name.to_string())),
        }
    }
}

/// 離線模式：所有查詢都失敗，輸出仍會完成並帶 ERROR 地址
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineLookup;

#[async_trait]
impl AddressLookup for OfflineLookup {
    async fn lookup(&self, _company: Company, _store_name: &str) -> LookupResult {
        Err(LookupError::TransportError("offline mode".to_string()))
    }
}
