use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_increasing, validate_non_empty_string, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 出貨單的固定常數與各項規則，整個執行期間不可變
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidatorConfig {
    pub order: OrderSettings,
    pub shipping: ShippingSettings,
    pub packaging: PackagingSettings,
    pub locator: LocatorSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderSettings {
    pub owner_id: String,
    /// 001 常溫, 002 冷藏, 003 冷凍
    pub temperature_zone: String,
    pub default_remark: String,
    pub c2c_remark: String,
    /// 拆成兩個品項的 C2C 贈品組合
    pub special_product: String,
    pub home_delivery_code: String,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            owner_id: "A442".to_string(),
            temperature_zone: "003".to_string(),
            default_remark: "減醣市集".to_string(),
            c2c_remark: "減醣市集 X 快電商 C2C BUY".to_string(),
            special_product: "F2500000044".to_string(),
            home_delivery_code: "Tcat".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingSettings {
    pub home_delivery_label: String,
    pub family_pickup_label: String,
    pub seven_pickup_label: String,
    pub family_code: String,
    pub seven_code: String,
    pub unknown_code: String,
    pub seven_address_prefix: String,
    pub morning_marker: String,
    pub afternoon_marker: String,
}

impl Default for ShippingSettings {
    fn default() -> Self {
        Self {
            home_delivery_label: "低溫宅配".to_string(),
            family_pickup_label: "全家低溫取貨".to_string(),
            seven_pickup_label: "7-11低溫取貨".to_string(),
            family_code: "全家".to_string(),
            seven_code: "7-11".to_string(),
            unknown_code: "UNKNOWN".to_string(),
            seven_address_prefix: "(home-converted)".to_string(),
            morning_marker: "上午到貨".to_string(),
            afternoon_marker: "下午到貨".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxTier {
    pub max_units: i64,
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagingSettings {
    pub tiers: Vec<BoxTier>,
    pub overflow_code: String,
    pub overflow_label: String,
    pub box_note: String,
}

impl Default for PackagingSettings {
    fn default() -> Self {
        Self {
            tiers: vec![
                BoxTier {
                    max_units: 14,
                    code: "box60-EA".to_string(),
                    label: "60cm box".to_string(),
                },
                BoxTier {
                    max_units: 47,
                    code: "box90-EA".to_string(),
                    label: "90cm box".to_string(),
                },
            ],
            overflow_code: "ERROR-needs-split".to_string(),
            overflow_label: "ERROR-needs-split".to_string(),
            box_note: "box".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorSettings {
    pub seven_url: String,
    pub family_url: String,
    pub family_referer: String,
    pub family_api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            seven_url: "https://emap.pcsc.com.tw/EMapSDK.aspx".to_string(),
            family_url: "https://api.map.com.tw/net/familyShop.aspx".to_string(),
            family_referer: "https://www.family.com.tw/".to_string(),
            family_api_key: None,
            timeout_seconds: 15,
        }
    }
}

impl LocatorSettings {
    /// 未替換的 `${VAR}` 視為沒有設定
    pub fn family_api_key(&self) -> Option<&str> {
        self.family_api_key
            .as_deref()
            .filter(|key| !key.is_empty() && !key.starts_with("${"))
    }
}

impl ConsolidatorConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${FAMILY_MAP_KEY})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for ConsolidatorConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("order.owner_id", &self.order.owner_id)?;
        validate_non_empty_string("order.temperature_zone", &self.order.temperature_zone)?;
        validate_non_empty_string("order.special_product", &self.order.special_product)?;

        let thresholds: Vec<i64> = self.packaging.tiers.iter().map(|t| t.max_units).collect();
        validate_increasing("packaging.tiers", &thresholds)?;
        for tier in &self.packaging.tiers {
            validate_non_empty_string("packaging.tiers.code", &tier.code)?;
        }
        validate_non_empty_string("packaging.overflow_code", &self.packaging.overflow_code)?;

        validate_url("locator.seven_url", &self.locator.seven_url)?;
        validate_url("locator.family_url", &self.locator.family_url)?;
        validate_range("locator.timeout_seconds", self.locator.timeout_seconds, 1, 300)?;

        Ok(())
    }
}
