use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// 日期無法解析時寫入輸出的標記
pub const INVALID_DATE: &str = "INVALID_DATE";

/// 輸出欄位含有此字樣時需要人工檢查
pub const ERROR_MARKER: &str = "ERROR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    C2c,
    Mixx,
    Shopline,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::C2c, Platform::Mixx, Platform::Shopline];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::C2c => "c2c",
            Platform::Mixx => "mixx",
            Platform::Shopline => "shopline",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c2c" => Ok(Platform::C2c),
            "mixx" => Ok(Platform::Mixx),
            "shopline" => Ok(Platform::Shopline),
            other => Err(format!(
                "unknown platform '{}', expected one of: c2c, mixx, shopline",
                other
            )),
        }
    }
}

/// 配送業者。超商取貨需要查門市地址，宅配直接使用訂單地址。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Company {
    Seven,
    Family,
    Tacat,
}

impl Company {
    pub fn as_str(&self) -> &'static str {
        match self {
            Company::Seven => "SEVEN",
            Company::Family => "FAMILY",
            Company::Tacat => "TACAT",
        }
    }

    pub fn is_pickup(&self) -> bool {
        !matches!(self, Company::Tacat)
    }
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Company {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SEVEN" => Ok(Company::Seven),
            "FAMILY" => Ok(Company::Family),
            "TACAT" => Ok(Company::Tacat),
            other => Err(format!("unknown company '{}'", other)),
        }
    }
}

/// 到貨時段代碼: 1 = 13 點前, 2 = 14~18
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalWindow {
    Morning,
    Afternoon,
}

impl ArrivalWindow {
    pub fn code(&self) -> u8 {
        match self {
            ArrivalWindow::Morning => 1,
            ArrivalWindow::Afternoon => 2,
        }
    }
}

impl Serialize for ArrivalWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// 出貨單的一列，欄位名稱對應出貨範本
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipmentRow {
    #[serde(rename = "貨主編號")]
    pub owner_id: String,
    #[serde(rename = "貨主單號")]
    pub order_id: String,
    #[serde(rename = "客戶端代號(店號)")]
    pub client_code: String,
    #[serde(rename = "訂購日期")]
    pub order_date: String,
    #[serde(rename = "商品編號")]
    pub product_code: Option<String>,
    #[serde(rename = "商品名稱")]
    pub product_name: String,
    #[serde(rename = "訂購數量")]
    pub quantity: String,
    #[serde(rename = "配送方式")]
    pub delivery_method: String,
    #[serde(rename = "收貨人姓名")]
    pub recipient_name: String,
    #[serde(rename = "收貨人地址")]
    pub recipient_address: String,
    #[serde(rename = "收貨人聯絡電話")]
    pub recipient_phone: String,
    #[serde(rename = "到貨時段")]
    pub arrival_window: Option<ArrivalWindow>,
    #[serde(rename = "訂單 / 宅配單備註")]
    pub remark: String,
    #[serde(rename = "品項備註")]
    pub item_note: String,
    #[serde(rename = "指定配送溫層")]
    pub temperature_zone: String,
}

impl ShipmentRow {
    /// 任一欄位帶有 ERROR 或無效日期時需要人工確認
    pub fn needs_review(&self) -> bool {
        let flagged = |value: &str| value.contains(ERROR_MARKER) || value == INVALID_DATE;
        [
            self.order_date.as_str(),
            self.product_code.as_deref().unwrap_or_default(),
            self.product_name.as_str(),
            self.delivery_method.as_str(),
            self.recipient_address.as_str(),
        ]
        .into_iter()
        .any(flagged)
            || self.product_code.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingIssue {
    pub order_id: String,
    pub field: String,
    pub message: String,
}

impl ProcessingIssue {
    pub fn new(order_id: &str, field: &str, message: impl Into<String>) -> Self {
        Self {
            order_id: order_id.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsolidationReport {
    pub platform: Platform,
    pub rows: Vec<ShipmentRow>,
    pub box_rows: usize,
    /// 依平台規則整列捨棄的筆數
    pub skipped_rows: usize,
    /// 缺訂單編號、照常輸出但不參與分組的筆數
    pub orphan_rows: usize,
    pub issues: Vec<ProcessingIssue>,
}

impl ConsolidationReport {
    pub fn distinct_orders(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| !row.order_id.is_empty())
            .map(|row| row.order_id.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn rows_needing_review(&self) -> usize {
        self.rows.iter().filter(|row| row.needs_review()).count()
    }
}
