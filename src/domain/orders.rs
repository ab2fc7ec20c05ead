//! 各平台匯出檔的原始訂單列。
//!
//! 欄位名稱綁定在 serde rename 上，缺值一律是 `None`。

use crate::domain::model::Platform;
use serde::Deserialize;

/// 空字串或只有空白視為缺值
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn text(value: &Option<String>) -> String {
    present(value).unwrap_or_default().to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct C2cOrderLine {
    #[serde(rename = "建立時間")]
    pub created_at: Option<String>,
    #[serde(rename = "平台訂單編號")]
    pub order_id: Option<String>,
    #[serde(rename = "收件者姓名")]
    pub recipient_name: Option<String>,
    #[serde(rename = "收件者手機")]
    pub recipient_phone: Option<String>,
    #[serde(rename = "收件者地址")]
    pub recipient_address: Option<String>,
    #[serde(rename = "商品編號")]
    pub product_id: Option<String>,
    #[serde(rename = "商品樣式")]
    pub product_style: Option<String>,
    #[serde(rename = "小計數量")]
    pub quantity: Option<String>,
    #[serde(rename = "出貨備註")]
    pub shipping_note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MixxOrderLine {
    #[serde(rename = "*銷售單號")]
    pub order_id: Option<String>,
    #[serde(rename = "收件人")]
    pub recipient_name: Option<String>,
    #[serde(rename = "收件人手機")]
    pub recipient_phone: Option<String>,
    #[serde(rename = "收件地址")]
    pub recipient_address: Option<String>,
    #[serde(rename = "品名/規格")]
    pub description: Option<String>,
    #[serde(rename = "採購數量")]
    pub quantity: Option<String>,
    #[serde(rename = "備註")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShoplineOrderLine {
    #[serde(rename = "訂單號碼")]
    pub order_id: Option<String>,
    #[serde(rename = "訂單日期")]
    pub order_date: Option<String>,
    #[serde(rename = "送貨方式")]
    pub shipping_method: Option<String>,
    #[serde(rename = "收件人")]
    pub recipient_name: Option<String>,
    #[serde(rename = "收件人電話號碼")]
    pub recipient_phone: Option<String>,
    #[serde(rename = "門市名稱")]
    pub store_name: Option<String>,
    #[serde(rename = "商品貨號")]
    pub sku: Option<String>,
    #[serde(rename = "商品名稱")]
    pub product_name: Option<String>,
    #[serde(rename = "選項")]
    pub option: Option<String>,
    #[serde(rename = "數量")]
    pub quantity: Option<String>,
    #[serde(rename = "完整地址")]
    pub full_address: Option<String>,
    #[serde(rename = "出貨備註")]
    pub shipping_note: Option<String>,
    #[serde(rename = "到貨時間")]
    pub arrival_time: Option<String>,
}

/// 平台欄位特徵：`identify_by` 全部出現才判定為該平台，`required` 缺一不可
#[derive(Debug, Clone, Copy)]
pub struct PlatformSchema {
    pub platform: Platform,
    pub identify_by: &'static [&'static str],
    pub required: &'static [&'static str],
    pub receiver_column: &'static str,
    pub order_id_column: &'static str,
}

const C2C_SCHEMA: PlatformSchema = PlatformSchema {
    platform: Platform::C2c,
    identify_by: &["平台訂單編號", "商品編號", "商品樣式"],
    required: &[
        "平台訂單編號",
        "收件者姓名",
        "收件者手機",
        "收件者地址",
        "商品編號",
        "商品樣式",
        "小計數量",
    ],
    receiver_column: "收件者姓名",
    order_id_column: "平台訂單編號",
};

const MIXX_SCHEMA: PlatformSchema = PlatformSchema {
    platform: Platform::Mixx,
    identify_by: &["*銷售單號", "品名/規格", "採購數量"],
    required: &[
        "*銷售單號",
        "收件人",
        "收件人手機",
        "收件地址",
        "品名/規格",
        "採購數量",
    ],
    receiver_column: "收件人",
    order_id_column: "*銷售單號",
};

const SHOPLINE_SCHEMA: PlatformSchema = PlatformSchema {
    platform: Platform::Shopline,
    identify_by: &["訂單號碼", "送貨方式", "收件人電話號碼"],
    required: &[
        "訂單號碼",
        "收件人",
        "收件人電話號碼",
        "商品名稱",
        "數量",
        "送貨方式",
    ],
    receiver_column: "收件人",
    order_id_column: "訂單號碼",
};

impl Platform {
    pub fn schema(&self) -> &'static PlatformSchema {
        match self {
            Platform::C2c => &C2C_SCHEMA,
            Platform::Mixx => &MIXX_SCHEMA,
            Platform::Shopline => &SHOPLINE_SCHEMA,
        }
    }
}

/// 已讀入並判定平台的一份匯出檔
#[derive(Debug, Clone, PartialEq)]
pub enum OrderSheet {
    C2c(Vec<C2cOrderLine>),
    Mixx(Vec<MixxOrderLine>),
    Shopline(Vec<ShoplineOrderLine>),
}

impl OrderSheet {
    pub fn platform(&self) -> Platform {
        match self {
            OrderSheet::C2c(_) => Platform::C2c,
            OrderSheet::Mixx(_) => Platform::Mixx,
            OrderSheet::Shopline(_) => Platform::Shopline,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            OrderSheet::C2c(lines) => lines.len(),
            OrderSheet::Mixx(lines) => lines.len(),
            OrderSheet::Shopline(lines) => lines.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 依收件人穩定排序；同一訂單的列原本相鄰就會保持相鄰
    pub fn sort_by_recipient(&mut self) {
        match self {
            OrderSheet::C2c(lines) => lines.sort_by(|a, b| a.recipient_name.cmp(&b.recipient_name)),
            OrderSheet::Mixx(lines) => lines.sort_by(|a, b| a.recipient_name.cmp(&b.recipient_name)),
            OrderSheet::Shopline(lines) => {
                lines.sort_by(|a, b| a.recipient_name.cmp(&b.recipient_name))
            }
        }
    }

    pub fn distinct_order_ids(&self) -> usize {
        let ids: std::collections::BTreeSet<&str> = match self {
            OrderSheet::C2c(lines) => lines.iter().filter_map(|l| present(&l.order_id)).collect(),
            OrderSheet::Mixx(lines) => lines.iter().filter_map(|l| present(&l.order_id)).collect(),
            OrderSheet::Shopline(lines) => {
                lines.iter().filter_map(|l| present(&l.order_id)).collect()
            }
        };
        ids.len()
    }
}
