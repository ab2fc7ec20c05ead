//! 各平台原始訂單列 → 出貨單列。
//!
//! 映射層不做任何 I/O：商品編號查商品設定，門市地址查事先解析好的
//! `StoreAddressBook`，訂購日期用注入的 `today`。

pub mod c2c;
pub mod mixx;
pub mod shopline;

pub use c2c::C2cMapper;
pub use mixx::MixxMapper;
pub use shopline::ShoplineMapper;

use crate::config::toml_config::ConsolidatorConfig;
use crate::core::address::StoreAddressBook;
use crate::core::catalog::ProductCatalog;
use crate::core::routing::Delivery;
use crate::domain::model::{ProcessingIssue, ShipmentRow};
use chrono::NaiveDate;

/// 映射時可讀取的唯讀資料
#[derive(Debug, Clone, Copy)]
pub struct MappingContext<'a> {
    pub config: &'a ConsolidatorConfig,
    pub catalog: &'a ProductCatalog,
    pub book: &'a StoreAddressBook,
    pub today: NaiveDate,
}

/// 一列資料進入分組前的判定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// 以訂單編號分組
    Group(String),
    /// 照常輸出但不參與分組
    Orphan,
    /// 整列捨棄
    Skip,
}

/// 建立出貨單列前預先算好的欄位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFields {
    pub product_code: Option<String>,
    pub product_name: String,
    pub order_date: String,
    pub remark: String,
    pub delivery: Delivery,
}

pub trait FieldMapper {
    type Line;

    fn admit(&self, line: &Self::Line) -> Admission;

    /// 一列原始資料可能展開成多個品項
    fn resolve(
        &self,
        line: &Self::Line,
        ctx: &MappingContext<'_>,
        issues: &mut Vec<ProcessingIssue>,
    ) -> Vec<ResolvedFields>;

    fn map(&self, line: &Self::Line, resolved: ResolvedFields, ctx: &MappingContext<'_>)
        -> ShipmentRow;

    /// 映射後的平台附加欄位
    fn annotate(&self, _line: &Self::Line, _row: &mut ShipmentRow, _ctx: &MappingContext<'_>) {}
}

/// 各平台共用的收件人欄位
pub(crate) struct Recipient {
    pub order_id: String,
    pub name: String,
    pub phone: String,
    pub quantity: String,
}

pub(crate) fn shipment_row(
    ctx: &MappingContext<'_>,
    recipient: Recipient,
    resolved: ResolvedFields,
) -> ShipmentRow {
    ShipmentRow {
        owner_id: ctx.config.order.owner_id.clone(),
        order_id: recipient.order_id,
        client_code: recipient.name.clone(),
        order_date: resolved.order_date,
        product_code: resolved.product_code,
        product_name: resolved.product_name,
        quantity: recipient.quantity,
        delivery_method: resolved.delivery.method,
        recipient_name: recipient.name,
        recipient_address: resolved.delivery.address,
        recipient_phone: recipient.phone,
        arrival_window: None,
        remark: resolved.remark,
        item_note: String::new(),
        temperature_zone: ctx.config.order.temperature_zone.clone(),
    }
}

/// 備註 = 前綴 + (分隔符 + 出貨備註)
pub(crate) fn remark(prefix: &str, separator: &str, note: Option<&str>) -> String {
    match note {
        Some(note) => format!("{}{}{}", prefix, separator, note),
        None => prefix.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::catalog::ProductEntry;

    pub fn entry(qty: i64, mixx: &[&str], c2c_code: &[&str], c2c_name: &[&str]) -> ProductEntry {
        ProductEntry {
            name: None,
            qty,
            mixx_name: mixx.iter().map(|s| s.to_string()).collect(),
            c2c_code: c2c_code.iter().map(|s| s.to_string()).collect(),
            c2c_name: c2c_name.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }
}
