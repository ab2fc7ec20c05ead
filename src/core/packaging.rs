use crate::config::toml_config::PackagingSettings;
use crate::core::catalog::ProductCatalog;
use crate::domain::model::ShipmentRow;
use crate::utils::error::{EtlError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxSelection {
    pub code: String,
    pub label: String,
    pub total_units: i64,
}

/// 依整張訂單的體積單位挑選紙箱
#[derive(Debug, Clone, Copy)]
pub struct PackagingCalculator<'a> {
    settings: &'a PackagingSettings,
}

/// 數量允許小數，直接捨去；不是數字就是資料錯誤
pub fn parse_quantity(order_id: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|quantity| quantity.is_finite())
        .map(|quantity| quantity.trunc() as i64)
        .ok_or_else(|| EtlError::InvalidQuantity {
            order_id: order_id.to_string(),
            value: value.to_string(),
        })
}

impl<'a> PackagingCalculator<'a> {
    pub fn new(settings: &'a PackagingSettings) -> Self {
        Self { settings }
    }

    /// 沒有商品編號的列不計入體積
    pub fn total_units(&self, group: &[ShipmentRow], catalog: &ProductCatalog) -> Result<i64> {
        let mut total: i64 = 0;
        for row in group {
            let Some(code) = row.product_code.as_deref().filter(|c| !c.trim().is_empty()) else {
                continue;
            };
            let volume = catalog
                .unit_volume(code)
                .ok_or_else(|| EtlError::ProductNotFound {
                    order_id: row.order_id.clone(),
                    product_code: code.to_string(),
                })?;
            let quantity = parse_quantity(&row.order_id, &row.quantity)?;
            total = total.saturating_add(volume.saturating_mul(quantity));
        }
        Ok(total)
    }

    pub fn select(&self, total_units: i64) -> (&str, &str) {
        self.settings
            .tiers
            .iter()
            .find(|tier| total_units <= tier.max_units)
            .map_or(
                (
                    self.settings.overflow_code.as_str(),
                    self.settings.overflow_label.as_str(),
                ),
                |tier| (tier.code.as_str(), tier.label.as_str()),
            )
    }

    pub fn compute_box(&self, group: &[ShipmentRow], catalog: &ProductCatalog) -> Result<BoxSelection> {
        let total_units = self.total_units(group, catalog)?;
        let (code, label) = self.select(total_units);
        Ok(BoxSelection {
            code: code.to_string(),
            label: label.to_string(),
            total_units,
        })
    }

    /// 以群組第一列為底產生紙箱列；空群組不產生
    pub fn box_row(&self, group: &[ShipmentRow], catalog: &ProductCatalog) -> Result<Option<ShipmentRow>> {
        let Some(first) = group.first() else {
            return Ok(None);
        };

        let selection = self.compute_box(group, catalog)?;
        tracing::debug!(
            "📦 Order {}: {} units → {}",
            first.order_id,
            selection.total_units,
            selection.code
        );

        Ok(Some(ShipmentRow {
            product_code: Some(selection.code),
            product_name: selection.label,
            quantity: "1".to_string(),
            item_note: self.settings.box_note.clone(),
            ..first.clone()
        }))
    }
}
