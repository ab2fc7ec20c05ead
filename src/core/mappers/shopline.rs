use super::{remark, shipment_row, Admission, FieldMapper, MappingContext, Recipient, ResolvedFields};
use crate::core::dates::format_optional;
use crate::core::routing::route_delivery;
use crate::domain::model::{ArrivalWindow, ProcessingIssue, ShipmentRow, ERROR_MARKER};
use crate::domain::orders::{present, text, ShoplineOrderLine};

/// Shopline 的商品貨號直接就是商品編號，送貨方式決定地址
#[derive(Debug, Clone, Copy, Default)]
pub struct ShoplineMapper;

impl ShoplineMapper {
    /// 商品貨號以 "-" 拆開後的第三段當作品名字尾
    pub fn sku_suffix(sku: &str) -> String {
        match sku.split('-').nth(2) {
            Some(segment) => format!("-{}", segment),
            None => String::new(),
        }
    }
}

impl FieldMapper for ShoplineMapper {
    type Line = ShoplineOrderLine;

    /// 沒有訂單號碼或商品貨號的列整列捨棄
    fn admit(&self, line: &ShoplineOrderLine) -> Admission {
        match (present(&line.order_id), present(&line.sku)) {
            (Some(order_id), Some(_)) => Admission::Group(order_id.to_string()),
            _ => Admission::Skip,
        }
    }

    fn resolve(
        &self,
        line: &ShoplineOrderLine,
        ctx: &MappingContext<'_>,
        issues: &mut Vec<ProcessingIssue>,
    ) -> Vec<ResolvedFields> {
        let config = ctx.config;
        let sku = present(&line.sku).unwrap_or_default();
        let name = present(&line.product_name)
            .or_else(|| present(&line.option))
            .unwrap_or_default();

        let delivery = route_delivery(line, ctx.book, &config.order, &config.shipping);
        if delivery.address.contains(ERROR_MARKER) {
            let order_id = text(&line.order_id);
            issues.push(ProcessingIssue::new(
                &order_id,
                "recipient_address",
                format!(
                    "{} store {} has no confirmed address",
                    delivery.method,
                    text(&line.store_name)
                ),
            ));
        }

        vec![ResolvedFields {
            product_code: Some(sku.to_string()),
            product_name: format!("{}{}", name, Self::sku_suffix(sku)),
            order_date: format_optional(present(&line.order_date)),
            remark: remark(&config.order.default_remark, "/", present(&line.shipping_note)),
            delivery,
        }]
    }

    fn map(&self, line: &ShoplineOrderLine, resolved: ResolvedFields, ctx: &MappingContext<'_>) -> ShipmentRow {
        let recipient = Recipient {
            order_id: text(&line.order_id),
            name: text(&line.recipient_name),
            phone: text(&line.recipient_phone),
            quantity: text(&line.quantity),
        };
        shipment_row(ctx, recipient, resolved)
    }

    fn annotate(&self, line: &ShoplineOrderLine, row: &mut ShipmentRow, ctx: &MappingContext<'_>) {
        let shipping = &ctx.config.shipping;
        row.arrival_window = match present(&line.arrival_time) {
            Some(marker) if marker == shipping.morning_marker => Some(ArrivalWindow::Morning),
            Some(marker) if marker == shipping.afternoon_marker => Some(ArrivalWindow::Afternoon),
            _ => row.arrival_window,
        };
    }
}
