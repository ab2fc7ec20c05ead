use super::{remark, shipment_row, Admission, FieldMapper, MappingContext, Recipient, ResolvedFields};
use crate::core::dates::format_optional;
use crate::core::routing::Delivery;
use crate::domain::model::{ProcessingIssue, ShipmentRow};
use crate::domain::orders::{present, text, C2cOrderLine};

const STYLE_SUFFIX: &str = "-F";
const GIFT_SUFFIX: &str = "(贈品)-F";
const SPECIAL_PARTS: usize = 2;

/// C2C 一律宅配，贈品組合拆成兩個品項
#[derive(Debug, Clone, Copy, Default)]
pub struct C2cMapper;

impl C2cMapper {
    pub fn is_special(line: &C2cOrderLine, special_product: &str) -> bool {
        present(&line.product_id) == Some(special_product)
    }

    /// 去掉贈品字尾後以 "+" 拆開，缺的部分退回整串樣式
    pub fn special_part_names(style: &str) -> Vec<String> {
        let cleaned = style.replace(GIFT_SUFFIX, "");
        let parts: Vec<&str> = cleaned.split('+').map(str::trim).collect();
        (0..SPECIAL_PARTS)
            .map(|i| {
                parts
                    .get(i)
                    .filter(|part| !part.is_empty())
                    .map_or_else(|| cleaned.trim().to_string(), |part| part.to_string())
            })
            .collect()
    }
}

impl FieldMapper for C2cMapper {
    type Line = C2cOrderLine;

    fn admit(&self, line: &C2cOrderLine) -> Admission {
        match present(&line.order_id) {
            Some(order_id) => Admission::Group(order_id.to_string()),
            None => Admission::Orphan,
        }
    }

    fn resolve(
        &self,
        line: &C2cOrderLine,
        ctx: &MappingContext<'_>,
        issues: &mut Vec<ProcessingIssue>,
    ) -> Vec<ResolvedFields> {
        let order = &ctx.config.order;
        let order_id = text(&line.order_id);
        let style = present(&line.product_style).unwrap_or_default();
        let product_id = present(&line.product_id).unwrap_or_default();

        let base = ResolvedFields {
            product_code: None,
            product_name: String::new(),
            order_date: format_optional(present(&line.created_at)),
            remark: remark(&order.c2c_remark, " | ", present(&line.shipping_note)),
            delivery: Delivery::new(&order.home_delivery_code, text(&line.recipient_address)),
        };

        let items: Vec<(Option<String>, String)> =
            if Self::is_special(line, &order.special_product) {
                Self::special_part_names(style)
                    .into_iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let code = ctx
                            .catalog
                            .find_by_c2c_code(&format!("{}-{}", order.special_product, i))
                            .or_else(|| ctx.catalog.find_by_c2c_name(&name))
                            .map(str::to_string);
                        (code, name)
                    })
                    .collect()
            } else {
                let code = ctx
                    .catalog
                    .find_by_c2c(product_id, present(&line.product_style))
                    .map(str::to_string);
                vec![(code, style.replace(STYLE_SUFFIX, ""))]
            };

        items
            .into_iter()
            .map(|(product_code, product_name)| {
                if product_code.is_none() {
                    tracing::warn!(
                        "⚠️ C2C order {}: no catalog entry for {} ({})",
                        order_id,
                        product_id,
                        product_name
                    );
                    issues.push(ProcessingIssue::new(
                        &order_id,
                        "product_code",
                        format!("no catalog entry for {} ({})", product_id, product_name),
                    ));
                }
                ResolvedFields {
                    product_code,
                    product_name,
                    ..base.clone()
                }
            })
            .collect()
    }

    fn map(&self, line: &C2cOrderLine, resolved: ResolvedFields, ctx: &MappingContext<'_>) -> ShipmentRow {
        let recipient = Recipient {
            order_id: text(&line.order_id),
            name: text(&line.recipient_name),
            phone: text(&line.recipient_phone),
            quantity: text(&line.quantity),
        };
        shipment_row(ctx, recipient, resolved)
    }
}
