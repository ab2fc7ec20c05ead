use super::{remark, shipment_row, Admission, FieldMapper, MappingContext, Recipient, ResolvedFields};
use crate::core::dates::{format_date, DateValue};
use crate::core::routing::Delivery;
use crate::domain::model::{ProcessingIssue, ShipmentRow};
use crate::domain::orders::{present, text, MixxOrderLine};

/// Mixx 匯出檔沒有可用的訂單日期，一律用處理當天
#[derive(Debug, Clone, Copy, Default)]
pub struct MixxMapper;

impl MixxMapper {
    /// 品名格式為「品牌｜商品名稱」，只拿商品名稱比對
    pub fn search_name(description: &str) -> &str {
        description
            .split('｜')
            .nth(1)
            .map_or(description, str::trim)
    }
}

impl FieldMapper for MixxMapper {
    type Line = MixxOrderLine;

    fn admit(&self, line: &MixxOrderLine) -> Admission {
        match present(&line.order_id) {
            Some(order_id) => Admission::Group(order_id.to_string()),
            None => Admission::Orphan,
        }
    }

    fn resolve(
        &self,
        line: &MixxOrderLine,
        ctx: &MappingContext<'_>,
        issues: &mut Vec<ProcessingIssue>,
    ) -> Vec<ResolvedFields> {
        let order = &ctx.config.order;
        let description = text(&line.description);
        let product_code = ctx
            .catalog
            .find_by_mixx_name(Self::search_name(&description))
            .map(str::to_string);

        if product_code.is_none() {
            let order_id = text(&line.order_id);
            tracing::warn!("⚠️ Mixx order {}: no catalog entry for {}", order_id, description);
            issues.push(ProcessingIssue::new(
                &order_id,
                "product_code",
                format!("no catalog entry for {}", description),
            ));
        }

        vec![ResolvedFields {
            product_code,
            product_name: description,
            order_date: format_date(&DateValue::from(ctx.today)),
            remark: remark(&order.default_remark, "/", present(&line.note)),
            delivery: Delivery::new(&order.home_delivery_code, text(&line.recipient_address)),
        }]
    }

    fn map(&self, line: &MixxOrderLine, resolved: ResolvedFields, ctx: &MappingContext<'_>) -> ShipmentRow {
        let recipient = Recipient {
            order_id: text(&line.order_id),
            name: text(&line.recipient_name),
            phone: text(&line.recipient_phone),
            quantity: text(&line.quantity),
        };
        shipment_row(ctx, recipient, resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::ConsolidatorConfig;
    use crate::core::address::StoreAddressBook;
    use crate::core::catalog::ProductCatalog;
    use crate::core::mappers::test_support::{entry, today};

    fn line(description: &str, note: Option<&str>) -> MixxOrderLine {
        MixxOrderLine {
            order_id: Some("M001".to_string()),
            recipient_name: Some("陳先生".to_string()),
            recipient_phone: Some("0922333444".to_string()),
            recipient_address: Some("台中市西屯區".to_string()),
            description: Some(description.to_string()),
            quantity: Some("3".to_string()),
            note: note.map(str::to_string),
        }
    }

    fn map_one(line: &MixxOrderLine) -> (ShipmentRow, Vec<ProcessingIssue>) {
        let config = ConsolidatorConfig::default();
        let catalog = ProductCatalog::from_entries([(
            "bagel007-2EA",
            entry(2, &["減醣市集｜法式AOP極致奶油貝果 (2入)"], &[], &[]),
        )]);
        let book = StoreAddressBook::new();
        let ctx = MappingContext {
            config: &config,
            catalog: &catalog,
            book: &book,
            today: today(),
        };
        let mut issues = Vec::new();
        let mut resolved = MixxMapper.resolve(line, &ctx, &mut issues);
        assert_eq!(resolved.len(), 1);
        let row = MixxMapper.map(line, resolved.remove(0), &ctx);
        (row, issues)
    }

    #[test]
    fn test_search_name_takes_second_segment() {
        assert_eq!(
            MixxMapper::search_name("減醣市集｜法式AOP極致奶油貝果 (2入)"),
            "法式AOP極致奶油貝果 (2入)"
        );
        assert_eq!(MixxMapper::search_name("沒有品牌"), "沒有品牌");
    }

    #[test]
    fn test_maps_with_today_and_home_delivery() {
        let (row, issues) = map_one(&line("減醣市集｜法式AOP極致奶油貝果 (2入)", Some("放管理室")));

        assert!(issues.is_empty());
        assert_eq!(row.product_code.as_deref(), Some("bagel007-2EA"));
        assert_eq!(row.product_name, "減醣市集｜法式AOP極致奶油貝果 (2入)");
        assert_eq!(row.order_date, "20250110");
        assert_eq!(row.delivery_method, "Tcat");
        assert_eq!(row.recipient_address, "台中市西屯區");
        assert_eq!(row.remark, "減醣市集/放管理室");
        assert_eq!(row.quantity, "3");
    }

    #[test]
    fn test_unknown_description_leaves_code_empty() {
        let (row, issues) = map_one(&line("減醣市集｜下架商品", None));

        assert_eq!(row.product_code, None);
        assert_eq!(row.remark, "減醣市集");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "product_code");
    }
}
