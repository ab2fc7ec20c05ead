//! 訂單合併：單次順序掃描，相鄰且訂單編號相同的列成為一組，
//! 每組結束時緊接著插入一列紙箱。

use crate::config::toml_config::ConsolidatorConfig;
use crate::core::address::StoreAddressBook;
use crate::core::catalog::ProductCatalog;
use crate::core::mappers::{
    Admission, C2cMapper, FieldMapper, MappingContext, MixxMapper, ShoplineMapper,
};
use crate::core::packaging::PackagingCalculator;
use crate::domain::model::{ConsolidationReport, ProcessingIssue, ShipmentRow, INVALID_DATE};
use crate::domain::orders::OrderSheet;
use crate::utils::error::Result;
use chrono::NaiveDate;
use std::sync::Arc;

/// 目前累積中的訂單群組
struct OrderGrouper<'a> {
    calculator: PackagingCalculator<'a>,
    catalog: &'a ProductCatalog,
    current: Option<String>,
    group: Vec<ShipmentRow>,
    box_rows: usize,
}

impl<'a> OrderGrouper<'a> {
    fn new(calculator: PackagingCalculator<'a>, catalog: &'a ProductCatalog) -> Self {
        Self {
            calculator,
            catalog,
            current: None,
            group: Vec::new(),
            box_rows: 0,
        }
    }

    fn push(&mut self, order_id: &str, row: ShipmentRow, output: &mut Vec<ShipmentRow>) -> Result<()> {
        if self.current.as_deref() != Some(order_id) {
            self.flush(output)?;
            self.current = Some(order_id.to_string());
        }
        self.group.push(row.clone());
        output.push(row);
        Ok(())
    }

    fn flush(&mut self, output: &mut Vec<ShipmentRow>) -> Result<()> {
        if let Some(box_row) = self.calculator.box_row(&self.group, self.catalog)? {
            output.push(box_row);
            self.box_rows += 1;
        }
        self.group.clear();
        self.current = None;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Consolidated {
    rows: Vec<ShipmentRow>,
    box_rows: usize,
    skipped_rows: usize,
    orphan_rows: usize,
    issues: Vec<ProcessingIssue>,
}

pub struct ConsolidationEngine {
    config: Arc<ConsolidatorConfig>,
}

impl ConsolidationEngine {
    pub fn new(config: Arc<ConsolidatorConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConsolidatorConfig {
        &self.config
    }

    /// 輸入需已排序；相同訂單編號但不相鄰的列會各自成組
    pub fn consolidate(
        &self,
        sheet: &OrderSheet,
        catalog: &ProductCatalog,
        book: &StoreAddressBook,
        today: NaiveDate,
    ) -> Result<ConsolidationReport> {
        let ctx = MappingContext {
            config: &self.config,
            catalog,
            book,
            today,
        };

        let consolidated = match sheet {
            OrderSheet::C2c(lines) => self.run(&C2cMapper, lines, &ctx)?,
            OrderSheet::Mixx(lines) => self.run(&MixxMapper, lines, &ctx)?,
            OrderSheet::Shopline(lines) => self.run(&ShoplineMapper, lines, &ctx)?,
        };

        tracing::debug!(
            "{} input rows → {} output rows ({} boxes)",
            sheet.len(),
            consolidated.rows.len(),
            consolidated.box_rows
        );

        Ok(ConsolidationReport {
            platform: sheet.platform(),
            rows: consolidated.rows,
            box_rows: consolidated.box_rows,
            skipped_rows: consolidated.skipped_rows,
            orphan_rows: consolidated.orphan_rows,
            issues: consolidated.issues,
        })
    }

    fn run<M: FieldMapper>(
        &self,
        mapper: &M,
        lines: &[M::Line],
        ctx: &MappingContext<'_>,
    ) -> Result<Consolidated> {
        let calculator = PackagingCalculator::new(&self.config.packaging);
        let mut grouper = OrderGrouper::new(calculator, ctx.catalog);
        let mut out = Consolidated::default();

        for line in lines {
            let admission = mapper.admit(line);
            if admission == Admission::Skip {
                out.skipped_rows += 1;
                continue;
            }
            // 沒有訂單編號也算換單，先結束目前的群組
            if admission == Admission::Orphan {
                grouper.flush(&mut out.rows)?;
            }

            for resolved in mapper.resolve(line, ctx, &mut out.issues) {
                let mut row = mapper.map(line, resolved, ctx);
                mapper.annotate(line, &mut row, ctx);
                if row.order_date == INVALID_DATE {
                    out.issues.push(ProcessingIssue::new(
                        &row.order_id,
                        "order_date",
                        "order date could not be parsed",
                    ));
                }

                match &admission {
                    Admission::Group(order_id) => grouper.push(order_id, row, &mut out.rows)?,
                    _ => {
                        out.orphan_rows += 1;
                        out.rows.push(row);
                    }
                }
            }
        }

        grouper.flush(&mut out.rows)?;
        out.box_rows = grouper.box_rows;

        if out.skipped_rows > 0 {
            tracing::info!("Skipped {} rows without order number or SKU", out.skipped_rows);
        }
        if out.orphan_rows > 0 {
            tracing::warn!("⚠️ {} rows have no order number and were not boxed", out.orphan_rows);
        }

        Ok(out)
    }
}
