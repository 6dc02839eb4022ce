use std::sync::Arc;

use tracing::{debug, instrument};

use crate::config::AlertConfig;
use crate::database::InventorySource;
use crate::models::{
    Alert, AlertError, CompanyId, InventoryRow, LowStockAlerts, Page, SalesWindow,
    SupplierSummary,
};

use super::stockout::days_until_stockout;
use super::threshold::ThresholdTable;

/// Turn joined rows into alerts, keeping only rows strictly below their
/// effective threshold. Row order is preserved.
pub fn assemble_alerts(
    rows: Vec<InventoryRow>,
    thresholds: &ThresholdTable,
    window_days: u32,
) -> LowStockAlerts {
    rows.into_iter()
        .filter_map(|row| {
            let threshold = thresholds.resolve(row.product_type.as_deref(), row.low_stock_threshold);
            if row.current_stock >= threshold {
                return None;
            }

            let days_until_stockout =
                days_until_stockout(row.current_stock, row.total_sold, window_days);
            let supplier = row.supplier_id.map(|id| SupplierSummary {
                id,
                name: row.supplier_name,
                contact_email: row.contact_email,
            });

            Some(Alert {
                product_id: row.product_id,
                product_name: row.product_name,
                sku: row.sku,
                warehouse_id: row.warehouse_id,
                warehouse_name: row.warehouse_name,
                current_stock: row.current_stock,
                threshold,
                days_until_stockout,
                supplier,
            })
        })
        .collect::<Vec<_>>()
        .into()
}

/// Request-scoped low-stock computation over an [`InventorySource`].
#[derive(Clone)]
pub struct AlertService {
    source: Arc<dyn InventorySource>,
    config: Arc<AlertConfig>,
}

impl AlertService {
    pub fn new(source: Arc<dyn InventorySource>, config: AlertConfig) -> Self {
        Self {
            source,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Compute the low-stock alerts of one company page.
    ///
    /// One data-access call per invocation; any failure aborts the whole
    /// computation.
    #[instrument(skip(self), fields(company_id = %company))]
    pub async fn low_stock_alerts(
        &self,
        company: CompanyId,
        page: Page,
    ) -> Result<LowStockAlerts, AlertError> {
        let window = SalesWindow::ending_now(self.config.window_days);

        let rows = self
            .source
            .fetch_inventory_rows(company, window, self.config.activity, page)
            .await?;
        let row_count = rows.len();

        let result = assemble_alerts(rows, &self.config.thresholds, self.config.window_days);

        debug!(
            rows = row_count,
            alerts = result.total_alerts,
            limit = page.limit,
            offset = page.offset,
            "Low-stock alerts computed"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(product_id: i32, product_type: &str, current_stock: i32, total_sold: i64) -> InventoryRow {
        InventoryRow {
            product_id,
            product_name: format!("Product {product_id}"),
            sku: format!("SKU-{product_id}"),
            product_type: Some(product_type.to_string()),
            low_stock_threshold: None,
            warehouse_id: 1,
            warehouse_name: "Main".to_string(),
            current_stock,
            supplier_id: None,
            supplier_name: None,
            contact_email: None,
            total_sold,
        }
    }

    #[test]
    fn test_stock_equal_to_threshold_does_not_alert() {
        let rows = vec![row(1, "electronics", 15, 30), row(2, "electronics", 14, 30)];

        let result = assemble_alerts(rows, &ThresholdTable::default(), 30);

        assert_eq!(result.total_alerts, 1);
        assert_eq!(result.alerts[0].product_id, 2);
        assert_eq!(result.alerts[0].threshold, 15);
    }

    #[test]
    fn test_alert_carries_projection_and_threshold() {
        let mut overridden = row(1, "electronics", 100, 30);
        overridden.low_stock_threshold = Some(150);

        let result = assemble_alerts(vec![overridden], &ThresholdTable::default(), 30);

        assert_eq!(result.alerts[0].threshold, 150);
        assert_eq!(result.alerts[0].days_until_stockout, Some(100));
    }

    #[test]
    fn test_supplier_summary_only_when_joined() {
        let mut with_supplier = row(1, "consumable", 10, 5);
        with_supplier.supplier_id = Some(4);
        with_supplier.supplier_name = Some("Acme".to_string());
        let without_supplier = row(2, "consumable", 10, 5);

        let result = assemble_alerts(
            vec![with_supplier, without_supplier],
            &ThresholdTable::default(),
            30,
        );

        let supplier = result.alerts[0].supplier.as_ref().unwrap();
        assert_eq!(supplier.id, 4);
        assert_eq!(supplier.name.as_deref(), Some("Acme"));
        assert_eq!(supplier.contact_email, None);
        assert!(result.alerts[1].supplier.is_none());
    }

    #[test]
    fn test_order_is_preserved() {
        let rows = vec![
            row(9, "apparel", 1, 3),
            row(3, "apparel", 2, 3),
            row(5, "apparel", 3, 3),
        ];

        let result = assemble_alerts(rows, &ThresholdTable::default(), 30);

        let ids: Vec<i32> = result.alerts.iter().map(|a| a.product_id).collect();
        assert_eq!(ids, vec![9, 3, 5]);
        assert_eq!(result.total_alerts, 3);
    }

    #[test]
    fn test_stagnant_row_alerts_without_projection() {
        let result = assemble_alerts(vec![row(1, "apparel", 2, 0)], &ThresholdTable::default(), 30);

        assert_eq!(result.alerts[0].days_until_stockout, None);
    }
}
