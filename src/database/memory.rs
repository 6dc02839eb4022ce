use std::path::Path;
use std::sync::RwLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::database::InventorySource;
use crate::models::{
    ActivityFilter, AlertError, CompanyId, InventoryRow, InventorySnapshot, Page, SalesWindow,
    StockRecord,
};
#[cfg(test)]
use crate::models::SaleEvent;
use crate::services::{aggregate_sales, join_inventory};

/// In-memory inventory source.
///
/// Intended for tests/dev. Runs the sales aggregator and the inventory joiner
/// over a snapshot held behind a lock, so each request sees a consistent view.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    snapshot: RwLock<InventorySnapshot>,
}

impl InMemoryInventory {
    /// Build from a snapshot, keeping (product, warehouse) pairs unique; the
    /// last record of a duplicated pair wins. Negative stock is rejected.
    pub fn from_snapshot(snapshot: InventorySnapshot) -> Result<Self> {
        if let Some(bad) = snapshot.stock.iter().find(|r| r.current_stock < 0) {
            anyhow::bail!(
                "Stock for product {} in warehouse {} must be non-negative, got {}",
                bad.product_id,
                bad.warehouse_id,
                bad.current_stock
            );
        }

        let mut inventory = Self::default();
        let data = inventory.data_mut();
        data.products = snapshot.products;
        data.warehouses = snapshot.warehouses;
        data.suppliers = snapshot.suppliers;
        data.sales = snapshot.sales;

        for record in snapshot.stock {
            inventory.upsert_stock(record);
        }
        Ok(inventory)
    }

    /// Load a JSON fixture shaped like [`InventorySnapshot`]
    pub fn from_fixture(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        let snapshot: InventorySnapshot = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse fixture {}", path.display()))?;

        info!(
            products = snapshot.products.len(),
            warehouses = snapshot.warehouses.len(),
            sales = snapshot.sales.len(),
            "📦 Loaded inventory fixture from {}",
            path.display()
        );

        Self::from_snapshot(snapshot)
            .with_context(|| format!("Invalid fixture {}", path.display()))
    }

    pub fn stock_records(&self) -> Vec<StockRecord> {
        match self.snapshot.read() {
            Ok(data) => data.stock.clone(),
            Err(poisoned) => poisoned.into_inner().stock.clone(),
        }
    }

    fn upsert_stock(&mut self, record: StockRecord) {
        let stock = &mut self.data_mut().stock;
        match stock
            .iter_mut()
            .find(|r| r.product_id == record.product_id && r.warehouse_id == record.warehouse_id)
        {
            Some(existing) => existing.current_stock = record.current_stock,
            None => stock.push(record),
        }
    }

    #[cfg(test)]
    fn record_sale(&mut self, sale: SaleEvent) {
        self.data_mut().sales.push(sale);
    }

    fn data_mut(&mut self) -> &mut InventorySnapshot {
        self.snapshot.get_mut().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl InventorySource for InMemoryInventory {
    async fn fetch_inventory_rows(
        &self,
        company: CompanyId,
        window: SalesWindow,
        activity: ActivityFilter,
        page: Page,
    ) -> Result<Vec<InventoryRow>, AlertError> {
        let data = self
            .snapshot
            .read()
            .map_err(|_| AlertError::Computation("Inventory snapshot lock poisoned".to_string()))?;

        let sales = aggregate_sales(&data.sales, &window);
        Ok(join_inventory(company, &data, &sales, activity, page))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Product, Warehouse};
    use chrono::{Duration, Utc};

    fn record(product_id: i32, warehouse_id: i32, current_stock: i32) -> StockRecord {
        StockRecord {
            product_id,
            warehouse_id,
            current_stock,
        }
    }

    fn inventory(current_stock: i32) -> InMemoryInventory {
        InMemoryInventory::from_snapshot(InventorySnapshot {
            products: vec![Product {
                id: 100,
                name: "Charger".to_string(),
                sku: "CHG-100".to_string(),
                product_type: Some("electronics".to_string()),
                low_stock_threshold: None,
                supplier_id: None,
            }],
            warehouses: vec![Warehouse {
                id: 1,
                name: "Main".to_string(),
                company_id: 5,
            }],
            stock: vec![record(100, 1, current_stock)],
            ..InventorySnapshot::default()
        })
        .unwrap()
    }

    #[test]
    fn test_snapshot_keeps_pair_unique() {
        let snapshot = InventorySnapshot {
            stock: vec![record(1, 1, 4), record(2, 1, 3), record(1, 1, 9)],
            ..InventorySnapshot::default()
        };

        let records = InMemoryInventory::from_snapshot(snapshot).unwrap().stock_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].current_stock, 9);
        assert_eq!(records[1].current_stock, 3);
    }

    #[test]
    fn test_negative_stock_is_rejected() {
        let snapshot = InventorySnapshot {
            stock: vec![record(1, 1, 4), record(1, 2, -3)],
            ..InventorySnapshot::default()
        };

        let err = InMemoryInventory::from_snapshot(snapshot).unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn test_fixture_with_negative_stock_fails_to_load() {
        let path = std::env::temp_dir().join(format!("negative-stock-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{"stock": [{"product_id": 1, "warehouse_id": 2, "current_stock": -1}]}"#,
        )
        .unwrap();

        let result = InMemoryInventory::from_fixture(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_uses_recent_sales_only() {
        let mut inventory = inventory(6);
        inventory.record_sale(SaleEvent {
            product_id: 100,
            warehouse_id: 1,
            quantity: 40,
            sale_date: Utc::now() - Duration::days(60),
        });

        let company = CompanyId::parse("5").unwrap();
        let page = Page { limit: 10, offset: 0 };

        let rows = inventory
            .fetch_inventory_rows(company, SalesWindow::ending_now(30), ActivityFilter::default(), page)
            .await
            .unwrap();
        assert!(rows.is_empty());

        inventory.record_sale(SaleEvent {
            product_id: 100,
            warehouse_id: 1,
            quantity: 3,
            sale_date: Utc::now() - Duration::days(2),
        });

        let rows = inventory
            .fetch_inventory_rows(company, SalesWindow::ending_now(30), ActivityFilter::default(), page)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_sold, 3);
        assert_eq!(rows[0].current_stock, 6);
    }

    #[test]
    fn test_fixture_format() {
        let raw = r#"{
            "products": [{"id": 1, "name": "Tee", "sku": "T-1", "type": "apparel"}],
            "warehouses": [{"id": 2, "name": "East", "company_id": 3}],
            "stock": [{"product_id": 1, "warehouse_id": 2, "current_stock": 4}],
            "sales": [{"product_id": 1, "warehouse_id": 2, "quantity": 6,
                       "sale_date": "2024-05-01T10:00:00Z"}]
        }"#;

        let snapshot: InventorySnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.products[0].product_type.as_deref(), Some("apparel"));
        assert_eq!(snapshot.products[0].low_stock_threshold, None);
        assert!(snapshot.suppliers.is_empty());
        assert_eq!(snapshot.sales[0].quantity, 6);
    }
}
