use std::collections::HashMap;

use crate::models::{ActivityFilter, CompanyId, InventoryRow, InventorySnapshot, Page};

use super::sales_aggregator::SalesAggregate;

/// Join stock records of one company's warehouses with their products, the
/// recent sales aggregate and (optionally) the product supplier.
///
/// Only warehouses owned by `company` take part in the join, so rows of other
/// companies never exist in the output. Rows are ordered by
/// `(product_id, warehouse_id)`, passed through the activity filter and then
/// paginated. Threshold filtering happens later, in the assembler.
pub fn join_inventory(
    company: CompanyId,
    snapshot: &InventorySnapshot,
    sales: &SalesAggregate,
    activity: ActivityFilter,
    page: Page,
) -> Vec<InventoryRow> {
    let warehouses: HashMap<i32, _> = snapshot
        .warehouses
        .iter()
        .filter(|w| w.company_id == company.value())
        .map(|w| (w.id, w))
        .collect();
    let products: HashMap<i32, _> = snapshot.products.iter().map(|p| (p.id, p)).collect();
    let suppliers: HashMap<i32, _> = snapshot.suppliers.iter().map(|s| (s.id, s)).collect();

    let mut rows: Vec<InventoryRow> = snapshot
        .stock
        .iter()
        .filter_map(|record| {
            let warehouse = warehouses.get(&record.warehouse_id)?;
            let product = products.get(&record.product_id)?;
            let supplier = product.supplier_id.and_then(|id| suppliers.get(&id));
            let total_sold = sales
                .get(&(product.id, warehouse.id))
                .copied()
                .unwrap_or(0);

            Some(InventoryRow {
                product_id: product.id,
                product_name: product.name.clone(),
                sku: product.sku.clone(),
                product_type: product.product_type.clone(),
                low_stock_threshold: product.low_stock_threshold,
                warehouse_id: warehouse.id,
                warehouse_name: warehouse.name.clone(),
                current_stock: record.current_stock,
                supplier_id: supplier.map(|s| s.id),
                supplier_name: supplier.map(|s| s.name.clone()),
                contact_email: supplier.and_then(|s| s.contact_email.clone()),
                total_sold,
            })
        })
        .filter(|row| activity.keeps(row.total_sold))
        .collect();

    rows.sort_by_key(|row| (row.product_id, row.warehouse_id));

    rows.into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Product, StockRecord, Supplier, Warehouse};

    const ALL: Page = Page {
        limit: 100,
        offset: 0,
    };

    fn snapshot() -> InventorySnapshot {
        InventorySnapshot {
            products: vec![
                Product {
                    id: 1,
                    name: "Cable".to_string(),
                    sku: "CBL-1".to_string(),
                    product_type: Some("electronics".to_string()),
                    low_stock_threshold: None,
                    supplier_id: Some(9),
                },
                Product {
                    id: 2,
                    name: "Shirt".to_string(),
                    sku: "SHT-2".to_string(),
                    product_type: Some("apparel".to_string()),
                    low_stock_threshold: None,
                    supplier_id: None,
                },
            ],
            warehouses: vec![
                Warehouse {
                    id: 10,
                    name: "North".to_string(),
                    company_id: 1,
                },
                Warehouse {
                    id: 20,
                    name: "Elsewhere".to_string(),
                    company_id: 2,
                },
            ],
            suppliers: vec![Supplier {
                id: 9,
                name: "Acme".to_string(),
                contact_email: Some("orders@acme.test".to_string()),
            }],
            stock: vec![
                StockRecord {
                    product_id: 2,
                    warehouse_id: 10,
                    current_stock: 4,
                },
                StockRecord {
                    product_id: 1,
                    warehouse_id: 10,
                    current_stock: 3,
                },
                StockRecord {
                    product_id: 1,
                    warehouse_id: 20,
                    current_stock: 1,
                },
            ],
            sales: vec![],
        }
    }

    fn company(id: i32) -> CompanyId {
        CompanyId::parse(&id.to_string()).unwrap()
    }

    #[test]
    fn test_rows_are_scoped_to_company() {
        let sales = SalesAggregate::from([((1, 10), 5), ((2, 10), 7), ((1, 20), 50)]);

        let rows = join_inventory(company(1), &snapshot(), &sales, ActivityFilter::default(), ALL);

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.warehouse_id == 10));
    }

    #[test]
    fn test_rows_are_ordered_and_enriched() {
        let sales = SalesAggregate::from([((1, 10), 5), ((2, 10), 7)]);

        let rows = join_inventory(company(1), &snapshot(), &sales, ActivityFilter::default(), ALL);

        assert_eq!(rows[0].product_id, 1);
        assert_eq!(rows[0].total_sold, 5);
        assert_eq!(rows[0].supplier_id, Some(9));
        assert_eq!(rows[0].contact_email.as_deref(), Some("orders@acme.test"));
        assert_eq!(rows[1].product_id, 2);
        assert_eq!(rows[1].supplier_id, None);
        assert_eq!(rows[1].supplier_name, None);
    }

    #[test]
    fn test_rows_without_recent_sales_are_dropped() {
        let sales = SalesAggregate::from([((2, 10), 7)]);

        let rows = join_inventory(company(1), &snapshot(), &sales, ActivityFilter::default(), ALL);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product_id, 2);
    }

    #[test]
    fn test_stagnant_rows_kept_when_configured() {
        let sales = SalesAggregate::new();

        let rows = join_inventory(
            company(1),
            &snapshot(),
            &sales,
            ActivityFilter::IncludeStagnant,
            ALL,
        );

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.total_sold == 0));
    }

    #[test]
    fn test_pagination_applies_after_activity_filter() {
        let sales = SalesAggregate::from([((1, 10), 5), ((2, 10), 7)]);
        let data = snapshot();

        let first = join_inventory(
            company(1),
            &data,
            &sales,
            ActivityFilter::default(),
            Page { limit: 1, offset: 0 },
        );
        let second = join_inventory(
            company(1),
            &data,
            &sales,
            ActivityFilter::default(),
            Page { limit: 1, offset: 1 },
        );
        let past_end = join_inventory(
            company(1),
            &data,
            &sales,
            ActivityFilter::default(),
            Page { limit: 1, offset: 2 },
        );

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_ne!(first[0].product_id, second[0].product_id);
        assert!(past_end.is_empty());
    }

    #[test]
    fn test_unknown_company_yields_nothing() {
        let sales = SalesAggregate::from([((1, 10), 5)]);

        let rows = join_inventory(company(77), &snapshot(), &sales, ActivityFilter::default(), ALL);

        assert!(rows.is_empty());
    }
}
