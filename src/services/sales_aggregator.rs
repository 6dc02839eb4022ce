use std::collections::HashMap;

use crate::models::{SaleEvent, SalesWindow};

/// Units sold per `(product_id, warehouse_id)` inside a sales window.
///
/// Pairs without qualifying sales are absent rather than present with zero.
pub type SalesAggregate = HashMap<(i32, i32), i64>;

/// Sum quantities sold per (product, warehouse) pair within `window`.
pub fn aggregate_sales<'a, I>(sales: I, window: &SalesWindow) -> SalesAggregate
where
    I: IntoIterator<Item = &'a SaleEvent>,
{
    let mut totals = SalesAggregate::new();
    for sale in sales {
        if window.contains(sale.sale_date) {
            *totals.entry((sale.product_id, sale.warehouse_id)).or_insert(0) += sale.quantity;
        }
    }
    totals.retain(|_, total| *total != 0);
    totals
}
