use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::alert::AlertError;

/// Catalog product. `product_type` is the category used for default thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub sku: String,
    #[serde(rename = "type", default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub low_stock_threshold: Option<i32>,
    #[serde(default)]
    pub supplier_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: i32,
    pub name: String,
    pub company_id: i32,
}

/// Current quantity of one product in one warehouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub product_id: i32,
    pub warehouse_id: i32,
    pub current_stock: i32,
}

/// Immutable record of units sold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleEvent {
    pub product_id: i32,
    pub warehouse_id: i32,
    pub quantity: i64,
    pub sale_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i32,
    pub name: String,
    pub contact_email: Option<String>,
}

/// Full dataset held by the in-memory source; also the JSON fixture format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub warehouses: Vec<Warehouse>,
    #[serde(default)]
    pub suppliers: Vec<Supplier>,
    #[serde(default)]
    pub stock: Vec<StockRecord>,
    #[serde(default)]
    pub sales: Vec<SaleEvent>,
}

/// Validated company scope taken from the request path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompanyId(i32);

impl CompanyId {
    /// Parse a raw path segment. Anything that is not a non-negative integer is rejected.
    pub fn parse(raw: &str) -> Result<Self, AlertError> {
        match raw.trim().parse::<i32>() {
            Ok(id) if id >= 0 => Ok(Self(id)),
            _ => Err(AlertError::Validation(format!(
                "company id '{raw}' is not a non-negative integer"
            ))),
        }
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for CompanyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trailing window `[as_of - days, as_of]` used to scope recent sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesWindow {
    pub days: u32,
    pub as_of: DateTime<Utc>,
}

impl SalesWindow {
    /// Window ending at the server's current time
    pub fn ending_now(days: u32) -> Self {
        Self {
            days,
            as_of: Utc::now(),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.as_of - Duration::days(i64::from(self.days))
    }

    /// Both bounds are inclusive.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start() && at <= self.as_of
    }
}

/// Pagination over the joined inventory rows (applied before threshold filtering)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    /// Lenient parsing of `limit`/`offset` query values: missing, non-numeric or
    /// non-positive limits use `default_limit`, oversized limits are clamped to
    /// `max_limit`, and anything but a non-negative offset becomes 0.
    pub fn from_params(
        limit: Option<&str>,
        offset: Option<&str>,
        default_limit: u32,
        max_limit: u32,
    ) -> Self {
        let limit = limit
            .and_then(|s| s.trim().parse::<u32>().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(default_limit)
            .min(max_limit);
        let offset = offset
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(0);

        Self { limit, offset }
    }
}

/// Whether rows without sales in the window reach the threshold filter at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityFilter {
    /// Only (product, warehouse) pairs with recent sales are considered
    #[default]
    RecentSalesOnly,
    /// Stagnant pairs are kept; they alert without a stockout projection
    IncludeStagnant,
}

impl ActivityFilter {
    pub fn keeps(&self, total_sold: i64) -> bool {
        match self {
            ActivityFilter::RecentSalesOnly => total_sold > 0,
            ActivityFilter::IncludeStagnant => true,
        }
    }
}

/// One joined (product, warehouse, stock) row enriched with recent sales and supplier data.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRow {
    pub product_id: i32,
    pub product_name: String,
    pub sku: String,
    pub product_type: Option<String>,
    pub low_stock_threshold: Option<i32>,
    pub warehouse_id: i32,
    pub warehouse_name: String,
    pub current_stock: i32,
    pub supplier_id: Option<i32>,
    pub supplier_name: Option<String>,
    pub contact_email: Option<String>,
    pub total_sold: i64,
}
