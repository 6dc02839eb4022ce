use crate::database::{Database, InventorySource};
use crate::models::{ActivityFilter, AlertError, CompanyId, InventoryRow, Page, SalesWindow};
use async_trait::async_trait;
use tiberius::{Query, Row};
use tracing::{debug, instrument};

/// Recent sales per (product, warehouse) are aggregated in the `RecentSales`
/// CTE and joined onto the company's stock records in the same statement, so
/// sales and stock are read from one snapshot.
///
/// Parameters: @P1 company id, @P2 window days, @P3 "now" (UTC),
/// @P4 include stagnant rows (0/1), @P5 offset, @P6 limit.
const LOW_STOCK_ROWS_QUERY: &str = r#"
    WITH RecentSales AS (
        SELECT s.product_id, s.warehouse_id, SUM(CAST(s.quantity AS BIGINT)) AS total_sold
        FROM sales s WITH (NOLOCK)
        WHERE s.sale_date >= DATEADD(day, -@P2, @P3)
          AND s.sale_date <= @P3
        GROUP BY s.product_id, s.warehouse_id
    )
    SELECT
        p.id AS product_id,
        p.name AS product_name,
        p.sku,
        p.type AS product_type,
        p.low_stock_threshold,
        w.id AS warehouse_id,
        w.name AS warehouse_name,
        ps.current_stock,
        sup.id AS supplier_id,
        sup.name AS supplier_name,
        sup.contact_email,
        CAST(COALESCE(rs.total_sold, 0) AS BIGINT) AS total_sold
    FROM warehouses w WITH (NOLOCK)
    JOIN product_stock ps WITH (NOLOCK)
        ON ps.warehouse_id = w.id
    JOIN products p WITH (NOLOCK)
        ON p.id = ps.product_id
    LEFT JOIN RecentSales rs
        ON rs.product_id = p.id AND rs.warehouse_id = w.id
    LEFT JOIN suppliers sup WITH (NOLOCK)
        ON sup.id = p.supplier_id
    WHERE w.company_id = @P1
      -- activity filter: pairs without recent sales only pass when stagnant rows are included
      AND (@P4 = 1 OR COALESCE(rs.total_sold, 0) > 0)
    ORDER BY p.id, w.id
    OFFSET @P5 ROWS FETCH NEXT @P6 ROWS ONLY
"#;

/// SQL Server backed inventory source
pub struct AlertsDatabase {
    db: Database,
}

impl AlertsDatabase {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InventorySource for AlertsDatabase {
    #[instrument(skip(self), fields(company_id = %company))]
    async fn fetch_inventory_rows(
        &self,
        company: CompanyId,
        window: SalesWindow,
        activity: ActivityFilter,
        page: Page,
    ) -> Result<Vec<InventoryRow>, AlertError> {
        let mut client = self
            .db
            .get_client()
            .await
            .map_err(|e| AlertError::database("Failed to get database connection", e))?;

        let include_stagnant = i32::from(activity == ActivityFilter::IncludeStagnant);

        let mut query = Query::new(LOW_STOCK_ROWS_QUERY);
        query.bind(company.value());
        query.bind(i32::try_from(window.days).unwrap_or(i32::MAX));
        query.bind(window.as_of.naive_utc());
        query.bind(include_stagnant);
        query.bind(i64::from(page.offset));
        query.bind(i64::from(page.limit));

        let rows = query
            .query(&mut *client)
            .await
            .map_err(|e| AlertError::database("Failed to query low-stock rows", e))?
            .into_first_result()
            .await
            .map_err(|e| AlertError::database("Failed to read low-stock rows", e))?;

        debug!(rows = rows.len(), "Fetched inventory rows");

        rows.iter().map(|row| decode_row(row)).collect()
    }

    fn name(&self) -> &'static str {
        "sqlserver"
    }
}

/// Typed, nullable column access over a result row
trait ColumnReader {
    fn int(&self, column: &str) -> Result<Option<i32>, AlertError>;
    fn bigint(&self, column: &str) -> Result<Option<i64>, AlertError>;
    fn text(&self, column: &str) -> Result<Option<String>, AlertError>;
}

impl ColumnReader for Row {
    fn int(&self, column: &str) -> Result<Option<i32>, AlertError> {
        self.try_get::<i32, _>(column)
            .map_err(|e| AlertError::database(&format!("Failed to decode {column}"), e))
    }

    fn bigint(&self, column: &str) -> Result<Option<i64>, AlertError> {
        self.try_get::<i64, _>(column)
            .map_err(|e| AlertError::database(&format!("Failed to decode {column}"), e))
    }

    fn text(&self, column: &str) -> Result<Option<String>, AlertError> {
        self.try_get::<&str, _>(column)
            .map(|value| value.map(str::to_string))
            .map_err(|e| AlertError::database(&format!("Failed to decode {column}"), e))
    }
}

fn decode_row<R: ColumnReader>(row: &R) -> Result<InventoryRow, AlertError> {
    Ok(InventoryRow {
        product_id: required(row.int("product_id")?, "product_id")?,
        product_name: required(row.text("product_name")?, "product_name")?,
        sku: required(row.text("sku")?, "sku")?,
        product_type: row.text("product_type")?,
        low_stock_threshold: row.int("low_stock_threshold")?,
        warehouse_id: required(row.int("warehouse_id")?, "warehouse_id")?,
        warehouse_name: required(row.text("warehouse_name")?, "warehouse_name")?,
        current_stock: required(row.int("current_stock")?, "current_stock")?,
        supplier_id: row.int("supplier_id")?,
        supplier_name: row.text("supplier_name")?,
        contact_email: row.text("contact_email")?,
        // COALESCEd in the query
        total_sold: row.bigint("total_sold")?.unwrap_or(0),
    })
}

fn required<T>(value: Option<T>, column: &str) -> Result<T, AlertError> {
    value.ok_or_else(|| AlertError::Computation(format!("Column {column} is NULL")))
}
