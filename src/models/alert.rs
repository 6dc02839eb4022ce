use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Low-stock alert for one product in one warehouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub product_id: i32,
    pub product_name: String,
    pub sku: String,
    pub warehouse_id: i32,
    pub warehouse_name: String,
    pub current_stock: i32,
    pub threshold: i32,
    pub days_until_stockout: Option<i64>,
    pub supplier: Option<SupplierSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierSummary {
    pub id: i32,
    pub name: Option<String>,
    pub contact_email: Option<String>,
}

/// Response body of the low-stock endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowStockAlerts {
    pub alerts: Vec<Alert>,
    pub total_alerts: usize,
}

impl From<Vec<Alert>> for LowStockAlerts {
    fn from(alerts: Vec<Alert>) -> Self {
        let total_alerts = alerts.len();
        Self {
            alerts,
            total_alerts,
        }
    }
}

#[derive(Debug, Error)]
pub enum AlertError {
    /// Rejected before any data access happens
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Computation error: {0}")]
    Computation(String),
}

impl AlertError {
    pub fn database(context: &str, err: impl std::fmt::Display) -> Self {
        AlertError::Computation(format!("{context}: {err}"))
    }
}
