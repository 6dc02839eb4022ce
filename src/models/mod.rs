pub mod alert;
pub mod inventory;

pub use alert::{Alert, AlertError, LowStockAlerts, SupplierSummary};
pub use inventory::{
    ActivityFilter, CompanyId, InventoryRow, InventorySnapshot, Page, Product, SaleEvent,
    SalesWindow, StockRecord, Supplier, Warehouse,
};
