pub mod alert_service;
pub mod inventory_joiner;
pub mod sales_aggregator;
pub mod stockout;
pub mod threshold;

pub use alert_service::{assemble_alerts, AlertService};
pub use inventory_joiner::join_inventory;
pub use sales_aggregator::{aggregate_sales, SalesAggregate};
pub use stockout::days_until_stockout;
pub use threshold::ThresholdTable;
