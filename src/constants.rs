// Application Constants
// Centralized constants to avoid magic numbers

/// Default server configuration
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 4410;

/// Database connection defaults
pub const DEFAULT_DATABASE_PORT: u16 = 1433;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 5;
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 10;

/// Trailing window used to scope "recent" sales
pub const DEFAULT_SALES_WINDOW_DAYS: u32 = 30;

/// Pagination defaults for the joined inventory row set
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Low-stock thresholds by product category
pub const DEFAULT_CATEGORY_THRESHOLDS: [(&str, i32); 3] =
    [("electronics", 15), ("apparel", 25), ("consumable", 50)];
pub const GLOBAL_DEFAULT_THRESHOLD: i32 = 20;

/// Pool monitoring interval
pub const POOL_MONITOR_INTERVAL_SECS: u64 = 60;
pub const POOL_HIGH_USAGE_THRESHOLD: f64 = 80.0;
pub const POOL_ELEVATED_USAGE_THRESHOLD: f64 = 70.0;

/// API response messages
pub const MSG_INVALID_COMPANY_ID: &str = "Invalid company ID";
pub const MSG_INTERNAL_ERROR: &str = "Internal server error";
