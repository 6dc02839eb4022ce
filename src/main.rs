use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use stock_alerts_backend::config::{AlertConfig, DataSource, ServerConfig};
use stock_alerts_backend::constants::{
    POOL_ELEVATED_USAGE_THRESHOLD, POOL_HIGH_USAGE_THRESHOLD, POOL_MONITOR_INTERVAL_SECS,
};
use stock_alerts_backend::database::{
    AlertsDatabase, Database, InMemoryInventory, InventorySource, PoolStatus,
};
use stock_alerts_backend::handlers::alerts;
use stock_alerts_backend::services::AlertService;

#[derive(Clone)]
pub struct AppState {
    pub alerts: AlertService,
    /// Present only when running against SQL Server
    pub database: Option<Database>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("data_source", &self.alerts.source_name())
            .field("database", &self.database)
            .finish()
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub message: String,
    pub timestamp: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct DatabaseStatusResponse {
    pub success: bool,
    pub data_source: String,
    pub database: Option<String>,
    pub pool: Option<PoolStatus>,
    pub timestamp: String,
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "healthy".to_string(),
        message: "Stock alerts backend is running".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: VERSION.to_string(),
    })
}

/// Database status endpoint - shows the active data source and pool usage
async fn database_status(State(state): State<AppState>) -> Json<DatabaseStatusResponse> {
    Json(DatabaseStatusResponse {
        success: true,
        data_source: state.alerts.source_name().to_string(),
        database: state
            .database
            .as_ref()
            .map(|db| db.get_database_name().to_string()),
        pool: state.database.as_ref().map(Database::get_pool_status),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

fn init_tracing() {
    let default_filter = if cfg!(debug_assertions) {
        "stock_alerts_backend=info,tower_http=warn"
    } else {
        "stock_alerts_backend=warn,tower_http=error"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn cors_layer(cors_origins: &str) -> Result<CorsLayer> {
    let base = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    if cors_origins == "*" {
        // Block wildcard CORS in production
        if std::env::var("RUST_ENV").unwrap_or_default() == "production" {
            anyhow::bail!("CORS wildcard (*) is not allowed in production. Set CORS_ORIGINS to specific origins.");
        }
        warn!("⚠️ CORS is configured with wildcard (*) - this is only acceptable for development!");
        return Ok(base.allow_origin(Any));
    }

    info!("🔒 CORS configured for specific origins: {}", cors_origins);
    let origins: Vec<HeaderValue> = cors_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    if origins.is_empty() {
        warn!("⚠️ No valid CORS origins found in CORS_ORIGINS, falling back to localhost only");
        Ok(base.allow_origin(HeaderValue::from_static("http://localhost:4200")))
    } else {
        Ok(base.allow_origin(origins))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    info!("🚀 Starting Stock Alerts Backend v{}", VERSION);

    let server_config = ServerConfig::from_env();
    let alert_config = AlertConfig::from_env();

    info!("Server configured to run on {}:{}", server_config.host, server_config.port);
    info!(
        window_days = alert_config.window_days,
        default_page_size = alert_config.default_page_size,
        activity = ?alert_config.activity,
        "Low-stock alert settings loaded"
    );

    let (source, database): (Arc<dyn InventorySource>, Option<Database>) =
        match &server_config.data_source {
            DataSource::SqlServer => {
                let database = Database::new()
                    .await
                    .context("Failed to initialize database with connection pool")?;

                info!("🔍 Validating inventory tables in database...");
                match database.validate_schema().await {
                    Ok(missing) if missing.is_empty() => info!("✅ All inventory tables found"),
                    Ok(missing) => warn!("⚠️  Low-stock alerts will fail until these tables exist: {:?}", missing),
                    Err(e) => warn!("⚠️  Failed to validate inventory tables: {}", e),
                }

                let source: Arc<dyn InventorySource> = Arc::new(AlertsDatabase::new(database.clone()));
                (source, Some(database))
            }
            DataSource::Memory { fixture_path } => {
                warn!("⚠️  Using in-memory inventory data source (development only)");
                let inventory = match fixture_path {
                    Some(path) => InMemoryInventory::from_fixture(path)?,
                    None => InMemoryInventory::default(),
                };
                let source: Arc<dyn InventorySource> = Arc::new(inventory);
                (source, None)
            }
        };

    let state = AppState {
        alerts: AlertService::new(source, alert_config),
        database,
    };

    let cors = cors_layer(&server_config.cors_origins)?;

    // Security headers
    let security_headers = SetResponseHeaderLayer::overriding(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    let x_frame_options = SetResponseHeaderLayer::overriding(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static("DENY"),
    );

    let app = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/database/status", get(database_status))
        .nest(
            "/api/companies",
            alerts::create_alert_routes().with_state(state.alerts.clone()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(security_headers)
        .layer(x_frame_options)
        .with_state(state.clone());

    let address = format!("{}:{}", server_config.host, server_config.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {address}"))?;

    info!("🎯 Stock Alerts Server started successfully on http://{}", address);
    info!("🔧 API endpoints available at http://{}/api/", address);

    if let Some(database) = state.database.clone() {
        tokio::spawn(async move {
            monitor_pool_health(database).await;
        });
    }

    axum::serve(listener, app)
        .await
        .context("Server failed to start")?;

    Ok(())
}

/// Monitor connection pool health and log warnings
async fn monitor_pool_health(database: Database) {
    loop {
        time::sleep(Duration::from_secs(POOL_MONITOR_INTERVAL_SECS)).await;
        let pool_status = database.get_pool_status();
        let usage_percent = pool_status.utilization_percent();

        if usage_percent >= POOL_HIGH_USAGE_THRESHOLD {
            error!(
                connections = pool_status.total_connections,
                idle = pool_status.idle_connections,
                max = pool_status.max_size,
                utilization = %format!("{:.1}%", usage_percent),
                "⚠️ Connection pool utilization HIGH - consider increasing DATABASE_MAX_CONNECTIONS"
            );
        } else if usage_percent >= POOL_ELEVATED_USAGE_THRESHOLD {
            info!(
                connections = pool_status.total_connections,
                idle = pool_status.idle_connections,
                max = pool_status.max_size,
                utilization = %format!("{:.1}%", usage_percent),
                "⚡ Connection pool utilization elevated"
            );
        }
    }
}
