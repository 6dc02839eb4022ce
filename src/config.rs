use std::env;
use std::str::FromStr;

use tracing::warn;

use crate::constants;
use crate::models::{ActivityFilter, Page};
use crate::services::ThresholdTable;

/// Where inventory rows are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    SqlServer,
    /// In-memory dataset, optionally seeded from a JSON fixture
    Memory { fixture_path: Option<String> },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
    pub data_source: DataSource,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_source = match lookup("DATA_SOURCE").as_deref().map(str::trim) {
            Some("memory") => DataSource::Memory {
                fixture_path: lookup("FIXTURE_PATH"),
            },
            Some("sqlserver") | None => DataSource::SqlServer,
            Some(other) => {
                warn!("Unknown DATA_SOURCE '{other}', using sqlserver");
                DataSource::SqlServer
            }
        };

        Self {
            host: lookup("SERVER_HOST")
                .unwrap_or_else(|| constants::DEFAULT_SERVER_HOST.to_string()),
            port: parse_or(&lookup, "SERVER_PORT", constants::DEFAULT_SERVER_PORT),
            cors_origins: lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string()),
            data_source,
        }
    }
}

/// Tunables of the low-stock computation
#[derive(Debug, Clone)]
pub struct AlertConfig {
    pub window_days: u32,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub activity: ActivityFilter,
    pub thresholds: ThresholdTable,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            window_days: constants::DEFAULT_SALES_WINDOW_DAYS,
            default_page_size: constants::DEFAULT_PAGE_SIZE,
            max_page_size: constants::MAX_PAGE_SIZE,
            activity: ActivityFilter::RecentSalesOnly,
            thresholds: ThresholdTable::default(),
        }
    }
}

impl AlertConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let window_days = parse_or(&lookup, "ALERT_WINDOW_DAYS", defaults.window_days);
        let window_days = if window_days == 0 {
            warn!("ALERT_WINDOW_DAYS must be positive, using {}", defaults.window_days);
            defaults.window_days
        } else {
            window_days
        };

        let max_page_size = parse_or(&lookup, "ALERT_MAX_PAGE_SIZE", defaults.max_page_size).max(1);
        let default_page_size = parse_or(&lookup, "ALERT_DEFAULT_PAGE_SIZE", defaults.default_page_size)
            .clamp(1, max_page_size);

        let activity = if parse_or(&lookup, "ALERT_INCLUDE_STAGNANT", false) {
            ActivityFilter::IncludeStagnant
        } else {
            ActivityFilter::RecentSalesOnly
        };

        let global_default = parse_or(
            &lookup,
            "ALERT_DEFAULT_THRESHOLD",
            constants::GLOBAL_DEFAULT_THRESHOLD,
        );
        let thresholds = match lookup("ALERT_CATEGORY_THRESHOLDS") {
            Some(raw) => ThresholdTable::parse(&raw, global_default),
            None => ThresholdTable::new(
                constants::DEFAULT_CATEGORY_THRESHOLDS
                    .iter()
                    .map(|(category, threshold)| (category.to_string(), *threshold)),
                global_default,
            ),
        };

        Self {
            window_days,
            default_page_size,
            max_page_size,
            activity,
            thresholds,
        }
    }

    pub fn page(&self, limit: Option<&str>, offset: Option<&str>) -> Page {
        Page::from_params(limit, offset, self.default_page_size, self.max_page_size)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid value '{raw}' for {key}, using default {default}");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_alert_config_defaults() {
        let config = AlertConfig::from_lookup(lookup(&[]));

        assert_eq!(config.window_days, 30);
        assert_eq!(config.default_page_size, 100);
        assert_eq!(config.activity, ActivityFilter::RecentSalesOnly);
        assert_eq!(config.thresholds.resolve(Some("consumable"), None), 50);
        assert_eq!(config.thresholds.resolve(Some("other"), None), 20);
    }

    #[test]
    fn test_alert_config_overrides() {
        let config = AlertConfig::from_lookup(lookup(&[
            ("ALERT_WINDOW_DAYS", "14"),
            ("ALERT_DEFAULT_PAGE_SIZE", "25"),
            ("ALERT_INCLUDE_STAGNANT", "true"),
            ("ALERT_DEFAULT_THRESHOLD", "40"),
            ("ALERT_CATEGORY_THRESHOLDS", "tools=9"),
        ]));

        assert_eq!(config.window_days, 14);
        assert_eq!(config.page(None, None).limit, 25);
        assert_eq!(config.activity, ActivityFilter::IncludeStagnant);
        assert_eq!(config.thresholds.resolve(Some("tools"), None), 9);
        assert_eq!(config.thresholds.resolve(Some("electronics"), None), 40);
    }

    #[test]
    fn test_alert_config_rejects_bad_values() {
        let config = AlertConfig::from_lookup(lookup(&[
            ("ALERT_WINDOW_DAYS", "0"),
            ("ALERT_DEFAULT_PAGE_SIZE", "lots"),
        ]));

        assert_eq!(config.window_days, 30);
        assert_eq!(config.default_page_size, 100);
    }

    #[test]
    fn test_server_config_data_source() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("DATA_SOURCE", "memory"),
            ("FIXTURE_PATH", "fixtures/demo.json"),
            ("SERVER_PORT", "9000"),
        ]));

        assert_eq!(config.port, 9000);
        assert_eq!(
            config.data_source,
            DataSource::Memory {
                fixture_path: Some("fixtures/demo.json".to_string())
            }
        );
        assert_eq!(
            ServerConfig::from_lookup(lookup(&[])).data_source,
            DataSource::SqlServer
        );
    }
}
