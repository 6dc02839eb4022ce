use std::collections::HashMap;

use tracing::warn;

use crate::constants::{DEFAULT_CATEGORY_THRESHOLDS, GLOBAL_DEFAULT_THRESHOLD};

/// Category default thresholds plus the fallback for unknown categories.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    categories: HashMap<String, i32>,
    global_default: i32,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_CATEGORY_THRESHOLDS
                .iter()
                .map(|(category, threshold)| (category.to_string(), *threshold)),
            GLOBAL_DEFAULT_THRESHOLD,
        )
    }
}

impl ThresholdTable {
    pub fn new(categories: impl IntoIterator<Item = (String, i32)>, global_default: i32) -> Self {
        Self {
            categories: categories.into_iter().collect(),
            global_default,
        }
    }

    /// Parse `category=threshold` pairs separated by commas.
    /// Malformed entries are skipped with a warning.
    pub fn parse(raw: &str, global_default: i32) -> Self {
        let categories = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| {
                let parsed = entry
                    .split_once('=')
                    .and_then(|(category, value)| {
                        let category = category.trim();
                        let value = value.trim().parse::<i32>().ok()?;
                        (!category.is_empty()).then(|| (category.to_string(), value))
                    });
                if parsed.is_none() {
                    warn!("Ignoring malformed category threshold entry: {entry}");
                }
                parsed
            });

        Self::new(categories, global_default)
    }

    pub fn category(&self, product_type: &str) -> Option<i32> {
        self.categories.get(product_type).copied()
    }

    /// Effective threshold: a non-zero override wins, then the category default,
    /// then the global default.
    pub fn resolve(&self, product_type: Option<&str>, override_threshold: Option<i32>) -> i32 {
        override_threshold
            .filter(|threshold| *threshold != 0)
            .or_else(|| product_type.and_then(|category| self.category(category)))
            .unwrap_or(self.global_default)
    }
}
