//! Pipeline configuration
//!
//! Every component receives its configuration explicitly through
//! [`AppConfig`]; there is no ambient settings lookup. Callers build the
//! config from whatever secret/settings mechanism they use and hand it to
//! [`crate::state::AppState::new`].

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Credentials for the Billbee commerce API
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCredentials {
    pub api_key: String,
    pub username: String,
    pub password: String,
}

/// Fixed filenames of the persisted ledgers inside the store root
#[derive(Debug, Clone)]
pub struct LedgerFiles {
    pub sales: String,
    pub initial_inventory: String,
    pub supplier_deliveries: String,
    pub last_import: String,
}

impl Default for LedgerFiles {
    fn default() -> Self {
        Self {
            sales: "sales.csv".to_string(),
            initial_inventory: "initial_inventory.csv".to_string(),
            supplier_deliveries: "supplier_deliveries.csv".to_string(),
            last_import: "last_import_date.txt".to_string(),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root directory of the blob store (the "bucket")
    pub store_root: PathBuf,

    /// Ledger filenames inside the store root
    pub files: LedgerFiles,

    /// Commerce API credentials
    pub credentials: ApiCredentials,

    /// First date considered by summary and trend analysis
    pub history_start: NaiveDate,

    /// Trailing window for velocity metrics, in days
    pub trailing_window_days: i64,

    /// Timezone that defines the business day boundary
    pub business_timezone: Tz,

    /// Display names per canonical SKU
    pub sku_names: HashMap<String, String>,
}

impl AppConfig {
    /// Create a config with production defaults for everything but the
    /// store location and credentials.
    pub fn new(store_root: impl Into<PathBuf>, credentials: ApiCredentials) -> Self {
        Self {
            store_root: store_root.into(),
            files: LedgerFiles::default(),
            credentials,
            history_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            trailing_window_days: 30,
            business_timezone: chrono_tz::Europe::Berlin,
            sku_names: HashMap::new(),
        }
    }
}
