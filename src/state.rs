//! Application state
//!
//! Wires configuration, the blob store, the ledgers and the commerce API
//! client together. Services and the ingestion driver take `&AppState`;
//! nothing reaches for globals.

use crate::api::{BillbeeApi, OrderApi};
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::mapping::{SkuCatalog, SkuMapper};
use crate::store::{BlobStore, FsBlobStore, InventoryLedger, SalesLedger, SalesPivot, Watermark};
use chrono::{Duration, NaiveDate, Utc};
use std::sync::Arc;

/// Shared state of one pipeline instance
pub struct AppState {
    pub config: AppConfig,
    pub api: Arc<dyn OrderApi>,
    pub sales: SalesLedger,
    pub inventory: InventoryLedger,
    pub watermark: Watermark,
    pub mapper: SkuMapper,
    pub catalog: SkuCatalog,
}

impl AppState {
    /// Wire up the production collaborators from configuration.
    pub fn new(config: AppConfig) -> Result<Self> {
        let store = FsBlobStore::new(&config.store_root).map_err(|e| {
            AppError::Config(format!(
                "Failed to prepare store root {:?}: {}",
                config.store_root, e
            ))
        })?;
        let api: Arc<dyn OrderApi> = Arc::new(BillbeeApi::new(config.credentials.clone()));
        Self::with_collaborators(config, Arc::new(store), api)
    }

    /// Wire explicit store and API collaborators (tests, alternative
    /// backends).
    pub fn with_collaborators(
        config: AppConfig,
        store: Arc<dyn BlobStore>,
        api: Arc<dyn OrderApi>,
    ) -> Result<Self> {
        let sales = SalesLedger::new(store.clone(), config.files.sales.clone());
        let inventory = InventoryLedger::new(
            store.clone(),
            config.files.initial_inventory.clone(),
            config.files.supplier_deliveries.clone(),
        );
        let watermark = Watermark::new(store, config.files.last_import.clone());

        let mapper = SkuMapper::with_default_rules();
        let catalog = SkuCatalog::new(config.sku_names.clone());

        Ok(Self {
            config,
            api,
            sales,
            inventory,
            watermark,
            mapper,
            catalog,
        })
    }

    /// Business-calendar today in the merchant's timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now()
            .with_timezone(&self.config.business_timezone)
            .date_naive()
    }

    /// Most recent complete day. The in-progress day is never ingested or
    /// analyzed.
    pub fn yesterday(&self) -> NaiveDate {
        self.today() - Duration::days(1)
    }

    /// Per-day, per-SKU sales matrix over the trailing `days` days, ending
    /// at yesterday.
    pub fn sales_pivot(&self, days: i64) -> SalesPivot {
        self.sales.read_pivot(days, self.yesterday())
    }
}
