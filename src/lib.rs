//! Stockpilot - inventory and sales-velocity pipeline
//!
//! Ingests daily order batches from the Billbee commerce API, reconciles
//! them with stock snapshots and supplier deliveries held in flat CSV
//! ledgers, and derives per-SKU velocity, runway, trend and forecast
//! figures. Presentation (UI, charts, CLI) sits on top of this crate and
//! is not part of it.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod mapping;
pub mod models;
pub mod services;
pub mod state;
pub mod store;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use state::AppState;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing for binary callers. Library users bring their own
/// subscriber instead.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockpilot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
