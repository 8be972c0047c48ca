//! Commerce API collaborator
//!
//! The pipeline consumes daily order batches from the Billbee REST API.
//! The collaborator never errors into the ingestion driver: transport and
//! auth failures surface as [`FetchOutcome::Unavailable`], so a masked
//! outage stays distinguishable from a confirmed zero-order day in logs
//! and telemetry.

pub mod billbee;
pub mod types;

pub use billbee::BillbeeApi;

use async_trait::async_trait;
use chrono::NaiveDate;
use types::Order;

/// Result of one order fetch
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The API answered; the batch may legitimately be empty
    Fetched(Vec<Order>),

    /// The API could not be reached or rejected the request
    Unavailable,
}

impl FetchOutcome {
    /// Orders to process, treating an outage as an empty batch.
    pub fn into_orders(self) -> Vec<Order> {
        match self {
            FetchOutcome::Fetched(orders) => orders,
            FetchOutcome::Unavailable => Vec::new(),
        }
    }

    /// Whether this outcome masks an outage rather than reporting data.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FetchOutcome::Unavailable)
    }
}

/// Order source implemented by every commerce API client
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// Fetch all orders with an order date in `[start, end)`.
    async fn get_orders(&self, start: NaiveDate, end: NaiveDate) -> FetchOutcome;
}
