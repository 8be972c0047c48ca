//! Persisted ledger records
//!
//! Row types serialized to the CSV ledgers. Column names are pinned with
//! serde renames so the files keep their exact header rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day's aggregated sales of a SKU on one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesFact {
    #[serde(rename = "Date")]
    pub date: NaiveDate,

    #[serde(rename = "SKU")]
    pub sku: String,

    #[serde(rename = "Quantity")]
    pub quantity: i64,

    #[serde(rename = "Platform", default = "default_platform")]
    pub platform: String,
}

fn default_platform() -> String {
    "Unknown".to_string()
}

/// Known stock count of a SKU as of a specific date.
///
/// At most one snapshot per SKU; updating replaces the existing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialInventorySnapshot {
    #[serde(rename = "SKU")]
    pub sku: String,

    #[serde(rename = "InitialQuantity")]
    pub initial_quantity: i64,

    #[serde(rename = "Date")]
    pub as_of: NaiveDate,
}

/// Lifecycle of a supplier delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Ordered,
    Confirmed,
    Delivered,
}

impl DeliveryStatus {
    /// Whether the stock has physically arrived
    pub fn has_arrived(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered)
    }

    /// Whether the delivery is still in flight (Ordered or Confirmed)
    pub fn is_planned(&self) -> bool {
        !self.has_arrived()
    }
}

/// One supplier delivery event for a SKU.
///
/// Several rows per SKU are allowed; rows are keyed by (SKU, Date) for
/// in-place edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierDelivery {
    #[serde(rename = "SKU")]
    pub sku: String,

    #[serde(rename = "SupplierDelivery")]
    pub quantity: i64,

    #[serde(rename = "Date")]
    pub date: NaiveDate,

    #[serde(rename = "Status")]
    pub status: DeliveryStatus,
}
