//! Inventory ledger
//!
//! Two small mutable tables: initial-stock snapshots (one row per SKU) and
//! supplier deliveries (one row per delivery event, keyed by SKU and
//! date). Both are read by the summary engine and edited by user actions.

use crate::error::{AppError, Result};
use crate::mapping::canonical_sku;
use crate::models::{DeliveryStatus, InitialInventorySnapshot, SupplierDelivery};
use crate::store::blob::BlobStore;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

/// CSV-backed inventory ledger
pub struct InventoryLedger {
    store: Arc<dyn BlobStore>,
    snapshots_file: String,
    deliveries_file: String,
}

impl InventoryLedger {
    pub fn new(store: Arc<dyn BlobStore>, snapshots_file: String, deliveries_file: String) -> Self {
        Self {
            store,
            snapshots_file,
            deliveries_file,
        }
    }

    // ========== Initial inventory ==========

    /// All stock snapshots. Degrades to empty on a read failure.
    pub fn initial_inventory(&self) -> Vec<InitialInventorySnapshot> {
        match self.load_snapshots() {
            Ok(rows) => rows,
            Err(e) => {
                error!("Initial inventory read failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Replace the whole snapshot table.
    pub fn save_initial_inventory(&self, rows: &[InitialInventorySnapshot]) -> Result<()> {
        for row in rows {
            check_non_negative(row.initial_quantity)?;
        }
        self.save_csv(&self.snapshots_file, rows)
    }

    /// Set the known stock count of one SKU: replace its snapshot if it
    /// has one, append otherwise. Returns the updated table.
    pub fn update_initial_inventory(
        &self,
        sku: &str,
        quantity: i64,
        as_of: NaiveDate,
    ) -> Result<Vec<InitialInventorySnapshot>> {
        check_non_negative(quantity)?;
        let sku = canonical_sku(sku);

        let mut rows = self.load_snapshots()?;
        match rows.iter_mut().find(|row| row.sku == sku) {
            Some(row) => {
                row.initial_quantity = quantity;
                row.as_of = as_of;
            }
            None => rows.push(InitialInventorySnapshot {
                sku,
                initial_quantity: quantity,
                as_of,
            }),
        }

        self.save_initial_inventory(&rows)?;
        Ok(rows)
    }

    // ========== Supplier deliveries ==========

    /// All delivery events. Degrades to empty on a read failure.
    pub fn supplier_deliveries(&self) -> Vec<SupplierDelivery> {
        match self.load_deliveries() {
            Ok(rows) => rows,
            Err(e) => {
                error!("Supplier deliveries read failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Replace the whole delivery table (bulk edits).
    pub fn save_supplier_deliveries(&self, rows: &[SupplierDelivery]) -> Result<()> {
        for row in rows {
            check_non_negative(row.quantity)?;
        }
        self.save_csv(&self.deliveries_file, rows)
    }

    /// Record or edit one delivery event, keyed by (SKU, date). Returns
    /// the updated table.
    pub fn update_supplier_delivery(
        &self,
        sku: &str,
        quantity: i64,
        date: NaiveDate,
        status: DeliveryStatus,
    ) -> Result<Vec<SupplierDelivery>> {
        check_non_negative(quantity)?;
        let sku = canonical_sku(sku);

        let mut rows = self.load_deliveries()?;
        match rows.iter_mut().find(|row| row.sku == sku && row.date == date) {
            Some(row) => {
                row.quantity = quantity;
                row.status = status;
            }
            None => rows.push(SupplierDelivery {
                sku,
                quantity,
                date,
                status,
            }),
        }

        self.save_supplier_deliveries(&rows)?;
        Ok(rows)
    }

    /// Remove one delivery event. Returns whether a row was removed.
    pub fn delete_supplier_delivery(&self, sku: &str, date: NaiveDate) -> Result<bool> {
        let sku = canonical_sku(sku);

        let mut rows = self.load_deliveries()?;
        let before = rows.len();
        rows.retain(|row| !(row.sku == sku && row.date == date));

        if rows.len() == before {
            return Ok(false);
        }
        self.save_supplier_deliveries(&rows)?;
        Ok(true)
    }

    // ========== CSV plumbing ==========

    fn load_snapshots(&self) -> Result<Vec<InitialInventorySnapshot>> {
        let mut rows: Vec<InitialInventorySnapshot> = self.load_csv(&self.snapshots_file)?;
        for row in &mut rows {
            row.sku = canonical_sku(&row.sku);
        }
        Ok(rows)
    }

    fn load_deliveries(&self) -> Result<Vec<SupplierDelivery>> {
        let mut rows: Vec<SupplierDelivery> = self.load_csv(&self.deliveries_file)?;
        for row in &mut rows {
            row.sku = canonical_sku(&row.sku);
        }
        Ok(rows)
    }

    fn load_csv<T: DeserializeOwned>(&self, filename: &str) -> Result<Vec<T>> {
        if !self.store.exists(filename) {
            return Ok(Vec::new());
        }

        let bytes = self.store.get(filename)?;
        let mut reader = csv::Reader::from_reader(bytes.as_slice());

        let mut rows = Vec::new();
        for record in reader.deserialize() {
            rows.push(record?);
        }
        Ok(rows)
    }

    fn save_csv<T: Serialize>(&self, filename: &str, rows: &[T]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            writer.serialize(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Store(e.to_string()))?;
        self.store.put(filename, &bytes)
    }
}

fn check_non_negative(quantity: i64) -> Result<()> {
    if quantity < 0 {
        return Err(AppError::Validation(format!(
            "quantity must be non-negative, got {}",
            quantity
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::blob::FsBlobStore;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn ledger(dir: &tempfile::TempDir) -> InventoryLedger {
        let store = Arc::new(FsBlobStore::new(dir.path()).unwrap());
        InventoryLedger::new(
            store,
            "initial_inventory.csv".to_string(),
            "supplier_deliveries.csv".to_string(),
        )
    }

    #[test]
    fn test_snapshot_upsert_replaces_existing_sku() {
        let dir = tempdir().unwrap();
        let ledger = ledger(&dir);

        ledger
            .update_initial_inventory("80534", 100, date("2024-02-01"))
            .unwrap();
        let rows = ledger
            .update_initial_inventory("80534", 80, date("2024-03-01"))
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].initial_quantity, 80);
        assert_eq!(rows[0].as_of, date("2024-03-01"));

        let reloaded = ledger.initial_inventory();
        assert_eq!(reloaded, rows);
    }

    #[test]
    fn test_snapshot_upsert_appends_new_sku() {
        let dir = tempdir().unwrap();
        let ledger = ledger(&dir);

        ledger
            .update_initial_inventory("80534", 100, date("2024-02-01"))
            .unwrap();
        let rows = ledger
            .update_initial_inventory("80536", 40, date("2024-02-01"))
            .unwrap();

        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_delivery_upsert_is_keyed_by_sku_and_date() {
        let dir = tempdir().unwrap();
        let ledger = ledger(&dir);

        ledger
            .update_supplier_delivery("80534", 50, date("2024-03-10"), DeliveryStatus::Ordered)
            .unwrap();
        ledger
            .update_supplier_delivery("80534", 50, date("2024-04-10"), DeliveryStatus::Ordered)
            .unwrap();
        let rows = ledger
            .update_supplier_delivery("80534", 60, date("2024-03-10"), DeliveryStatus::Confirmed)
            .unwrap();

        assert_eq!(rows.len(), 2);
        let edited = rows.iter().find(|r| r.date == date("2024-03-10")).unwrap();
        assert_eq!(edited.quantity, 60);
        assert_eq!(edited.status, DeliveryStatus::Confirmed);
    }

    #[test]
    fn test_delivery_delete() {
        let dir = tempdir().unwrap();
        let ledger = ledger(&dir);

        ledger
            .update_supplier_delivery("80534", 50, date("2024-03-10"), DeliveryStatus::Ordered)
            .unwrap();

        assert!(ledger
            .delete_supplier_delivery("80534", date("2024-03-10"))
            .unwrap());
        assert!(!ledger
            .delete_supplier_delivery("80534", date("2024-03-10"))
            .unwrap());
        assert!(ledger.supplier_deliveries().is_empty());
    }

    #[test]
    fn test_negative_quantity_is_rejected() {
        let dir = tempdir().unwrap();
        let ledger = ledger(&dir);

        let result = ledger.update_initial_inventory("80534", -1, date("2024-03-01"));
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result =
            ledger.update_supplier_delivery("80534", -5, date("2024-03-01"), DeliveryStatus::Ordered);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_status_round_trips_through_csv() {
        let dir = tempdir().unwrap();
        let ledger = ledger(&dir);

        for (i, status) in [
            DeliveryStatus::Ordered,
            DeliveryStatus::Confirmed,
            DeliveryStatus::Delivered,
        ]
        .into_iter()
        .enumerate()
        {
            ledger
                .update_supplier_delivery(
                    "80534",
                    10,
                    date("2024-03-01") + chrono::Duration::days(i as i64),
                    status,
                )
                .unwrap();
        }

        let rows = ledger.supplier_deliveries();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].status, DeliveryStatus::Ordered);
        assert_eq!(rows[1].status, DeliveryStatus::Confirmed);
        assert_eq!(rows[2].status, DeliveryStatus::Delivered);
    }
}
