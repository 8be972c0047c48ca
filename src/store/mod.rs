//! Ledger storage module
//!
//! All persisted state lives as whole files in a flat blob store: three
//! CSV ledgers and a one-line watermark file. Writers follow a
//! read-modify-write discipline: load the full blob, compute the
//! replacement, overwrite wholesale. A process-local mutex serializes
//! writers inside one process; concurrent writers from several processes
//! are not supported (no version/ETag check).
//!
//! Read failures degrade to empty results with a logged diagnostic; write
//! failures propagate to the caller.

pub mod blob;
pub mod inventory;
pub mod sales;
pub mod watermark;

pub use blob::{BlobStore, FsBlobStore};
pub use inventory::InventoryLedger;
pub use sales::{DayUpsert, SalesLedger, SalesPivot};
pub use watermark::Watermark;
