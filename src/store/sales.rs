//! Sales ledger
//!
//! Append-only-by-day time series of (date, SKU, quantity, platform)
//! facts. A day is only ever written as a complete aggregation; re-running
//! a day is an idempotent skip unless overwrite is requested, in which
//! case the whole day is purged and rewritten.

use crate::error::{AppError, Result};
use crate::mapping::canonical_sku;
use crate::models::SalesFact;
use crate::store::blob::BlobStore;
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{error, info};

/// Outcome of a per-day upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayUpsert {
    /// The day was written with this many facts
    Written(usize),

    /// The day already had facts and overwrite was off; nothing changed
    AlreadyPresent,
}

/// Per-day, per-SKU quantity matrix over a trailing window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesPivot {
    /// Calendar days, ascending
    pub dates: Vec<NaiveDate>,

    /// Canonical SKUs with at least one sale in the window, sorted
    pub skus: Vec<String>,

    /// `quantities[day_index][sku_index]`, zero-filled
    pub quantities: Vec<Vec<i64>>,
}

impl SalesPivot {
    /// Quantity sold of `sku` on `date`, if both are inside the window.
    pub fn quantity(&self, date: NaiveDate, sku: &str) -> Option<i64> {
        let day = self.dates.iter().position(|d| *d == date)?;
        let col = self.skus.iter().position(|s| s == sku)?;
        Some(self.quantities[day][col])
    }

    /// Total quantity per day across all SKUs.
    pub fn daily_totals(&self) -> Vec<i64> {
        self.quantities
            .iter()
            .map(|row| row.iter().sum())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.skus.is_empty()
    }
}

/// CSV-backed sales ledger
pub struct SalesLedger {
    store: Arc<dyn BlobStore>,
    filename: String,
}

impl SalesLedger {
    pub fn new(store: Arc<dyn BlobStore>, filename: String) -> Self {
        Self { store, filename }
    }

    /// Write the complete aggregation of one day.
    ///
    /// With `overwrite` off, a day that already has facts is left untouched
    /// and reported as [`DayUpsert::AlreadyPresent`]. With it on, the day's
    /// existing facts are purged first. Other days are never touched.
    pub fn upsert_day(
        &self,
        date: NaiveDate,
        mut facts: Vec<SalesFact>,
        overwrite: bool,
    ) -> Result<DayUpsert> {
        let mut rows = self.load()?;

        if overwrite {
            rows.retain(|fact| fact.date != date);
        } else if rows.iter().any(|fact| fact.date == date) {
            info!("Sales for {} already present, skipping", date);
            return Ok(DayUpsert::AlreadyPresent);
        }

        for fact in &mut facts {
            fact.date = date;
        }
        let written = facts.len();

        rows.extend(facts);
        rows.sort_by_key(|fact| fact.date);
        self.save(&rows)?;

        Ok(DayUpsert::Written(written))
    }

    /// All facts, oldest first. Degrades to empty on a read failure.
    pub fn read_all(&self) -> Vec<SalesFact> {
        self.degrade(self.load())
    }

    /// Facts with a date of `since` or later.
    pub fn read_since(&self, since: NaiveDate) -> Vec<SalesFact> {
        let mut facts = self.read_all();
        facts.retain(|fact| fact.date >= since);
        facts
    }

    /// Per-day, per-SKU quantity matrix over the `days` days ending at
    /// `end` (normally yesterday, since the in-progress day is incomplete and
    /// never part of a window). Days without sales are zero-filled.
    pub fn read_pivot(&self, days: i64, end: NaiveDate) -> SalesPivot {
        let start = end - Duration::days(days - 1);

        let mut facts = self.read_all();
        facts.retain(|fact| fact.date >= start && fact.date <= end);

        let skus: Vec<String> = facts
            .iter()
            .map(|fact| fact.sku.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut totals: BTreeMap<(NaiveDate, &str), i64> = BTreeMap::new();
        for fact in &facts {
            *totals.entry((fact.date, fact.sku.as_str())).or_insert(0) += fact.quantity;
        }

        let mut dates = Vec::new();
        let mut quantities = Vec::new();
        let mut day = start;
        while day <= end {
            let row = skus
                .iter()
                .map(|sku| totals.get(&(day, sku.as_str())).copied().unwrap_or(0))
                .collect();
            dates.push(day);
            quantities.push(row);
            day += Duration::days(1);
        }

        SalesPivot {
            dates,
            skus,
            quantities,
        }
    }

    /// Calendar dates in `[start, end]` with no facts at all, sorted.
    /// Drives resumable ingestion.
    pub fn missing_dates(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        if start > end {
            return Vec::new();
        }

        let present: HashSet<NaiveDate> = match self.load() {
            Ok(rows) => rows.iter().map(|fact| fact.date).collect(),
            Err(e) => {
                error!("Sales ledger read failed: {}", e);
                return Vec::new();
            }
        };

        let mut missing = Vec::new();
        let mut day = start;
        while day <= end {
            if !present.contains(&day) {
                missing.push(day);
            }
            day += Duration::days(1);
        }
        missing
    }

    fn load(&self) -> Result<Vec<SalesFact>> {
        if !self.store.exists(&self.filename) {
            return Ok(Vec::new());
        }

        let bytes = self.store.get(&self.filename)?;
        let mut reader = csv::Reader::from_reader(bytes.as_slice());

        let mut rows = Vec::new();
        for record in reader.deserialize() {
            let mut fact: SalesFact = record?;
            fact.sku = canonical_sku(&fact.sku);
            rows.push(fact);
        }
        Ok(rows)
    }

    fn save(&self, rows: &[SalesFact]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            writer.serialize(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Store(e.to_string()))?;
        self.store.put(&self.filename, &bytes)
    }

    fn degrade(&self, result: Result<Vec<SalesFact>>) -> Vec<SalesFact> {
        match result {
            Ok(rows) => rows,
            Err(e) => {
                error!("Sales ledger read failed: {}", e);
                Vec::new()
            }
        }
    }
}
