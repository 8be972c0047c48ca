//! Summary Service
//!
//! The reconciliation engine: joins the sales ledger with stock snapshots
//! and supplier deliveries into one row per SKU carrying trailing
//! velocity, current stock and projected runway. Recomputed from the
//! ledgers on every call; there is no cache.

use crate::models::{InitialInventorySnapshot, SalesFact};
use crate::services::trend_service::TrendService;
use crate::state::AppState;
use chrono::Duration;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One summary row per SKU
#[derive(Debug, Clone, Serialize)]
pub struct SkuSummary {
    pub sku: String,

    /// Catalog display name, when configured
    pub name: Option<String>,

    /// Quantity sold inside the trailing window
    pub last_30_days_quantity: i64,

    /// Trailing-window velocity, units per day
    pub avg_daily_quantity: f64,

    /// Reconciled stock on hand. May go negative: sales without a matching
    /// snapshot or delivery are a data-quality signal, not an error.
    pub current_quantity: i64,

    /// Ordered or confirmed deliveries that have not arrived yet
    pub planned_deliveries: i64,

    /// Days of stock left at current velocity; +inf when velocity is zero
    pub inventory_days: f64,

    pub adjusted_inventory_days: f64,

    /// Runway including the planned deliveries
    pub adjusted_inventory_days_with_deliveries: f64,

    /// Blended sales slope, units per day
    pub trend: f64,

    /// Sorted, de-duplicated platform labels, comma-joined
    pub platforms: String,
}

/// Footer metrics over the whole summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryTotals {
    pub quantity_sold: i64,
    pub current_stock: i64,
    pub planned_deliveries: i64,
}

/// Per-SKU inventory reconciliation
pub struct SummaryService;

impl SummaryService {
    /// Build the summary with the configured trailing window.
    pub fn summarize(state: &AppState) -> Vec<SkuSummary> {
        Self::summarize_window(state, state.config.trailing_window_days)
    }

    /// Build one row per SKU seen in any ledger since the history start,
    /// sorted ascending by runway, SKUs closest to stockout first and
    /// zero-velocity rows last.
    pub fn summarize_window(state: &AppState, window_days: i64) -> Vec<SkuSummary> {
        let facts = state.sales.read_since(state.config.history_start);
        let snapshots = state.inventory.initial_inventory();
        let deliveries = state.inventory.supplier_deliveries();

        let end = state.yesterday();
        let window_start = end - Duration::days(window_days - 1);

        let mut sales_by_sku: BTreeMap<String, Vec<&SalesFact>> = BTreeMap::new();
        for fact in &facts {
            sales_by_sku.entry(fact.sku.clone()).or_default().push(fact);
        }

        let snapshot_by_sku: BTreeMap<&str, &InitialInventorySnapshot> = snapshots
            .iter()
            .map(|snapshot| (snapshot.sku.as_str(), snapshot))
            .collect();

        let mut delivered: BTreeMap<&str, i64> = BTreeMap::new();
        let mut planned: BTreeMap<&str, i64> = BTreeMap::new();
        for delivery in &deliveries {
            let bucket = if delivery.status.has_arrived() {
                &mut delivered
            } else {
                &mut planned
            };
            *bucket.entry(delivery.sku.as_str()).or_insert(0) += delivery.quantity;
        }

        // Every SKU seen anywhere: a SKU with stock but no sales still
        // gets a row.
        let mut skus: BTreeSet<String> = sales_by_sku.keys().cloned().collect();
        skus.extend(snapshots.iter().map(|snapshot| snapshot.sku.clone()));
        skus.extend(deliveries.iter().map(|delivery| delivery.sku.clone()));

        let mut rows = Vec::with_capacity(skus.len());
        for sku in skus {
            let sku_facts: &[&SalesFact] = sales_by_sku
                .get(&sku)
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            let window_quantity: i64 = sku_facts
                .iter()
                .filter(|fact| fact.date >= window_start && fact.date <= end)
                .map(|fact| fact.quantity)
                .sum();
            let avg_daily_quantity = window_quantity as f64 / window_days as f64;

            let total_quantity: i64 = sku_facts.iter().map(|fact| fact.quantity).sum();

            let (initial_quantity, sales_before_snapshot) =
                match snapshot_by_sku.get(sku.as_str()) {
                    Some(snapshot) => {
                        let before: i64 = sku_facts
                            .iter()
                            .filter(|fact| fact.date < snapshot.as_of)
                            .map(|fact| fact.quantity)
                            .sum();
                        (snapshot.initial_quantity, before)
                    }
                    // No snapshot: zero stock assumed before any recorded
                    // sale, so all sales count against the delta.
                    None => (0, 0),
                };

            let delivered_quantity = delivered.get(sku.as_str()).copied().unwrap_or(0);
            let planned_quantity = planned.get(sku.as_str()).copied().unwrap_or(0);

            // Stock as of the snapshot date, plus everything delivered,
            // minus everything sold since the snapshot.
            let current_quantity = initial_quantity + delivered_quantity
                - (total_quantity - sales_before_snapshot);

            let inventory_days = runway(current_quantity, avg_daily_quantity);
            let adjusted_inventory_days_with_deliveries =
                runway(current_quantity + planned_quantity, avg_daily_quantity);

            let owned: Vec<SalesFact> = sku_facts.iter().map(|fact| (*fact).clone()).collect();
            let trend = TrendService::blended_trend(&TrendService::daily_series(&owned));

            let platforms = sku_facts
                .iter()
                .map(|fact| fact.platform.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect::<Vec<_>>()
                .join(", ");

            rows.push(SkuSummary {
                name: state.catalog.name(&sku).map(String::from),
                sku,
                last_30_days_quantity: window_quantity,
                avg_daily_quantity,
                current_quantity,
                planned_deliveries: planned_quantity,
                inventory_days,
                adjusted_inventory_days: inventory_days,
                adjusted_inventory_days_with_deliveries,
                trend,
                platforms,
            });
        }

        rows.sort_by(|a, b| {
            a.inventory_days
                .total_cmp(&b.inventory_days)
                .then_with(|| a.sku.cmp(&b.sku))
        });
        rows
    }

    /// Footer metrics over the summary rows.
    pub fn totals(rows: &[SkuSummary]) -> SummaryTotals {
        SummaryTotals {
            quantity_sold: rows.iter().map(|row| row.last_30_days_quantity).sum(),
            current_stock: rows.iter().map(|row| row.current_quantity).sum(),
            planned_deliveries: rows.iter().map(|row| row.planned_deliveries).sum(),
        }
    }
}

fn runway(stock: i64, velocity: f64) -> f64 {
    if velocity > 0.0 {
        stock as f64 / velocity
    } else {
        f64::INFINITY
    }
}
