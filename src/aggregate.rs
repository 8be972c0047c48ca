//! Order aggregation
//!
//! Reduces one day's raw order batch into per-SKU summed sales facts. The
//! calendar day is supplied by the caller rather than read from order
//! timestamps, so re-running a day is a pure function of its input batch.

use crate::api::types::Order;
use crate::mapping::SkuMapper;
use crate::models::SalesFact;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Aggregate a raw order batch into sales facts for `date`.
///
/// Lines without a SKU are dropped; quantities are summed per
/// (canonical SKU, platform) after mapping resolution.
pub fn aggregate_orders(date: NaiveDate, orders: &[Order], mapper: &SkuMapper) -> Vec<SalesFact> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();

    for order in orders {
        let platform = order.platform();

        for item in &order.order_items {
            let sku = match item.product.as_ref().and_then(|p| p.sku.as_deref()) {
                Some(sku) if !sku.trim().is_empty() => sku,
                _ => continue,
            };

            for (mapped_sku, quantity) in mapper.resolve(sku, item.quantity) {
                *totals
                    .entry((mapped_sku, platform.to_string()))
                    .or_insert(0) += quantity;
            }
        }
    }

    totals
        .into_iter()
        .map(|((sku, platform), quantity)| SalesFact {
            date,
            sku,
            quantity,
            platform,
        })
        .collect()
}
